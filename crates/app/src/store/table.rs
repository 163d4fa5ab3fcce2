//! In-process record table shared by the memory and file collections.

use serde_json::Value;

use crate::uuids::TypedUuid;

use super::{Document, Filter, Sort, SortDirection, StoreError, compare_values, values_equal};

/// Records in insertion order.
#[derive(Debug, Clone)]
pub(super) struct Table<R> {
    records: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Document> Table<R> {
    pub(super) fn from_records(records: Vec<R>) -> Self {
        Self { records }
    }

    pub(super) fn records(&self) -> &[R] {
        &self.records
    }

    pub(super) fn find(
        &self,
        filter: &Filter,
        sort: Option<Sort>,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<R>, StoreError> {
        let mut matching = Vec::new();

        for record in &self.records {
            let document = serde_json::to_value(record)?;

            if filter.matches(&document) {
                matching.push((document, record));
            }
        }

        if let Some(sort) = sort {
            // `sort_by` is stable, so ties keep insertion order.
            matching.sort_by(|(a, _), (b, _)| {
                let ordering = compare_values(a.get(sort.field), b.get(sort.field));

                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = limit.map_or(usize::MAX, |limit| {
            usize::try_from(limit).unwrap_or(usize::MAX)
        });

        Ok(matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    pub(super) fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut count = 0_u64;

        for record in &self.records {
            if filter.matches(&serde_json::to_value(record)?) {
                count += 1;
            }
        }

        Ok(count)
    }

    pub(super) fn get(&self, id: TypedUuid<R>) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub(super) fn insert(&mut self, record: R) -> Result<R, StoreError> {
        if self.get(record.id()).is_some() {
            return Err(StoreError::Conflict {
                field: "uuid".to_string(),
            });
        }

        self.check_unique(&record)?;
        self.records.push(record.clone());

        Ok(record)
    }

    pub(super) fn replace(&mut self, id: TypedUuid<R>, record: R) -> Result<Option<R>, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        self.check_unique(&record)?;

        if let Some(slot) = self.records.get_mut(index) {
            *slot = record.clone();
        }

        Ok(Some(record))
    }

    pub(super) fn remove(&mut self, id: TypedUuid<R>) -> Option<R> {
        self.position(id).map(|index| self.records.remove(index))
    }

    fn position(&self, id: TypedUuid<R>) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    /// Reject `candidate` when another record already holds one of its unique values.
    fn check_unique(&self, candidate: &R) -> Result<(), StoreError> {
        if R::UNIQUE_FIELDS.is_empty() {
            return Ok(());
        }

        let document = serde_json::to_value(candidate)?;

        for field in R::UNIQUE_FIELDS {
            let Some(value) = document.get(field).filter(|value| !value.is_null()) else {
                continue;
            };

            for other in &self.records {
                if other.id() == candidate.id() {
                    continue;
                }

                let other = serde_json::to_value(other)?;

                if other.get(field).is_some_and(|taken| values_equal(taken, value)) {
                    return Err(StoreError::Conflict {
                        field: (*field).to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(super) mod fixtures {
    use serde::{Deserialize, Serialize};

    use crate::{store::Document, uuids::TypedUuid};

    /// Minimal document used to exercise the collections directly.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Widget {
        pub uuid: TypedUuid<Widget>,
        pub sku: String,
        pub weight: u32,
    }

    impl Widget {
        pub(crate) fn new(sku: &str, weight: u32) -> Self {
            Self {
                uuid: TypedUuid::new(),
                sku: sku.to_string(),
                weight,
            }
        }
    }

    impl Document for Widget {
        const COLLECTION: &'static str = "widgets";
        const UNIQUE_FIELDS: &'static [&'static str] = &["sku"];

        fn id(&self) -> TypedUuid<Self> {
            self.uuid
        }
    }

    // Used to check that documents without unique fields never conflict.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Note {
        pub uuid: TypedUuid<Note>,
        pub body: String,
    }

    impl Document for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> TypedUuid<Self> {
            self.uuid
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::{fixtures::Widget, *};
    use crate::store::Sort;

    fn table() -> Result<Table<Widget>, StoreError> {
        let mut table = Table::default();

        table.insert(Widget::new("a", 30))?;
        table.insert(Widget::new("b", 10))?;
        table.insert(Widget::new("c", 20))?;
        table.insert(Widget::new("d", 10))?;

        Ok(table)
    }

    fn skus(widgets: &[Widget]) -> Vec<&str> {
        widgets.iter().map(|widget| widget.sku.as_str()).collect()
    }

    #[test]
    fn unsorted_find_keeps_insertion_order() -> TestResult {
        let table = table()?;

        let found = table.find(&Filter::all(), None, 0, None)?;

        assert_eq!(skus(&found), ["a", "b", "c", "d"]);

        Ok(())
    }

    #[test]
    fn sorted_find_is_stable_for_ties() -> TestResult {
        let table = table()?;

        let ascending = table.find(&Filter::all(), Some(Sort::ascending("weight")), 0, None)?;
        let descending = table.find(&Filter::all(), Some(Sort::descending("weight")), 0, None)?;

        assert_eq!(skus(&ascending), ["b", "d", "c", "a"]);
        assert_eq!(skus(&descending), ["a", "c", "b", "d"]);

        Ok(())
    }

    #[test]
    fn skip_and_limit_slice_the_result() -> TestResult {
        let table = table()?;

        let found = table.find(&Filter::all(), None, 1, Some(2))?;

        assert_eq!(skus(&found), ["b", "c"]);
        assert!(table.find(&Filter::all(), None, 10, Some(2))?.is_empty());

        Ok(())
    }

    #[test]
    fn count_applies_the_filter() -> TestResult {
        let table = table()?;

        assert_eq!(table.count(&Filter::all().equals("weight", 10))?, 2);
        assert_eq!(table.count(&Filter::all().equals("weight", 99))?, 0);

        Ok(())
    }

    #[test]
    fn duplicate_unique_field_is_a_conflict() -> TestResult {
        let mut table = table()?;

        let result = table.insert(Widget::new("a", 1));

        assert!(
            matches!(result, Err(StoreError::Conflict { ref field }) if field == "sku"),
            "expected sku conflict, got {result:?}"
        );
        assert_eq!(table.records().len(), 4);

        Ok(())
    }

    #[test]
    fn replacing_a_record_may_keep_its_own_unique_value() -> TestResult {
        let mut table = table()?;
        let mut widget = table.find(&Filter::all(), None, 0, Some(1))?.remove(0);

        widget.weight = 99;

        let replaced = table.replace(widget.uuid, widget.clone())?;

        assert_eq!(replaced, Some(widget.clone()));
        assert_eq!(table.get(widget.uuid).map(|w| w.weight), Some(99));

        Ok(())
    }

    #[test]
    fn replacing_into_a_taken_unique_value_is_a_conflict() -> TestResult {
        let mut table = table()?;
        let mut widget = table.find(&Filter::all(), None, 0, Some(1))?.remove(0);

        widget.sku = "b".to_string();

        let result = table.replace(widget.uuid, widget);

        assert!(
            matches!(result, Err(StoreError::Conflict { .. })),
            "expected conflict, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn remove_returns_the_removed_record() -> TestResult {
        let mut table = table()?;
        let widget = table.find(&Filter::all(), None, 0, Some(1))?.remove(0);

        assert_eq!(table.remove(widget.uuid), Some(widget.clone()));
        assert_eq!(table.remove(widget.uuid), None);
        assert_eq!(table.records().len(), 3);

        Ok(())
    }
}
