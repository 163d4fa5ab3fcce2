//! JSON file collection.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::{debug, info};

use crate::uuids::TypedUuid;

use super::{Collection, Document, Filter, Sort, StoreError, table::Table};

/// Collection kept in memory and written back to `<dir>/<collection>.json`
/// after every mutation.
#[derive(Debug)]
pub struct FileCollection<R> {
    path: PathBuf,
    table: RwLock<Table<R>>,
}

impl<R: Document> FileCollection<R> {
    /// Load the collection file from `dir`, creating an empty one when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or written, or does not
    /// hold a JSON array of records.
    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(format!("{}.json", R::COLLECTION));

        let table = match fs::read(&path).await {
            Ok(bytes) => Table::from_records(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "creating empty collection file");

                let table = Table::default();
                write_table(&path, &table).await?;
                table
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<R: Document> Collection<R> for FileCollection<R> {
    async fn find(
        &self,
        filter: &Filter,
        sort: Option<Sort>,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<R>, StoreError> {
        self.table.read().await.find(filter, sort, skip, limit)
    }

    async fn count_matching(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.table.read().await.count(filter)
    }

    async fn find_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError> {
        Ok(self.table.read().await.get(id).cloned())
    }

    async fn insert(&self, record: R) -> Result<R, StoreError> {
        let mut table = self.table.write().await;
        let mut staged = table.clone();

        let inserted = staged.insert(record)?;
        write_table(&self.path, &staged).await?;
        *table = staged;

        Ok(inserted)
    }

    async fn update_by_id(&self, id: TypedUuid<R>, record: R) -> Result<Option<R>, StoreError> {
        let mut table = self.table.write().await;
        let mut staged = table.clone();

        let Some(updated) = staged.replace(id, record)? else {
            return Ok(None);
        };

        write_table(&self.path, &staged).await?;
        *table = staged;

        Ok(Some(updated))
    }

    async fn delete_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError> {
        let mut table = self.table.write().await;
        let mut staged = table.clone();

        let Some(removed) = staged.remove(id) else {
            return Ok(None);
        };

        write_table(&self.path, &staged).await?;
        *table = staged;

        Ok(Some(removed))
    }
}

/// Write through a sibling temp file so a crash never leaves a truncated file.
async fn write_table<R: Document>(path: &Path, table: &Table<R>) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(table.records())?;
    let staging = path.with_extension("json.tmp");

    fs::write(&staging, &bytes).await?;
    fs::rename(&staging, path).await?;

    debug!(path = %path.display(), records = table.records().len(), "collection written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::store::table::fixtures::Widget;

    use super::*;

    #[tokio::test]
    async fn open_creates_an_empty_file() -> TestResult {
        let dir = tempfile::tempdir()?;

        let widgets = FileCollection::<Widget>::open(dir.path()).await?;

        assert_eq!(widgets.path(), dir.path().join("widgets.json"));
        assert_eq!(fs::read_to_string(widgets.path()).await?, "[]");
        assert_eq!(widgets.count_matching(&Filter::all()).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn mutations_survive_reopening() -> TestResult {
        let dir = tempfile::tempdir()?;
        let kept = Widget::new("kept", 1);
        let dropped = Widget::new("dropped", 2);

        {
            let widgets = FileCollection::<Widget>::open(dir.path()).await?;

            widgets.insert(kept.clone()).await?;
            widgets.insert(dropped.clone()).await?;

            let mut heavier = kept.clone();
            heavier.weight = 7;
            widgets.update_by_id(kept.uuid, heavier).await?;
            widgets.delete_by_id(dropped.uuid).await?;
        }

        let reopened = FileCollection::<Widget>::open(dir.path()).await?;
        let all = reopened.find(&Filter::all(), None, 0, None).await?;

        assert_eq!(all.len(), 1, "only the kept widget should remain");
        assert_eq!(all.first().map(|w| (w.sku.as_str(), w.weight)), Some(("kept", 7)));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_insert_leaves_the_file_untouched() -> TestResult {
        let dir = tempfile::tempdir()?;
        let widgets = FileCollection::<Widget>::open(dir.path()).await?;

        widgets.insert(Widget::new("same", 1)).await?;
        let before = fs::read_to_string(widgets.path()).await?;

        let result = widgets.insert(Widget::new("same", 2)).await;

        assert!(
            matches!(result, Err(StoreError::Conflict { .. })),
            "expected conflict, got {result:?}"
        );
        assert_eq!(fs::read_to_string(widgets.path()).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_fails_to_open() -> TestResult {
        let dir = tempfile::tempdir()?;

        fs::write(dir.path().join("widgets.json"), "{ not json").await?;

        let result = FileCollection::<Widget>::open(dir.path()).await;

        assert!(
            matches!(result, Err(StoreError::Serialization(_))),
            "expected serialization error, got {result:?}"
        );

        Ok(())
    }
}
