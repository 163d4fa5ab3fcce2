//! Document persistence.
//!
//! Every record type lives in its own [`Collection`]. The domain services only
//! speak to this trait, so the same logic runs over the in-process memory
//! store, the JSON file store and the `PostgreSQL` JSONB store.

use std::{cmp::Ordering, collections::BTreeMap, path::Path, sync::Arc};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

use crate::{
    domain::{
        carts::records::CartRecord, orders::records::OrderRecord,
        products::records::ProductRecord,
    },
    uuids::TypedUuid,
};

mod file;
mod memory;
mod postgres;
mod table;

pub use file::FileCollection;
pub use memory::MemoryCollection;
pub use postgres::PgCollection;

/// A record that can be stored in a [`Collection`].
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection (file/table) name.
    const COLLECTION: &'static str;

    /// Top-level fields whose values must be unique across the collection.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> TypedUuid<Self>;
}

/// Persistence operations over a single collection.
#[async_trait]
pub trait Collection<R: Document>: Send + Sync {
    /// Records matching `filter`, ordered by `sort` (insertion order otherwise),
    /// skipping `skip` and returning at most `limit`.
    async fn find(
        &self,
        filter: &Filter,
        sort: Option<Sort>,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<R>, StoreError>;

    async fn count_matching(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn find_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError>;

    /// Store a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the id or any unique field is taken.
    async fn insert(&self, record: R) -> Result<R, StoreError>;

    /// Replace the stored record with `record`, returning `None` when absent.
    async fn update_by_id(&self, id: TypedUuid<R>, record: R) -> Result<Option<R>, StoreError>;

    /// Remove the record, returning it, or `None` when absent.
    async fn delete_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique field `{field}` is already taken")]
    Conflict { field: String },

    #[error("failed to encode or decode document")]
    Serialization(#[from] serde_json::Error),

    #[error("storage I/O error")]
    Io(#[from] std::io::Error),

    #[error("database error")]
    Sql(#[source] sqlx::Error),
}

/// Equality filter over a document's top-level fields. Empty matches all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: BTreeMap<String, Value>,
}

impl Filter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// Whether a serialized document satisfies every pair of the filter.
    pub fn matches(&self, document: &Value) -> bool {
        self.fields.iter().all(|(field, expected)| {
            document
                .get(field)
                .is_some_and(|actual| values_equal(actual, expected))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering by a single top-level field. Ties keep insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    #[must_use]
    pub const fn ascending(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    #[must_use]
    pub const fn descending(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

/// The collections backing one application instance.
#[derive(Clone)]
pub struct Collections {
    pub products: Arc<dyn Collection<ProductRecord>>,
    pub carts: Arc<dyn Collection<CartRecord>>,
    pub orders: Arc<dyn Collection<OrderRecord>>,
}

impl Collections {
    #[must_use]
    pub fn memory() -> Self {
        Self {
            products: Arc::new(MemoryCollection::<ProductRecord>::new()),
            carts: Arc::new(MemoryCollection::<CartRecord>::new()),
            orders: Arc::new(MemoryCollection::<OrderRecord>::new()),
        }
    }

    /// Open (or create) `products.json`, `carts.json` and `orders.json` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be read, created or parsed.
    pub async fn file(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir).await?;

        Ok(Self {
            products: Arc::new(FileCollection::<ProductRecord>::open(dir).await?),
            carts: Arc::new(FileCollection::<CartRecord>::open(dir).await?),
            orders: Arc::new(FileCollection::<OrderRecord>::open(dir).await?),
        })
    }

    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            products: Arc::new(PgCollection::<ProductRecord>::new(pool.clone())),
            carts: Arc::new(PgCollection::<CartRecord>::new(pool.clone())),
            orders: Arc::new(PgCollection::<OrderRecord>::new(pool.clone())),
        }
    }
}

/// JSON equality where numbers compare by value, so `45` equals `45.0`.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_equal(a, b))
        }
        _ => a == b,
    }
}

/// Total order used for sorting: missing/null first, then booleans, numbers, strings.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}
