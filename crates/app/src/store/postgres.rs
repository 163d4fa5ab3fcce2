//! `PostgreSQL` JSONB collection.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row,
    error::{DatabaseError, ErrorKind},
    postgres::PgRow,
    query,
    types::Json,
};

use crate::uuids::TypedUuid;

use super::{Collection, Document, Filter, Sort, SortDirection, StoreError};

/// Collection stored as JSONB documents in the table named after
/// [`Document::COLLECTION`]. Insertion order is the `seq` column.
#[derive(Debug)]
pub struct PgCollection<R> {
    pool: PgPool,
    marker: PhantomData<fn() -> R>,
}

impl<R: Document> PgCollection<R> {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            marker: PhantomData,
        }
    }

    fn select(&self, columns: &str) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT {columns} FROM {} WHERE TRUE", R::COLLECTION))
    }
}

#[async_trait]
impl<R: Document> Collection<R> for PgCollection<R> {
    async fn find(
        &self,
        filter: &Filter,
        sort: Option<Sort>,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<R>, StoreError> {
        let mut builder = self.select("doc");

        push_filter(&mut builder, filter);

        builder.push(" ORDER BY ");

        if let Some(sort) = sort {
            builder.push("doc -> ").push_bind(sort.field).push(match sort.direction {
                SortDirection::Ascending => " ASC, ",
                SortDirection::Descending => " DESC, ",
            });
        }

        builder
            .push("seq ASC OFFSET ")
            .push_bind(to_i64(skip))
            .push(" LIMIT ")
            .push_bind(limit.map(to_i64));

        builder
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(decode_doc)
            .collect()
    }

    async fn count_matching(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut builder = self.select("COUNT(*)");

        push_filter(&mut builder, filter);

        let count: i64 = builder.build().fetch_one(&self.pool).await?.try_get(0)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError> {
        query(&format!("SELECT doc FROM {} WHERE id = $1", R::COLLECTION))
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(decode_doc)
            .transpose()
    }

    async fn insert(&self, record: R) -> Result<R, StoreError> {
        query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            R::COLLECTION
        ))
        .bind(record.id().into_uuid())
        .bind(Json(&record))
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_by_id(&self, id: TypedUuid<R>, record: R) -> Result<Option<R>, StoreError> {
        query(&format!(
            "UPDATE {} SET doc = $2, updated_at = now() WHERE id = $1 RETURNING doc",
            R::COLLECTION
        ))
        .bind(id.into_uuid())
        .bind(Json(&record))
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(decode_doc)
        .transpose()
    }

    async fn delete_by_id(&self, id: TypedUuid<R>) -> Result<Option<R>, StoreError> {
        query(&format!(
            "DELETE FROM {} WHERE id = $1 RETURNING doc",
            R::COLLECTION
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(decode_doc)
        .transpose()
    }
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    for (field, value) in filter.fields() {
        builder
            .push(" AND doc -> ")
            .push_bind(field.to_string())
            .push(" = ")
            .push_bind(Json(value.clone()));
    }
}

fn decode_doc<R: Document>(row: &PgRow) -> Result<R, StoreError> {
    Ok(row.try_get::<Json<R>, _>("doc")?.0)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        let conflict = error
            .as_database_error()
            .filter(|db| matches!(db.kind(), ErrorKind::UniqueViolation))
            .map(|db| conflict_field(db));

        match conflict {
            Some(field) => Self::Conflict { field },
            None => Self::Sql(error),
        }
    }
}

/// Unique indexes are named `<collection>_<field>_unique`; the primary key is `uuid`.
fn conflict_field(error: &dyn DatabaseError) -> String {
    error
        .constraint()
        .and_then(|name| name.strip_suffix("_unique"))
        .and_then(|name| name.split_once('_'))
        .map_or_else(|| "uuid".to_string(), |(_, field)| field.to_string())
}
