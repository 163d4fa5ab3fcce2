//! Products service.

use std::{
    fmt::{self, Debug},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{debug, info};

use crate::{
    domain::products::{
        data::{NewProduct, ProductInput, ProductPatch},
        errors::ProductsServiceError,
        listing::{Listing, ListingQuery, Page, PriceOrder},
        records::{ProductRecord, ProductUuid},
    },
    notify::{Event, Notifier, publish},
    store::Collection,
};

#[derive(Clone)]
pub struct StoreProductsService {
    products: Arc<dyn Collection<ProductRecord>>,
    notifier: Arc<dyn Notifier>,
}

impl StoreProductsService {
    #[must_use]
    pub fn new(products: Arc<dyn Collection<ProductRecord>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { products, notifier }
    }
}

impl Debug for StoreProductsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreProductsService").finish_non_exhaustive()
    }
}

#[async_trait]
impl ProductsService for StoreProductsService {
    async fn list_products(
        &self,
        query: ListingQuery,
    ) -> Result<Page<ProductRecord>, ProductsServiceError> {
        let filter = query.filter.to_filter();

        let total_docs = self.products.count_matching(&filter).await?;

        let docs = self
            .products
            .find(
                &filter,
                query.order.map(PriceOrder::sort),
                query.page.skip(),
                Some(query.page.page_size()),
            )
            .await?;

        debug!(
            total_docs,
            page = query.page.page(),
            returned = docs.len(),
            "listed products"
        );

        Ok(Page::new(docs, total_docs, query.page))
    }

    async fn listing(&self, query: ListingQuery) -> Result<Listing, ProductsServiceError> {
        Ok(Listing::from_page(self.list_products(query).await?))
    }

    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError> {
        self.products
            .find_by_id(product)
            .await?
            .ok_or(ProductsServiceError::NotFound)
    }

    async fn create_product(
        &self,
        input: ProductInput,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let product = NewProduct::try_from(input)?.into_record(Timestamp::now());

        let created = self.products.insert(product).await?;

        info!(product = %created.uuid, code = %created.code, "product created");
        publish(self.notifier.as_ref(), Event::ProductCreated, &created);

        Ok(created)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        patch: ProductPatch,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut record = self.get_product(product).await?;

        patch.apply(&mut record)?;
        record.updated_at = Timestamp::now();

        let updated = self
            .products
            .update_by_id(product, record)
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        info!(product = %updated.uuid, "product updated");
        publish(self.notifier.as_ref(), Event::ProductUpdated, &updated);

        Ok(updated)
    }

    async fn delete_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let deleted = self
            .products
            .delete_by_id(product)
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        info!(product = %deleted.uuid, code = %deleted.code, "product deleted");
        publish(self.notifier.as_ref(), Event::ProductDeleted, &deleted);

        Ok(deleted)
    }
}

#[async_trait]
impl ProductResolver for StoreProductsService {
    async fn resolve(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError> {
        self.get_product(product).await
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve one page of products matching the query.
    async fn list_products(
        &self,
        query: ListingQuery,
    ) -> Result<Page<ProductRecord>, ProductsServiceError>;

    /// Retrieve a page of products grouped by category.
    async fn listing(&self, query: ListingQuery) -> Result<Listing, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError>;

    /// Validate and store a new product under a fresh UUID.
    async fn create_product(
        &self,
        input: ProductInput,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Merge the supplied fields over an existing product.
    async fn update_product(
        &self,
        product: ProductUuid,
        patch: ProductPatch,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Deletes a product, returning the removed record.
    async fn delete_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError>;
}

/// Looks up the live product behind a cart or order line.
#[automock]
#[async_trait]
pub trait ProductResolver: Send + Sync {
    async fn resolve(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError>;
}
