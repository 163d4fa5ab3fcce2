//! Test Helpers

use crate::{
    domain::products::{
        ProductsService, ProductsServiceError, data::ProductInput, records::ProductRecord,
    },
    test::TestContext,
};

/// Valid input for a kettle with the given code and whole-number price.
pub(crate) fn product_input(code: &str, price: u32) -> ProductInput {
    ProductInput {
        title: Some(format!("Kettle {code}")),
        description: Some("1.7L".to_string()),
        code: Some(code.to_string()),
        price: Some(price.into()),
        stock: Some(35_u32.into()),
        category: Some("Hervidores".to_string()),
        status: None,
        thumbnails: None,
    }
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    code: &str,
    price: u32,
) -> Result<ProductRecord, ProductsServiceError> {
    ctx.products.create_product(product_input(code, price)).await
}
