use clap::Args;
use serde::Serialize;
use storefront_app::{
    context::AppContext,
    domain::products::{ProductsServiceError, data::ProductInput},
};
use tracing::info;

use super::{parse_json, print_json};

const CATALOGUE: &str = include_str!("catalogue.json");

#[derive(Debug, Args)]
pub(crate) struct SeedArgs {}

#[derive(Debug, Serialize)]
struct SeedSummary {
    created: usize,
    skipped: usize,
}

/// Load the bundled catalogue. Products whose code is already taken are
/// skipped, so seeding twice is harmless.
async fn seed(ctx: &AppContext) -> Result<SeedSummary, String> {
    let catalogue: Vec<ProductInput> = parse_json(CATALOGUE, "catalogue")?;
    let mut summary = SeedSummary {
        created: 0,
        skipped: 0,
    };

    for input in catalogue {
        let code = input.code.clone().unwrap_or_default();

        match ctx.products.create_product(input).await {
            Ok(product) => {
                info!(code = %code, uuid = %product.uuid, "seeded product");
                summary.created += 1;
            }
            Err(ProductsServiceError::AlreadyExists) => {
                info!(code = %code, "product already present, skipping");
                summary.skipped += 1;
            }
            Err(error) => return Err(format!("failed to seed product {code}: {error}")),
        }
    }

    Ok(summary)
}

pub(crate) async fn run(ctx: &AppContext, _args: SeedArgs) -> Result<(), String> {
    print_json(&seed(ctx).await?)
}
