use clap::{Args, Subcommand};
use storefront_app::{
    context::AppContext,
    domain::{
        products::{
            data::{ProductInput, ProductPatch, Thumbnails},
            listing::{FilterSpec, ListingQuery, PageRequest, PriceOrder},
            records::ProductUuid,
        },
        validation::{FlagInput, NumericInput},
    },
};

use super::{parse_json, print_json};

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// List one page of products
    List(ListArgs),
    /// Show a single product
    Get(ProductArgs),
    /// Create a product
    Add(AddArgs),
    /// Change some fields of a product
    Update(UpdateArgs),
    /// Delete a product
    Delete(ProductArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Page number, 1-based
    #[arg(long)]
    page: Option<String>,

    /// Products per page
    #[arg(long)]
    limit: Option<String>,

    /// Price order (asc, desc)
    #[arg(long)]
    sort: Option<String>,

    /// Category name or a JSON object of field filters
    #[arg(long)]
    query: Option<String>,
}

#[derive(Debug, Args)]
struct ProductArgs {
    uuid: ProductUuid,
}

/// Product fields settable from flags. Values given here win over `--json`.
#[derive(Debug, Args)]
struct ProductFields {
    /// Full product document as JSON
    #[arg(long)]
    json: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    code: Option<String>,

    #[arg(long)]
    price: Option<String>,

    #[arg(long)]
    stock: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    status: Option<bool>,

    /// Thumbnail URL; may be repeated
    #[arg(long = "thumbnail")]
    thumbnails: Vec<String>,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(flatten)]
    fields: ProductFields,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    uuid: ProductUuid,

    #[command(flatten)]
    fields: ProductFields,
}

impl ProductFields {
    fn into_input(self) -> Result<ProductInput, String> {
        let base: ProductInput = match &self.json {
            Some(raw) => parse_json(raw, "product")?,
            None => ProductInput::default(),
        };

        let thumbnails = (!self.thumbnails.is_empty()).then(|| Thumbnails::Many(self.thumbnails));

        Ok(ProductInput {
            title: self.title.or(base.title),
            description: self.description.or(base.description),
            code: self.code.or(base.code),
            price: self.price.as_deref().map(NumericInput::from).or(base.price),
            stock: self.stock.as_deref().map(NumericInput::from).or(base.stock),
            category: self.category.or(base.category),
            status: self.status.map(FlagInput::from).or(base.status),
            thumbnails: thumbnails.or(base.thumbnails),
        })
    }

    fn into_patch(self) -> Result<ProductPatch, String> {
        let input = self.into_input()?;

        Ok(ProductPatch {
            title: input.title,
            description: input.description,
            code: input.code,
            price: input.price,
            stock: input.stock,
            category: input.category,
            status: input.status,
            thumbnails: input.thumbnails,
        })
    }
}

pub(crate) async fn run(ctx: &AppContext, command: ProductCommand) -> Result<(), String> {
    match command.command {
        ProductSubcommand::List(args) => {
            let query = ListingQuery {
                filter: args
                    .query
                    .as_deref()
                    .map(FilterSpec::parse)
                    .unwrap_or_default(),
                order: args.sort.as_deref().and_then(PriceOrder::parse),
                page: PageRequest::from_params(args.page.as_deref(), args.limit.as_deref()),
            };

            let listing = ctx
                .products
                .listing(query)
                .await
                .map_err(|error| format!("failed to list products: {error}"))?;

            print_json(&listing)
        }
        ProductSubcommand::Get(args) => {
            let product = ctx
                .products
                .get_product(args.uuid)
                .await
                .map_err(|error| format!("failed to get product: {error}"))?;

            print_json(&product)
        }
        ProductSubcommand::Add(args) => {
            let product = ctx
                .products
                .create_product(args.fields.into_input()?)
                .await
                .map_err(|error| format!("failed to create product: {error}"))?;

            print_json(&product)
        }
        ProductSubcommand::Update(args) => {
            let product = ctx
                .products
                .update_product(args.uuid, args.fields.into_patch()?)
                .await
                .map_err(|error| format!("failed to update product: {error}"))?;

            print_json(&product)
        }
        ProductSubcommand::Delete(args) => {
            let product = ctx
                .products
                .delete_product(args.uuid)
                .await
                .map_err(|error| format!("failed to delete product: {error}"))?;

            print_json(&product)
        }
    }
}
