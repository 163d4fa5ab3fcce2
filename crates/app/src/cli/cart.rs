use clap::{Args, Subcommand};
use serde_json::Value;
use storefront_app::{
    context::AppContext,
    domain::{
        carts::{data::CartItemsInput, records::CartUuid},
        products::records::ProductUuid,
    },
};

use super::{parse_json, print_json};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Create an empty cart
    Create,
    /// Show a cart
    Get(CartArgs),
    /// Add a product, merging into its existing line
    Add(AddArgs),
    /// Overwrite the quantity of a line
    SetQuantity(SetQuantityArgs),
    /// Remove a product's line
    Remove(LineArgs),
    /// Replace every line from a JSON array
    Replace(ReplaceArgs),
    /// Remove every line
    Clear(CartArgs),
    /// Delete a cart
    Delete(CartArgs),
}

#[derive(Debug, Args)]
struct CartArgs {
    cart: CartUuid,
}

#[derive(Debug, Args)]
struct LineArgs {
    cart: CartUuid,
    product: ProductUuid,
}

#[derive(Debug, Args)]
struct AddArgs {
    cart: CartUuid,
    product: ProductUuid,

    #[arg(long, default_value_t = 1)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct SetQuantityArgs {
    cart: CartUuid,
    product: ProductUuid,
    quantity: u32,
}

#[derive(Debug, Args)]
struct ReplaceArgs {
    cart: CartUuid,

    /// Lines as `[{"product": "<uuid>", "quantity": 2}, ...]`
    #[arg(long)]
    json: String,
}

pub(crate) async fn run(ctx: &AppContext, command: CartCommand) -> Result<(), String> {
    let carts = &ctx.carts;

    let cart = match command.command {
        CartSubcommand::Create => carts.create_cart().await,
        CartSubcommand::Get(args) => carts.get_cart(args.cart).await,
        CartSubcommand::Add(args) => {
            carts
                .add_product(args.cart, args.product, args.quantity)
                .await
        }
        CartSubcommand::SetQuantity(args) => {
            carts
                .set_quantity(args.cart, args.product, args.quantity)
                .await
        }
        CartSubcommand::Remove(args) => carts.remove_product(args.cart, args.product).await,
        CartSubcommand::Replace(args) => {
            let raw: Value = parse_json(&args.json, "cart products")?;
            let items = CartItemsInput::parse(&raw).map_err(|error| error.to_string())?;

            carts.replace_products(args.cart, items).await
        }
        CartSubcommand::Clear(args) => carts.clear_cart(args.cart).await,
        CartSubcommand::Delete(args) => carts.delete_cart(args.cart).await,
    }
    .map_err(|error| format!("cart operation failed: {error}"))?;

    print_json(&cart)
}
