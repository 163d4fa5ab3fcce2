use clap::{Args, Subcommand};
use storefront_app::{
    context::AppContext,
    domain::{
        carts::records::CartUuid,
        orders::{
            data::{NewOrder, OrderUpdate},
            records::{OrderStatus, OrderUuid, ShippingAddress},
        },
    },
};

use super::{parse_json, print_json};

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Place an order from a cart's current contents
    Create(CreateArgs),
    /// Show an order
    Get(OrderArgs),
    /// List every order
    List,
    /// Change an order's status or shipping address
    Update(UpdateArgs),
    /// Delete an order
    Delete(OrderArgs),
}

#[derive(Debug, Args)]
struct OrderArgs {
    order: OrderUuid,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    cart: Option<CartUuid>,

    #[arg(long)]
    email: Option<String>,

    /// Shipping address as a JSON object
    #[arg(long)]
    address: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    order: OrderUuid,

    /// pending, confirmed, shipped, delivered or cancelled
    #[arg(long)]
    status: Option<OrderStatus>,

    /// Shipping address as a JSON object
    #[arg(long)]
    address: Option<String>,
}

fn parse_address(raw: Option<&str>) -> Result<Option<ShippingAddress>, String> {
    raw.map(|raw| parse_json(raw, "shipping address")).transpose()
}

pub(crate) async fn run(ctx: &AppContext, command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Create(args) => {
            let order = ctx
                .orders
                .create_order(NewOrder {
                    cart: args.cart,
                    email: args.email,
                    shipping_address: parse_address(args.address.as_deref())?,
                })
                .await
                .map_err(|error| format!("failed to create order: {error}"))?;

            print_json(&order)
        }
        OrderSubcommand::Get(args) => {
            let order = ctx
                .orders
                .get_order(args.order)
                .await
                .map_err(|error| format!("failed to get order: {error}"))?;

            print_json(&order)
        }
        OrderSubcommand::List => {
            let orders = ctx
                .orders
                .list_orders()
                .await
                .map_err(|error| format!("failed to list orders: {error}"))?;

            print_json(&orders)
        }
        OrderSubcommand::Update(args) => {
            let order = ctx
                .orders
                .update_order(
                    args.order,
                    OrderUpdate {
                        status: args.status,
                        shipping_address: parse_address(args.address.as_deref())?,
                    },
                )
                .await
                .map_err(|error| format!("failed to update order: {error}"))?;

            print_json(&order)
        }
        OrderSubcommand::Delete(args) => {
            let order = ctx
                .orders
                .delete_order(args.order)
                .await
                .map_err(|error| format!("failed to delete order: {error}"))?;

            print_json(&order)
        }
    }
}
