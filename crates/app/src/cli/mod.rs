use clap::{Parser, Subcommand};
use serde::{Serialize, de::DeserializeOwned};
use storefront_app::{
    config::{AppConfig, LoggingConfig},
    context::AppContext,
    notify::{BroadcastNotifier, Notification},
};
use tokio::sync::broadcast::{Receiver, error::TryRecvError};
use tracing::{info, warn};

mod cart;
mod order;
mod product;
mod seed;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Product(product::ProductCommand),
    Cart(cart::CartCommand),
    Order(order::OrderCommand),
    Seed(seed::SeedArgs),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let ctx = AppContext::from_config(&self.config)
            .await
            .map_err(|error| format!("failed to open store: {error}"))?;

        let mut updates = ctx.live_updates.as_ref().map(BroadcastNotifier::subscribe);

        let result = match self.command {
            Commands::Product(command) => product::run(&ctx, command).await,
            Commands::Cart(command) => cart::run(&ctx, command).await,
            Commands::Order(command) => order::run(&ctx, command).await,
            Commands::Seed(args) => seed::run(&ctx, args).await,
        };

        if let Some(receiver) = updates.as_mut() {
            drain_updates(receiver);
        }

        result
    }
}

/// Log every notification the command produced.
fn drain_updates(receiver: &mut Receiver<Notification>) {
    loop {
        match receiver.try_recv() {
            Ok(notification) => {
                info!(event = %notification.event, payload = %notification.payload, "live update");
            }
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "live updates lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to encode output: {error}"))?;

    println!("{rendered}");

    Ok(())
}

pub(crate) fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|error| format!("invalid {what} JSON: {error}"))
}
