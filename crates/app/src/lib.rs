//! Storefront domain services, persistence backends and composition root.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod locks;
pub mod notify;
pub mod observability;
pub mod store;
pub mod uuids;

#[cfg(test)]
mod test;
