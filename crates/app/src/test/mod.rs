//! Test support shared by the service tests.

pub(crate) mod helpers;

pub(crate) use context::TestContext;
