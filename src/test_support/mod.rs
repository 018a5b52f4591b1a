//! Test utilities shared across crate-level unit tests.

pub mod sdk;

pub use sdk::{GatedSdk, YieldingSdk};
