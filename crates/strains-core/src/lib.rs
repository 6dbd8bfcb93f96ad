//! Core types and trait definitions for the strain catalog.
//!
//! No HTTP or database dependencies live here; every other crate in the
//! workspace depends on this one.

// Backends implement `StrainStore` with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod repr;
pub mod store;
pub mod strain;

pub use error::{Error, Lookup, Result, StoreError};
