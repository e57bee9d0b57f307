//! Core domain types for the Crewline sync engine: the schema catalog,
//! the value codec, store/settings contracts, and sync session models.

pub mod catalog;
pub mod codec;
pub mod errors;
pub mod settings;
pub mod store;
pub mod sync;
pub mod value;

pub use errors::{Error, Result, StoreError};
