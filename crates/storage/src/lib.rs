//! Storage abstraction and implementations for colony state.
//!
//! Only what a cold restart needs is persisted: each agent's role tag, mode
//! flag, home colony and active task identity. This crate provides a
//! trait-based storage interface with a JSON file reference implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{ColonyRecord, RecordMeta, Storage, StorageError, Result};
pub use json_storage::JsonStorage;
