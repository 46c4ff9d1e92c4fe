//! JSON persistence for dicedist distributions.
//!
//! # Public API
//!
//! - [`save`] / [`load`] / [`load_all`] -- distributions on disk
//! - [`to_json`] / [`from_json`] -- the same format in memory
//! - [`encode_key`] / [`decode_key`] -- outcome key text
//! - [`StorageError`]

pub mod codec;
mod error;
mod file;

pub use codec::{decode_key, encode_key, from_json, to_json};
pub use error::StorageError;
pub use file::{load, load_all, save};
