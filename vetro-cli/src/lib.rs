//! Push spreadsheet edits of Vetro feature exports back to the Vetro API
//!
//! An operator downloads a layer export, edits it in a spreadsheet, and this
//! crate works out which cells changed and sends them as batched, retried
//! PATCH requests.

pub mod api;
pub mod cli;
pub mod config;
pub mod feature_types;
pub mod sync;
pub mod table;
