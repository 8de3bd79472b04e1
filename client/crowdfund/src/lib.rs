//! Client-side data layer for the crowdfunding platform.
//!
//! Each backend resource (campaigns, donations, rewards, transfers, ...) is
//! served by a store in [`stores`] that owns one observable slice of remote
//! state and exposes async operations against the REST API. [`AppContext`]
//! wires them together; [`callback`] receives the payment processor's
//! redirect back.

pub mod api;
pub mod callback;
pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod navigation;
pub mod saga;
pub mod storage;
pub mod store;
pub mod stores;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use context::AppContext;
pub use errors::{ClientError, Result};
