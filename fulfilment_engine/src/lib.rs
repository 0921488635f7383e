//! Marketplace Fulfilment Engine
//!
//! The fulfilment engine owns the one genuinely state-sensitive workflow in the marketplace: what happens to an order
//! the moment the payment provider confirms it has been paid. A single checkout can span several sellers, so the
//! engine splits the order into per-seller groups, decides whether it can be handed to a rider immediately or must be
//! consolidated at a hub, and assigns a rider where it can.
//!
//! The library is divided into three main sections:
//! 1. The pure fulfilment pipeline ([`mod@fulfilment`]). Grouping and dispatch classification are plain functions over
//!    typed inputs, so the ordering contract (group, then classify, then assign) is carried by the types rather than
//!    by call order alone.
//! 2. Database management and control ([`traits`], [`mod@sqlite`]). SQLite is the supported backend. You should never
//!    need to access the database directly; the flow API drives it through the [`FulfilmentDatabase`] trait.
//! 3. The fulfilment flow API ([`FulfilmentFlowApi`]). This is the entry point the payment webhook handler calls once
//!    a payment-completion event has been verified.
//!
//! The engine also provides a set of events that can be subscribed to. These stand in for the real-time notification
//! channels of the storefront (buyer `payment-success` and `rider-assigned`, seller `new-order`) plus an operational
//! `awaiting-rider` alert. A simple actor framework is used so that you can hook into these events and perform custom
//! actions; delivery of the notifications themselves is not this crate's concern.
pub mod db_types;
pub mod events;
pub mod fulfilment;
pub mod traits;

mod ofe_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use ofe_api::{FulfilmentFlowApi, FulfilmentOutcome};
pub use traits::{FulfilmentDatabase, FulfilmentError, OrderManagement};
