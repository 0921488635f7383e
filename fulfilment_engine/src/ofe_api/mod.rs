//! # Fulfilment engine public API
//!
//! [`FulfilmentFlowApi`] is the entry point the payment webhook handler invokes once a payment-completion event has
//! been verified out-of-band. An API instance is created by supplying a database backend that implements
//! [`crate::traits::FulfilmentDatabase`], plus the event producers that stand in for the storefront's real-time
//! notification channels:
//!
//! ```rust,ignore
//! use fulfilment_engine::{events::EventHooks, FulfilmentFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/marketplace.db", 5).await?;
//! let api = FulfilmentFlowApi::new(db, producers);
//! let outcome = api.process_paid_order(&order_id, Some("12 Harbour Lane"), None).await?;
//! ```
mod fulfilment_flow_api;

pub use fulfilment_flow_api::{FulfilmentFlowApi, FulfilmentOutcome};
