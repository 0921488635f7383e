//! # Backend trait contracts
//!
//! This module defines the interface contracts that persistence backends must implement to drive the fulfilment
//! engine.
//!
//! * [`FulfilmentDatabase`] defines the mutating flow operations: marking orders paid, persisting seller groups,
//!   claiming riders and creating deliveries. Every multi-row mutation is required to be atomic.
//! * [`OrderManagement`] provides the read side: fetching orders, their lines, seller groups and deliveries.
//!
//! The SQLite backend in [`crate::sqlite`] implements both.
mod fulfilment_database;
mod order_management;

pub use fulfilment_database::{FulfilmentDatabase, FulfilmentError};
pub use order_management::{OrderManagement, OrderQueryError};
