//! # matti-store
//!
//! Durable key-value storage for the Matti client, backed by SQLite.
//!
//! State is kept in independent named slots (language, history, speech
//! toggle, farmer profile, farm profiles).  Each slot holds one JSON document
//! and is written on its own; there are no cross-slot transactions.

pub mod database;
pub mod migrations;
pub mod slots;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use slots::Slot;
