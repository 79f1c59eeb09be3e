//! # matti-shared
//!
//! Domain types shared by every Matti crate: sensor readings, advisory
//! results, history entries and profiles, together with the local soil-health
//! classifier and the localized strings the advisory prompt depends on.

pub mod constants;
pub mod error;
pub mod fertilizer;
pub mod health;
pub mod i18n;
pub mod schemes;
pub mod types;

pub use error::ValidationError;
pub use health::classify;
pub use types::*;
