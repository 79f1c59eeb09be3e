//! Command handlers.
//!
//! Each sub-module groups related commands by domain.  Handlers take the
//! [`AppContext`](crate::context::AppContext), lock the shared state only for
//! short synchronous sections and never across an `.await`.

pub mod analysis;
pub mod history;
pub mod navigation;
pub mod profile;
pub mod sensor;
pub mod settings;
