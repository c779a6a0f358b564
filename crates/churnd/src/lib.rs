//! churnd: HTTP churn scoring service
//!
//! Wires the customer store, the fitted pipeline and the decision policy
//! into an axum router.

pub mod api;
pub mod config;
pub mod startup;

pub use api::{build_router, ApiError, AppState};
pub use config::{Cli, Command, SeedArgs, ServeArgs, StoreArgs};
