//! MeshPrint relay server library.
//!
//! A stateless HTTP front for the external generation and upload services,
//! plus a CORS-bypassing proxy for binary model fetches.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ErrorResponse};
pub use state::AppState;
