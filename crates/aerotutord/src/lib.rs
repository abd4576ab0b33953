//! Aero Tutor daemon library - exposes modules for testing.

pub mod routes;
pub mod server;
pub mod state;

pub use server::{router, run};
pub use state::AppState;
