//! HTTP surface of the probe service.
//!
//! Handlers parse and validate request input, then hand the shaping core in
//! `probe_shaping` a [`writer::ChannelWriter`] to drive. Everything that is not range,
//! drip, weighted status or conditional handling is a thin mapping from the request to
//! a JSON echo.

mod body;
mod params;

pub mod echo;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod writer;

pub use errors::{ApiError, ServeError};
pub use routes::router;
pub use server::{BoxedError, Operator, ProbeServer, ServeHandle, ServeResult};
pub use state::{AppState, SharedState};
