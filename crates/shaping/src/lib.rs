//! Response shaping core for the probe service.
//!
//! Everything here works on already-extracted request values and a
//! [`delivery::ResponseWriter`]; no module knows about routing or the HTTP server.
//!
//! - [`range`] resolves a `Range` header against a resource length.
//! - [`delivery`] emits bodies over wall-clock time (drip and range streaming).
//! - [`weighted`] parses `code:weight` lists and draws a status code.
//! - [`conditional`] evaluates `If-None-Match`, `If-Match` and `If-Modified-Since`.
//! - [`payload`] generates the deterministic and random body bytes.

mod errors;

pub mod conditional;
pub mod delivery;
pub mod payload;
pub mod range;
pub mod weighted;

pub use errors::{ShapingError, ShapingResult};
