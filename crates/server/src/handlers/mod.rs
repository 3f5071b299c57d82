//! Request handlers. Each one validates its input before touching the response, so a
//! bad request always gets a complete error response; streaming handlers then hand a
//! [`crate::writer::ChannelWriter`] to a delivery schedule on its own task.

pub mod cache;
pub mod drip;
pub mod dynamic;
pub mod range;
pub mod status;
