//! HTTP layer: request specification and the wire transport.

mod transport;

pub use transport::{Format, RequestSpec, Transport};
