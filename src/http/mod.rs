//! HTTP serving layer: admission gate middleware and the server boundary.

mod gate;
mod responses;
mod server;

pub use gate::{admission_gate, GateState};
pub use server::HttpServer;
