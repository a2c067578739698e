// A secret-prefix MAC oracle reachable over HTTP, and the client side of the
// length extension attack against it.
mod client;
pub mod server;

pub use client::{remote_length_extension_attack, RemoteMacOracle, RetryPolicy};
