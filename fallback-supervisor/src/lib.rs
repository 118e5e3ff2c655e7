//! Keep a containerized service inspectable when its primary application cannot start:
//! launch the application, fall back to a degraded http server exposing health and
//! cleanup endpoints, and as a last resort idle in a keep-alive loop.
pub mod cleanup;
mod command;
pub mod config;
pub mod error;
pub mod handlers;
pub mod keepalive;
pub mod launcher;
pub mod preparer;
pub mod server;
pub mod state;
pub mod supervisor;

#[cfg(test)]
mod test_utils;
