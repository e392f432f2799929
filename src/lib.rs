//! gstat sends metrics to graphite without ever getting in the caller's way.
//! Each metric becomes one plaintext line, `"<name> <value> <timestamp>\n"`,
//! fired at carbon in a single UDP datagram. Nothing is acknowledged or
//! retried, and no failure (a bad value, an unparseable port, an unreachable
//! host) escapes: it is logged through `tracing` at error and the call returns
//! `None`.
//!
//! ### Example
//!
//! ```
//! use gstat::Timestamp;
//!
//! // Without CARBON_HOST nothing is sent and the line comes back marked.
//! std::env::remove_var(gstat::config::CARBON_HOST_ENV);
//! assert_eq!(
//!     gstat::emit("app.queue.depth", 17, Some(Timestamp::from_secs(789))).as_deref(),
//!     Some("(debug) app.queue.depth 17 789")
//! );
//! ```
//!
//! # Configuration
//!
//! Read from the environment on every call, so nothing needs initializing:
//!
//! * `CARBON_HOST`: where carbon listens. Unset or empty logs lines at info
//!   instead of sending them, which is what you want during development.
//! * `CARBON_PORT`: defaults to 2003.
//!
//! Use [GstatClient::new] with a [Config] to pin the destination instead.
//!
//! # Usage
//!
//! ```
//! # std::env::remove_var(gstat::config::CARBON_HOST_ENV);
//! // Several metrics sharing one timestamp, results in input order.
//! let results = gstat::emit_all([("app.users", 12.0), ("app.sessions", 3.5)], None).unwrap();
//! assert_eq!(results.len(), 2);
//!
//! // Something happened once.
//! gstat::emit_event("app.deploy", None);
//!
//! // Time a block and emit the elapsed seconds.
//! let total = gstat::time_and_emit("app.sum.time").measure_sync_fn(|| (1..=10).sum::<u32>());
//! assert_eq!(total, 55);
//! ```

pub mod batch;
/// [GstatClient] formats and sends lines, swallowing failures.
pub mod client;
pub mod config;
/// [Elapsed](instrument::Elapsed) times operations for [GstatClient::time_and_emit].
pub mod instrument;
pub mod macros;
/// The wire line and the values that go into it.
pub mod metric;
pub mod transport;

pub use client::{
    emit, emit_all, emit_event, global_client, time_and_emit, Emission, EmitError, GstatClient,
};
pub use config::{Config, ConfigSource, EnvConfig};
pub use metric::*;
