//! Observability for the agent execution core (§10.1): `tracing` span
//! helpers and OpenTelemetry OTLP export. No TUI log sink here — there's no
//! TUI client to feed in this system.
//!
//! # Quick start
//!
//! ```no_run
//! use pilotcore_observability::{init_from_env, agent_span};
//!
//! init_from_env().expect("observability init");
//! let span = agent_span!("session-1", "run");
//! let _guard = span.enter();
//! tracing::info!("turn started");
//! ```

pub mod config;
pub mod error;
pub mod span;
pub mod telemetry;

pub use config::ObservabilityConfig;
pub use error::ObservabilityError;
pub use span::{record_duration, record_error};
pub use telemetry::{init, init_from_env, shutdown};
