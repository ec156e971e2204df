//! Logging primitives shared by the driver and gateway crates: the
//! [Logger]/[ImmutableLogger]/[LocalImmutableLogger] traits a component logs
//! through, [LogInfo]/[Direction]/[Loglevel] the log line itself is built
//! from, and a default colorized [formatters::DefaultFormatter] plus the
//! per-subsystem loggers under [loggers].

mod definitions;
#[cfg(feature = "std")]
pub mod formatters;
pub mod loggers;

pub use definitions::*;
