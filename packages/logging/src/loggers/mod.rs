//! Per-subsystem logger wrappers around [crate::ImmutableLogger] /
//! [crate::LocalImmutableLogger]. The non-suffixed loggers are handed out as
//! `Arc<dyn ImmutableLogger>` to code that may outlive the actor that owns
//! the sink (shared across threads); the "2"-suffixed loggers borrow a
//! `&dyn LocalImmutableLogger` for the lifetime of a single actor's event
//! loop and avoid the `Arc`/`Send + Sync` overhead where that's unnecessary.

#[cfg(feature = "std")]
pub mod base;
pub mod controller;
pub mod controller2;
pub mod driver2;
pub mod gateway;
pub mod node;
pub mod serial;
pub mod serial2;

#[cfg(feature = "std")]
pub use base::*;
pub use controller::*;
pub use controller2::*;
pub use driver2::*;
pub use gateway::*;
pub use node::*;
pub use serial::*;
pub use serial2::*;
