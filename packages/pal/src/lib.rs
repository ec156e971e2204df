//! Platform abstraction layer: timers and monotonic time, behind a `std`
//! (tokio) or `embassy` backend selected at compile time via features.

#[cfg(feature = "std")]
mod std_backend;
#[cfg(feature = "std")]
pub use std_backend::*;

#[cfg(feature = "embassy")]
mod embassy_backend;
#[cfg(feature = "embassy")]
pub use embassy_backend::*;
