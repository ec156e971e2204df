//! Z-Wave command class definitions: parsing, serialization and the
//! metadata ("values") that an individual command carries.
//!
//! The [`commandclass::CC`] enum is generated at compile time by
//! [`proc_macros::impl_cc_enum`], which scans `src/commandclass/` for
//! `CCId` impls and wires up one enum variant per command class command.

pub mod cc_sequence;
pub mod commandclass;
pub mod commandclass_raw;
pub mod prelude;
pub mod values;

pub use commandclass::*;
