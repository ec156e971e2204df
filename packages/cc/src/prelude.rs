//! Convenience re-export for individual command class implementations
//! (`src/commandclass/*.rs`), which otherwise would each need half a dozen
//! `use` lines to get at the context types, the base traits and the `CC`
//! enum itself.

pub use crate::commandclass::*;
pub use crate::commandclass_raw::CCRaw;
pub use crate::values::*;
pub use zwave_core::serialize::SerializableWith;
