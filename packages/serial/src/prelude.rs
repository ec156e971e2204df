pub use crate::command::{
    AsCommandRaw, Command, CommandBase, CommandEncodingContext, CommandId, CommandParsable,
    CommandParsingContext, CommandRequest,
};
pub use crate::command_raw::CommandRaw;

// Can't use this in combination with the TryFromRepr derive macro
// because that has Result hardcoded
// pub use crate::error::*;
