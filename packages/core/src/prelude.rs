pub use crate::definitions::*;
pub use crate::encoding::{
    BitParsable, BitParseResult, BitSerializable, BytesParsable, EncodingError, EncodingResult,
    IntoEncodingResult, NomTryFromPrimitive, Parsable, ParseResult, Serializable, TryFromReprError,
};
pub use crate::log::{
    LogPayload, LogPayloadDict, LogPayloadDictValue, LogPayloadList, LogPayloadText, ToLogPayload,
};
// FIXME: Get rid of the renames in munch
pub use crate::munch::{ParseError as MunchError, ParseResult as MunchResult, Parser};
pub use crate::values::*;
