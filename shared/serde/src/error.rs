use thiserror::Error;

/// Failure while decoding a bit stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    #[error("Unexpected end of stream: {needed} bits needed, {remaining} remaining")]
    UnexpectedEnd { needed: u32, remaining: u32 },
    #[error("String field is not valid UTF-8")]
    InvalidUtf8,
    #[error("Variable-length integer {value} is larger than the encodable maximum {max}")]
    VarIntOverflow { value: u32, max: u32 },
    #[error("Invalid {type_name} value: {value}")]
    InvalidValue { type_name: &'static str, value: u32 },
}
