use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UnsortedKeys,
    EmptyInput,
    InvalidEpsilon,
    TruncatedInput,
    InvalidFormat(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsortedKeys => write!(f, "keys must be sorted and non-decreasing"),
            Error::EmptyInput => write!(f, "input data cannot be empty"),
            Error::InvalidEpsilon => write!(f, "epsilon must be greater than 0"),
            Error::TruncatedInput => write!(f, "serialized index ends before its declared length"),
            Error::InvalidFormat(what) => write!(f, "malformed serialized index: {}", what),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
