pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested hash algorithm is not SHA-1 or MD4.
    #[error("unsupported hash variant: {0}")]
    UnsupportedVariant(String),

    /// No key length in the searched range produced an accepted forgery.
    #[error("length extension attack failed: no forgery accepted after {tried} key length guesses")]
    ForgeryExhausted { tried: u32 },

    /// The MAC oracle could not be reached, or kept failing after retries.
    #[error("MAC oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    #[error("input of {0} bytes is not a whole number of 64 byte blocks")]
    UnalignedInput(usize),
}
