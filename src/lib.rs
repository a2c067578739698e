mod error;
mod forgery;
mod hash;
mod mac;
mod md4;
mod oracle;
mod padding;
mod sha1;
mod word;

pub use error::{Error, Result};
pub use forgery::{length_extension_attack, ForgeryAttempt, ForgeryEngine, DEFAULT_MAX_KEY_LEN};
pub use hash::{Algorithm, HashEngine, HashVariant, BLOCK_SIZE};
pub use mac::{authenticate_message, random_key, verify_message, KeyedMacOracle};
pub use md4::{Md4, Md4Digest};
pub use oracle::{remote_length_extension_attack, server, RemoteMacOracle, RetryPolicy};
pub use padding::{pad, pad_with_bit_len};
pub use sha1::{Sha1, Sha1Digest};
pub use word::Endianness;
