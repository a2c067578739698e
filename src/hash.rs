use crate::word::Endianness;
use crate::{pad_with_bit_len, Error, Md4, Result, Sha1};

use std::{fmt::Debug, marker::PhantomData, str::FromStr};

pub const BLOCK_SIZE: usize = 64;

/// A Merkle-Damgard hash whose chaining state is exactly its output.
///
/// Each variant supplies its initial registers, its compression function
/// and the byte order used both for the padding's length field and for
/// serialising registers into a digest.
pub trait HashVariant: Debug + Clone + Copy + Default + Send + Sync {
    const NAME: &'static str;
    const ENDIANNESS: Endianness;
    const DIGEST_SIZE: usize;

    type State: Debug + Clone + Copy + PartialEq + Eq + Send + Sync;
    type Digest: Debug
        + Clone
        + Copy
        + PartialEq
        + Eq
        + AsRef<[u8]>
        + for<'a> TryFrom<&'a [u8]>
        + Send
        + Sync;

    fn initial_state() -> Self::State;

    /// Run the compression function over one 64 byte block.
    fn compress(state: &mut Self::State, block: &[u8]);

    fn state_to_digest(state: &Self::State) -> Self::Digest;

    /// Split a digest back into registers (register injection).
    fn state_from_digest(digest: &Self::Digest) -> Self::State;

    fn digest_from_bytes(bytes: &[u8]) -> Result<Self::Digest> {
        <Self::Digest as TryFrom<&[u8]>>::try_from(bytes).map_err(|_| Error::InvalidDigestLength {
            expected: Self::DIGEST_SIZE,
            actual: bytes.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HashEngine<V: HashVariant> {
    state: V::State,
    buffer: Vec<u8>,
    message_len: u64,
    bit_len_override: Option<u64>,
    _variant: PhantomData<V>,
}

impl<V: HashVariant> HashEngine<V> {
    pub fn new() -> Self {
        Self::from_state(V::initial_state())
    }

    /// Start hashing from the given registers rather than the variant's
    /// initial constants.
    pub fn from_state(state: V::State) -> Self {
        Self {
            state,
            buffer: Vec::with_capacity(BLOCK_SIZE),
            message_len: 0,
            bit_len_override: None,
            _variant: PhantomData,
        }
    }

    /// Use `bit_len` in the final padding's length field instead of the
    /// number of bits passed to `update`.
    pub fn with_bit_len(mut self, bit_len: u64) -> Self {
        self.bit_len_override = Some(bit_len);
        self
    }

    pub fn state(&self) -> V::State {
        self.state
    }

    pub fn update(&mut self, data: &[u8]) {
        self.message_len += data.len() as u64;
        self.absorb(data);
    }

    pub fn finalize(mut self) -> V::Digest {
        let bit_len = self
            .bit_len_override
            .unwrap_or_else(|| self.message_len.wrapping_mul(8));
        let padding = pad_with_bit_len::<V>(self.message_len, bit_len);
        self.absorb(&padding);
        debug_assert!(self.buffer.is_empty());
        V::state_to_digest(&self.state)
    }

    pub fn update_and_finalize(mut self, message: &[u8]) -> V::Digest {
        self.update(message);
        self.finalize()
    }

    pub fn digest_message(message: &[u8]) -> V::Digest {
        Self::new().update_and_finalize(message)
    }

    /// Hash `message`, optionally resuming from injected registers and
    /// optionally overriding the bit length written into the padding.
    pub fn digest(
        message: &[u8],
        injected_state: Option<V::State>,
        bit_len_override: Option<u64>,
    ) -> V::Digest {
        let mut engine = Self::from_state(injected_state.unwrap_or_else(V::initial_state));
        engine.bit_len_override = bit_len_override;
        engine.update_and_finalize(message)
    }

    /// Compress already padded input from the initial constants, applying no
    /// padding of its own.
    pub fn compress_padded(padded: &[u8]) -> Result<V::Digest> {
        if padded.len() % BLOCK_SIZE != 0 {
            return Err(Error::UnalignedInput(padded.len()));
        }
        let mut state = V::initial_state();
        for block in padded.chunks_exact(BLOCK_SIZE) {
            V::compress(&mut state, block);
        }
        Ok(V::state_to_digest(&state))
    }

    fn absorb(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        let full_len = self.buffer.len() - self.buffer.len() % BLOCK_SIZE;
        for block in self.buffer[..full_len].chunks_exact(BLOCK_SIZE) {
            V::compress(&mut self.state, block);
        }
        self.buffer.drain(..full_len);
    }
}

impl<V: HashVariant> Default for HashEngine<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime selection of a hash variant, e.g. from a command line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Md4,
}

impl Algorithm {
    pub fn digest_size(self) -> usize {
        match self {
            Algorithm::Sha1 => Sha1::DIGEST_SIZE,
            Algorithm::Md4 => Md4::DIGEST_SIZE,
        }
    }

    pub fn digest_message(self, message: &[u8]) -> Vec<u8> {
        match self {
            Algorithm::Sha1 => HashEngine::<Sha1>::digest_message(message).to_vec(),
            Algorithm::Md4 => HashEngine::<Md4>::digest_message(message).to_vec(),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Algorithm::Sha1),
            "md4" => Ok(Algorithm::Md4),
            _ => Err(Error::UnsupportedVariant(s.to_string())),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Sha1 => f.write_str(Sha1::NAME),
            Algorithm::Md4 => f.write_str(Md4::NAME),
        }
    }
}
