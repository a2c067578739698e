use crate::word::{add, block_words, left_rotate, read_words, write_words, Endianness};
use crate::HashVariant;

const INITIALISATION_CONSTANTS: [u32; 5] =
    [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];
const SHA1_LEN: usize = 20;

pub type Sha1Digest = [u8; SHA1_LEN];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha1;

impl HashVariant for Sha1 {
    const NAME: &'static str = "SHA-1";
    const ENDIANNESS: Endianness = Endianness::Big;
    const DIGEST_SIZE: usize = SHA1_LEN;

    type State = [u32; 5];
    type Digest = Sha1Digest;

    fn initial_state() -> Self::State {
        INITIALISATION_CONSTANTS
    }

    fn compress(state: &mut Self::State, block: &[u8]) {
        let mut w = [0u32; 80];
        w[..16].copy_from_slice(&block_words(block, Endianness::Big));
        for i in 16..80 {
            w[i] = left_rotate(w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16], 1);
        }

        let [mut a, mut b, mut c, mut d, mut e] = *state;
        for (i, &word) in w.iter().enumerate() {
            let (f, k) = match i {
                0..=19 => ((b & c) | ((!b) & d), 0x5A827999),
                20..=39 => (b ^ c ^ d, 0x6ED9EBA1),
                40..=59 => ((b & c) | (b & d) | (c & d), 0x8F1BBCDC),
                _ => (b ^ c ^ d, 0xCA62C1D6),
            };

            let temp = add(add(add(add(left_rotate(a, 5), f), e), k), word);
            e = d;
            d = c;
            c = left_rotate(b, 30);
            b = a;
            a = temp;
        }

        for (register, value) in state.iter_mut().zip([a, b, c, d, e]) {
            *register = add(*register, value);
        }
    }

    fn state_to_digest(state: &Self::State) -> Self::Digest {
        let mut digest = [0u8; SHA1_LEN];
        write_words(state, Endianness::Big, &mut digest);
        digest
    }

    fn state_from_digest(digest: &Self::Digest) -> Self::State {
        read_words(digest, Endianness::Big)
    }
}
