// MD4 as described in RFC 1320.
use crate::word::{add, block_words, left_rotate, read_words, write_words, Endianness};
use crate::HashVariant;

const INITIALISATION_CONSTANTS: [u32; 4] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476];
const MD4_SIZE: usize = 16;

const ROUND_2_CONSTANT: u32 = 0x5a827999;
const ROUND_3_CONSTANT: u32 = 0x6ed9eba1;

const ROUND_1_SHIFTS: [u32; 4] = [3, 7, 11, 19];
const ROUND_2_SHIFTS: [u32; 4] = [3, 5, 9, 13];
const ROUND_3_SHIFTS: [u32; 4] = [3, 9, 11, 15];
const ROUND_3_ORDER: [usize; 16] = [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];

pub type Md4Digest = [u8; MD4_SIZE];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Md4;

impl HashVariant for Md4 {
    const NAME: &'static str = "MD4";
    const ENDIANNESS: Endianness = Endianness::Little;
    const DIGEST_SIZE: usize = MD4_SIZE;

    type State = [u32; 4];
    type Digest = Md4Digest;

    fn initial_state() -> Self::State {
        INITIALISATION_CONSTANTS
    }

    fn compress(state: &mut Self::State, block: &[u8]) {
        let x = block_words(block, Endianness::Little);

        // Step r of a round updates register (16 - r) % 4 from the other
        // three, i.e. the registers cycle a, d, c, b.
        let mut d = *state;
        for r in 0..16 {
            let i = (16 - r) % 4;
            let (b, c, e) = (d[(i + 1) % 4], d[(i + 2) % 4], d[(i + 3) % 4]);
            d[i] = left_rotate(add(add(d[i], f(b, c, e)), x[r]), ROUND_1_SHIFTS[r % 4]);
        }

        for r in 0..16 {
            let i = (16 - r) % 4;
            let k = 4 * (r % 4) + r / 4;
            let (b, c, e) = (d[(i + 1) % 4], d[(i + 2) % 4], d[(i + 3) % 4]);
            d[i] = left_rotate(
                add(add(add(d[i], g(b, c, e)), x[k]), ROUND_2_CONSTANT),
                ROUND_2_SHIFTS[r % 4],
            );
        }

        for r in 0..16 {
            let i = (16 - r) % 4;
            let (b, c, e) = (d[(i + 1) % 4], d[(i + 2) % 4], d[(i + 3) % 4]);
            d[i] = left_rotate(
                add(add(add(d[i], h(b, c, e)), x[ROUND_3_ORDER[r]]), ROUND_3_CONSTANT),
                ROUND_3_SHIFTS[r % 4],
            );
        }

        for (register, increment) in state.iter_mut().zip(d) {
            *register = add(*register, increment);
        }
    }

    fn state_to_digest(state: &Self::State) -> Self::Digest {
        let mut digest = [0u8; MD4_SIZE];
        write_words(state, Endianness::Little, &mut digest);
        digest
    }

    fn state_from_digest(digest: &Self::Digest) -> Self::State {
        read_words(digest, Endianness::Little)
    }
}

fn f(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (!x & z)
}

fn g(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (x & z) | (y & z)
}

fn h(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}
