// 32-bit word helpers shared by the SHA-1 and MD4 compression functions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

/// Addition modulo 2^32.
#[inline]
pub fn add(a: u32, b: u32) -> u32 {
    a.wrapping_add(b)
}

#[inline]
pub fn left_rotate(word: u32, n: u32) -> u32 {
    word.rotate_left(n)
}

/// Read `N` words from the front of `bytes`, which must hold at least
/// `4 * N` bytes.
pub fn read_words<const N: usize>(bytes: &[u8], endianness: Endianness) -> [u32; N] {
    debug_assert!(bytes.len() >= 4 * N);
    std::array::from_fn(|i| word_at(bytes, i, endianness))
}

/// Load the sixteen message words of a 64 byte block.
pub fn block_words(block: &[u8], endianness: Endianness) -> [u32; 16] {
    read_words(block, endianness)
}

fn word_at(bytes: &[u8], i: usize, endianness: Endianness) -> u32 {
    let word = [
        bytes[4 * i],
        bytes[4 * i + 1],
        bytes[4 * i + 2],
        bytes[4 * i + 3],
    ];
    match endianness {
        Endianness::Big => u32::from_be_bytes(word),
        Endianness::Little => u32::from_le_bytes(word),
    }
}

/// Serialise registers in register order into `out`, each word in the given
/// byte order. `out` must hold exactly `4 * words.len()` bytes.
pub fn write_words(words: &[u32], endianness: Endianness, out: &mut [u8]) {
    debug_assert_eq!(out.len(), 4 * words.len());
    for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
        let bytes = match endianness {
            Endianness::Big => word.to_be_bytes(),
            Endianness::Little => word.to_le_bytes(),
        };
        chunk.copy_from_slice(&bytes);
    }
}
