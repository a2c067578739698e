// Merkle-Damgard padding shared by SHA-1 and MD4:
//
//   0x80 || 0x00 * n || bit-length
//
// where n is the smallest count that leaves the message 8 bytes short of a
// block boundary, and the 64-bit bit-length is written in the variant's
// byte order (big-endian for SHA-1, little-endian for MD4, which is the same
// as the low 32-bit word first with each word little-endian).
use crate::word::Endianness;
use crate::{HashVariant, BLOCK_SIZE};

const LENGTH_FIELD_SIZE: usize = 8;

/// The padding the hash appends to a message of `message_len` bytes.
pub fn pad<V: HashVariant>(message_len: u64) -> Vec<u8> {
    pad_with_bit_len::<V>(message_len, message_len.wrapping_mul(8))
}

/// Padding laid out for a message of `message_len` bytes, but with `bit_len`
/// written into the length field.
pub fn pad_with_bit_len<V: HashVariant>(message_len: u64, bit_len: u64) -> Vec<u8> {
    let zero_fill = zero_fill_len(message_len);
    let mut padding = Vec::with_capacity(1 + zero_fill + LENGTH_FIELD_SIZE);
    padding.push(0x80);
    padding.resize(1 + zero_fill, 0x00);
    match V::ENDIANNESS {
        Endianness::Big => padding.extend_from_slice(&bit_len.to_be_bytes()),
        Endianness::Little => padding.extend_from_slice(&bit_len.to_le_bytes()),
    }
    padding
}

fn zero_fill_len(message_len: u64) -> usize {
    let used = (message_len % BLOCK_SIZE as u64) as usize + 1 + LENGTH_FIELD_SIZE;
    (BLOCK_SIZE - used % BLOCK_SIZE) % BLOCK_SIZE
}
