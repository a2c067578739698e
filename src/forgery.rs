// Break a secret-prefix MAC using length extension.
//
// A SHA-1 or MD4 digest is the hasher's entire internal state after it has
// processed
//
//   key || message || glue-padding
//
// where the glue-padding is the padding the hasher appended to
// `key || message`. Loading the digest back into the registers lets us keep
// hashing as if we were that hasher, so for any suffix we can compute
//
//   H(key || message || glue-padding || suffix)
//
// without the key. The only thing we need to know is the key's length, as the
// glue-padding and the final length field depend on it, so we guess key
// lengths and ask the MAC checker which guess is right.
use crate::{pad, HashEngine, HashVariant};

use rayon::prelude::*;

use std::{
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};

pub const DEFAULT_MAX_KEY_LEN: u32 = 256;

/// A forged message and MAC for one guess of the key length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeryAttempt<V: HashVariant> {
    pub key_len: usize,
    pub glue_padding: Vec<u8>,
    pub message: Vec<u8>,
    pub mac: V::Digest,
}

impl<V: HashVariant> ForgeryAttempt<V> {
    /// Byte range of the glue-padding within `message`.
    pub fn glue_range(&self, known_message_len: usize) -> std::ops::Range<usize> {
        known_message_len..known_message_len + self.glue_padding.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForgeryEngine<V: HashVariant> {
    max_key_len: u32,
    _variant: PhantomData<V>,
}

impl<V: HashVariant> ForgeryEngine<V> {
    /// Guess key lengths in `0..max_key_len`.
    pub fn new(max_key_len: u32) -> Self {
        Self {
            max_key_len,
            _variant: PhantomData,
        }
    }

    pub fn max_key_len(&self) -> u32 {
        self.max_key_len
    }

    /// Build the forgery that is valid if the secret key is `key_len` bytes.
    pub fn attempt(
        &self,
        known_message: &[u8],
        known_mac: &V::Digest,
        suffix: &[u8],
        key_len: usize,
    ) -> ForgeryAttempt<V> {
        let prefix_len = (key_len + known_message.len()) as u64;
        let glue_padding = pad::<V>(prefix_len);
        let forged_len = prefix_len + glue_padding.len() as u64 + suffix.len() as u64;

        // Resume from the state the MAC-ing hasher was in after consuming
        //   key || known-message || glue-padding
        // and hash the suffix, with the final padding accounting for the
        // whole forged input.
        let mac = HashEngine::<V>::digest(
            suffix,
            Some(V::state_from_digest(known_mac)),
            Some(forged_len * 8),
        );
        let message = [known_message, glue_padding.as_slice(), suffix].concat();

        ForgeryAttempt {
            key_len,
            glue_padding,
            message,
            mac,
        }
    }

    /// Every candidate forgery, in order of increasing key length.
    pub fn attempts<'a>(
        &'a self,
        known_message: &'a [u8],
        known_mac: &'a V::Digest,
        suffix: &'a [u8],
    ) -> impl Iterator<Item = ForgeryAttempt<V>> + 'a {
        (0..self.max_key_len as usize)
            .map(move |key_len| self.attempt(known_message, known_mac, suffix, key_len))
    }

    /// Try each key length in turn, returning the first forgery `verify`
    /// accepts. `verify` stands in for the MAC checking service; the key is
    /// never needed.
    pub fn forge<F>(
        &self,
        known_message: &[u8],
        known_mac: &V::Digest,
        suffix: &[u8],
        verify: F,
    ) -> Option<ForgeryAttempt<V>>
    where
        F: Fn(&[u8], &V::Digest) -> bool,
    {
        let forgery = self
            .attempts(known_message, known_mac, suffix)
            .find(|attempt| verify(attempt.message.as_slice(), &attempt.mac));
        self.report(&forgery);
        forgery
    }

    /// As `forge`, but key length guesses are checked on the rayon thread
    /// pool. Once a guess is accepted, guesses for longer keys are skipped,
    /// and the shortest accepted key length is returned.
    pub fn par_forge<F>(
        &self,
        known_message: &[u8],
        known_mac: &V::Digest,
        suffix: &[u8],
        verify: F,
    ) -> Option<ForgeryAttempt<V>>
    where
        F: Fn(&[u8], &V::Digest) -> bool + Sync,
    {
        let found = AtomicUsize::new(usize::MAX);
        let forgery = (0..self.max_key_len as usize)
            .into_par_iter()
            .filter_map(|key_len| {
                if key_len > found.load(Ordering::Relaxed) {
                    return None;
                }
                let attempt = self.attempt(known_message, known_mac, suffix, key_len);
                if verify(attempt.message.as_slice(), &attempt.mac) {
                    found.fetch_min(key_len, Ordering::Relaxed);
                    Some(attempt)
                } else {
                    None
                }
            })
            .min_by_key(|attempt| attempt.key_len);
        self.report(&forgery);
        forgery
    }

    fn report(&self, forgery: &Option<ForgeryAttempt<V>>) {
        match forgery {
            Some(forgery) => tracing::info!(
                hash = V::NAME,
                key_len = forgery.key_len,
                mac = %hex::encode(forgery.mac),
                "length extension forgery accepted"
            ),
            None => tracing::debug!(
                hash = V::NAME,
                max_key_len = self.max_key_len,
                "no key length guess produced an accepted forgery"
            ),
        }
    }
}

impl<V: HashVariant> Default for ForgeryEngine<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEY_LEN)
    }
}

/// Forge a MAC for `known_message || glue-padding || suffix`, guessing key
/// lengths below `max_key_len`.
pub fn length_extension_attack<V, F>(
    known_message: &[u8],
    known_mac: &V::Digest,
    suffix: &[u8],
    max_key_len: u32,
    verify: F,
) -> Option<ForgeryAttempt<V>>
where
    V: HashVariant,
    F: Fn(&[u8], &V::Digest) -> bool,
{
    ForgeryEngine::<V>::new(max_key_len).forge(known_message, known_mac, suffix, verify)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{random_key, KeyedMacOracle, Md4, Sha1};

    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    use std::cell::Cell;

    const MESSAGE: &[u8] =
        b"comment1=cooking%20MCs;userdata=foo;comment2=%20like%20a%20pound%20of%20bacon";
    const SUFFIX: &[u8] = b";admin=true";

    fn forges_admin_message<V: HashVariant>(seed: u8) {
        let mut rng = StdRng::from_seed([seed; 32]);
        let oracle = KeyedMacOracle::<V>::new(random_key(&mut rng, 16));
        let mac = oracle.mac_message(MESSAGE);

        let forgery = ForgeryEngine::<V>::default()
            .forge(MESSAGE, &mac, SUFFIX, |m, t| oracle.check_mac(m, t.as_ref()))
            .unwrap();

        assert!(
            forgery
                .message
                .windows(SUFFIX.len())
                .any(|window| window == SUFFIX),
            "{}",
            String::from_utf8_lossy(&forgery.message)
        );
        assert!(forgery.message.starts_with(MESSAGE));
        assert!(forgery.message.ends_with(SUFFIX));
        assert_eq!(forgery.key_len, 16);
        assert!(oracle.check_mac(&forgery.message, forgery.mac.as_ref()));
    }

    #[test]
    fn keyed_sha1_mac_length_extension_attack_generates_mac_for_message() {
        forges_admin_message::<Sha1>(101);
    }

    #[test]
    fn keyed_md4_mac_length_extension_attack_generates_mac_for_message() {
        forges_admin_message::<Md4>(102);
    }

    fn forges_for_every_key_length<V: HashVariant>() {
        let mut rng = StdRng::from_seed([29; 32]);
        let engine = ForgeryEngine::<V>::new(256);
        for key_len in 0..256 {
            let key = random_key(&mut rng, key_len);
            let oracle = KeyedMacOracle::<V>::new(key);
            let mac = oracle.mac_message(MESSAGE);

            let forgery = engine
                .forge(MESSAGE, &mac, SUFFIX, |m, t| oracle.check_mac(m, t.as_ref()))
                .unwrap_or_else(|| panic!("no forgery for key length {key_len}"));

            assert_eq!(forgery.key_len, key_len);
            assert!(oracle.check_mac(&forgery.message, forgery.mac.as_ref()));
        }
    }

    #[test]
    fn sha1_forgery_succeeds_for_every_key_length_in_range() {
        forges_for_every_key_length::<Sha1>();
    }

    #[test]
    fn md4_forgery_succeeds_for_every_key_length_in_range() {
        forges_for_every_key_length::<Md4>();
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(40)]
    #[case(76)]
    #[case(100)]
    fn altering_a_byte_outside_glue_padding_breaks_the_mac(#[case] index: usize) {
        let oracle = KeyedMacOracle::<Sha1>::new(b"forwards".to_vec());
        let mac = oracle.mac_message(MESSAGE);
        let forgery = ForgeryEngine::<Sha1>::default()
            .forge(MESSAGE, &mac, SUFFIX, |m, t| oracle.check_mac(m, t.as_ref()))
            .unwrap();
        let glue = forgery.glue_range(MESSAGE.len());
        // Indices past the known message land in the suffix.
        let index = if index < MESSAGE.len() {
            index
        } else {
            glue.end + (index - MESSAGE.len()) % SUFFIX.len()
        };
        assert!(!glue.contains(&index));

        let mut tampered = forgery.message.clone();
        tampered[index] ^= 0x01;

        assert!(oracle.check_mac(&forgery.message, forgery.mac.as_ref()));
        assert!(!oracle.check_mac(&tampered, &forgery.mac));
    }

    #[test]
    fn zero_key_length_guesses_attempts_nothing() {
        let calls = Cell::new(0);
        let mac = HashEngine::<Md4>::digest_message(MESSAGE);

        let forgery = ForgeryEngine::<Md4>::new(0).forge(MESSAGE, &mac, SUFFIX, |_, _| {
            calls.set(calls.get() + 1);
            true
        });

        assert!(forgery.is_none());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn key_longer_than_guess_range_is_not_found() {
        let oracle = KeyedMacOracle::<Sha1>::new(b"0".repeat(40));
        let mac = oracle.mac_message(MESSAGE);

        let forgery = length_extension_attack::<Sha1, _>(MESSAGE, &mac, SUFFIX, 40, |m, t| {
            oracle.check_mac(m, t.as_ref())
        });

        assert!(forgery.is_none());
    }

    #[test]
    fn first_accepted_guess_wins() {
        let mac = HashEngine::<Sha1>::digest_message(MESSAGE);
        let engine = ForgeryEngine::<Sha1>::default();

        let sequential = engine.forge(MESSAGE, &mac, SUFFIX, |_, _| true).unwrap();
        let parallel = engine.par_forge(MESSAGE, &mac, SUFFIX, |_, _| true).unwrap();

        assert_eq!(sequential.key_len, 0);
        assert_eq!(parallel.key_len, 0);
    }

    #[rstest]
    #[case(0)]
    #[case(13)]
    #[case(64)]
    #[case(255)]
    fn par_forge_agrees_with_forge(#[case] key_len: usize) {
        let oracle = KeyedMacOracle::<Md4>::new(vec![0xA5; key_len]);
        let mac = oracle.mac_message(MESSAGE);
        let engine = ForgeryEngine::<Md4>::default();
        let verify = |m: &[u8], t: &[u8; 16]| oracle.check_mac(m, t);

        let sequential = engine.forge(MESSAGE, &mac, SUFFIX, verify).unwrap();
        let parallel = engine.par_forge(MESSAGE, &mac, SUFFIX, verify).unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.key_len, key_len);
    }

    #[test]
    fn glue_padding_differs_between_guesses() {
        let mac = HashEngine::<Sha1>::digest_message(MESSAGE);
        let engine = ForgeryEngine::<Sha1>::new(64);

        let attempts: Vec<_> = engine.attempts(MESSAGE, &mac, SUFFIX).collect();

        assert_eq!(attempts.len(), 64);
        for pair in attempts.windows(2) {
            assert_ne!(pair[0].glue_padding, pair[1].glue_padding);
            assert_ne!(pair[0].message, pair[1].message);
        }
    }

    #[test]
    fn forged_mac_depends_only_on_padded_prefix_length() {
        let mac = HashEngine::<Sha1>::digest_message(MESSAGE);
        let engine = ForgeryEngine::<Sha1>::new(130);
        let padded_prefix_len =
            |a: &ForgeryAttempt<Sha1>| a.key_len + MESSAGE.len() + a.glue_padding.len();

        let attempts: Vec<_> = engine.attempts(MESSAGE, &mac, SUFFIX).collect();

        // Guesses whose key || message || glue ends on the same block
        // boundary resume from the same state over the same length.
        let mut shared_boundary = 0;
        for pair in attempts.windows(2) {
            let same_len = padded_prefix_len(&pair[0]) == padded_prefix_len(&pair[1]);
            assert_eq!(same_len, pair[0].mac == pair[1].mac, "key length {}", pair[0].key_len);
            if same_len {
                shared_boundary += 1;
            }
        }
        assert!(shared_boundary > 0);
    }
}
