// Secret-prefix MAC: MAC(key, message) = H(key || message)
use crate::{Algorithm, HashEngine, HashVariant, Md4, Sha1};

use rand::RngCore;

use std::marker::PhantomData;

pub fn authenticate_message<V: HashVariant>(key: &[u8], message: &[u8]) -> V::Digest {
    let mut engine = HashEngine::<V>::new();
    engine.update(key);
    engine.update_and_finalize(message)
}

/// Recompute the MAC and compare. The comparison is not constant time.
pub fn verify_message<V: HashVariant>(key: &[u8], message: &[u8], mac: &[u8]) -> bool {
    authenticate_message::<V>(key, message).as_ref() == mac
}

/// Draw a secret key from the caller's random number generator.
pub fn random_key<R: RngCore>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut key = vec![0u8; len];
    rng.fill_bytes(&mut key);
    key
}

/// Holds a secret key and issues/checks MACs under it, standing in for a
/// service the attacker can query but not inspect.
#[derive(Debug, Clone)]
pub struct KeyedMacOracle<V: HashVariant> {
    key: Vec<u8>,
    _variant: PhantomData<V>,
}

impl<V: HashVariant> KeyedMacOracle<V> {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key,
            _variant: PhantomData,
        }
    }

    pub fn mac_message(&self, message: &[u8]) -> V::Digest {
        authenticate_message::<V>(&self.key, message)
    }

    pub fn check_mac(&self, message: &[u8], mac: &[u8]) -> bool {
        verify_message::<V>(&self.key, message, mac)
    }
}

impl Algorithm {
    pub fn authenticate_message(self, key: &[u8], message: &[u8]) -> Vec<u8> {
        match self {
            Algorithm::Sha1 => authenticate_message::<Sha1>(key, message).to_vec(),
            Algorithm::Md4 => authenticate_message::<Md4>(key, message).to_vec(),
        }
    }

    pub fn verify_message(self, key: &[u8], message: &[u8], mac: &[u8]) -> bool {
        match self {
            Algorithm::Sha1 => verify_message::<Sha1>(key, message, mac),
            Algorithm::Md4 => verify_message::<Md4>(key, message, mac),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn mac_is_hash_of_key_then_message() {
        let key = b"YELLOW SUBMARINE";
        let message = b"My posse's to the side yellin', Go Vanilla Go!";

        assert_eq!(
            hex::encode(authenticate_message::<Sha1>(key, message)),
            "1715b7c4b8ac30bc720ce5f533f837781491afd8"
        );
        assert_eq!(
            hex::encode(authenticate_message::<Md4>(key, message)),
            "267964b1ba17231d0620ba80e9d9f4f8"
        );
    }

    #[test]
    fn verify_rejects_wrong_key_and_tampered_message() {
        let key = b"YELLOW SUBMARINE";
        let message = b"My posse's to the side yellin', Go Vanilla Go!";
        let mac = authenticate_message::<Sha1>(key, message);

        assert!(verify_message::<Sha1>(key, message, &mac));
        assert!(!verify_message::<Sha1>(b"ORANGE SUBMARINE", message, &mac));
        assert!(!verify_message::<Sha1>(
            key,
            b"My posse's to the side yellin', Stop Vanilla Stop!",
            &mac
        ));
    }

    #[test]
    fn verify_rejects_truncated_mac() {
        let key = b"key";
        let mac = authenticate_message::<Md4>(key, b"message");

        assert!(!verify_message::<Md4>(key, b"message", &mac[..15]));
    }

    #[test]
    fn oracle_checks_its_own_macs() {
        let mut rng = StdRng::from_seed([101; 32]);
        let oracle = KeyedMacOracle::<Md4>::new(random_key(&mut rng, 16));

        let mac = oracle.mac_message(b"comment1=cooking%20MCs");

        assert!(oracle.check_mac(b"comment1=cooking%20MCs", &mac));
        assert!(!oracle.check_mac(b"comment1=cooking%20MCz", &mac));
    }

    #[test]
    fn random_key_is_reproducible_from_seed() {
        let key_1 = random_key(&mut StdRng::from_seed([7; 32]), 16);
        let key_2 = random_key(&mut StdRng::from_seed([7; 32]), 16);
        let key_3 = random_key(&mut StdRng::from_seed([8; 32]), 16);

        assert_eq!(key_1.len(), 16);
        assert_eq!(key_1, key_2);
        assert_ne!(key_1, key_3);
    }

    #[test]
    fn algorithm_macs_match_typed_macs() {
        let key = b"key";
        let message = b"message";

        assert_eq!(
            Algorithm::Sha1.authenticate_message(key, message),
            authenticate_message::<Sha1>(key, message).to_vec()
        );
        assert!(Algorithm::Md4.verify_message(
            key,
            message,
            &authenticate_message::<Md4>(key, message)
        ));
        assert!(!Algorithm::Sha1.verify_message(
            key,
            message,
            &authenticate_message::<Md4>(key, message)
        ));
    }
}
