//! Online-mode RSA keypair, the Minecraft session hash, and offline-mode
//! UUID derivation (spec.md §4.9, §6.3, §6.4).

use num_bigint::BigInt;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use uuid::Uuid;

/// The server's RSA keypair, generated fresh at startup (spec.md §4.9).
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    public_der: Vec<u8>,
}

impl KeyPair {
    pub fn generate() -> rsa::Result<KeyPair> {
        let mut rng = rand::rngs::OsRng;
        let private = RsaPrivateKey::new(&mut rng, 1024)?;
        let public = RsaPublicKey::from(&private);
        let public_der = public
            .to_public_key_der()
            .expect("DER-encoding a freshly generated RSA public key cannot fail")
            .as_bytes()
            .to_vec();
        Ok(KeyPair {
            private,
            public,
            public_der,
        })
    }

    /// The server's public key in X.509 SubjectPublicKeyInfo DER form, as
    /// sent in `EncryptionRequest`.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    /// Decrypts an RSA-PKCS#1-v1.5-encrypted blob (the shared secret or the
    /// verify token) from `EncryptionResponse`.
    pub fn decrypt(&self, ciphertext: &[u8]) -> rsa::Result<Vec<u8>> {
        self.private.decrypt(Pkcs1v15Encrypt, ciphertext)
    }

    #[cfg(test)]
    #[must_use]
    pub fn public(&self) -> &RsaPublicKey {
        &self.public
    }
}

/// SHA-1 over `server_id || shared_secret || public_key_der`, reinterpreted
/// as a signed 160-bit two's-complement integer and rendered in lowercase
/// hex with no leading zeros, `-` prefixed when negative (spec.md §6.3).
#[must_use]
pub fn compute_session_hash(server_id: &str, shared_secret: &[u8], public_key_der: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(server_id.as_bytes());
    hasher.update(shared_secret);
    hasher.update(public_key_der);
    let digest = hasher.finalize();

    let value = BigInt::from_signed_bytes_be(&digest);
    value.to_str_radix(16)
}

/// Derives the UUID for offline-mode (non-verified) logins:
/// `MD5("OfflinePlayer:" + username)` with the version nibble forced to 3
/// and the variant nibble forced to `0b10xx` (spec.md §4.9).
#[must_use]
pub fn offline_uuid(username: &str) -> Uuid {
    let digest = md5::compute(format!("OfflinePlayer:{username}"));
    let mut bytes = *digest;
    bytes[6] = (bytes[6] & 0x0f) | 0x30;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}
