//! AES-128 in CFB8 feedback mode (spec.md §4.4).
//!
//! Key = IV = the 16-byte shared secret. Each direction owns its own 16-byte
//! feedback register. For each byte: encrypt the register under AES, XOR
//! with byte 0 of the result to get the output byte, then shift the
//! register left by one byte and append the *ciphertext* byte (true on both
//! the encrypt and decrypt side, which is what makes the mode symmetric
//! across directions when key == IV).
//!
//! Implemented directly atop the `aes` block cipher rather than the `cfb8`
//! crate: `cfb8`'s `AsyncStreamCipher::encrypt`/`decrypt` consume the cipher
//! by value for one call, but a connection's register must persist across
//! every packet written or read for the life of the socket.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;

struct Cfb8State {
    cipher: Aes128,
    register: [u8; 16],
}

impl Cfb8State {
    fn new(key: &[u8; 16], iv: &[u8; 16]) -> Self {
        Cfb8State {
            cipher: Aes128::new(GenericArray::from_slice(key)),
            register: *iv,
        }
    }

    fn keystream_byte(&self) -> u8 {
        let mut block = GenericArray::clone_from_slice(&self.register);
        self.cipher.encrypt_block(&mut block);
        block[0]
    }

    fn shift_in(&mut self, ciphertext_byte: u8) {
        self.register.copy_within(1.., 0);
        self.register[15] = ciphertext_byte;
    }
}

/// One direction's encrypt stream.
pub struct Cfb8Encryptor(Cfb8State);

impl Cfb8Encryptor {
    #[must_use]
    pub fn new(shared_secret: &[u8; 16]) -> Self {
        Cfb8Encryptor(Cfb8State::new(shared_secret, shared_secret))
    }

    /// Encrypts `buf` in place. Encrypting a buffer in one call produces the
    /// same bytes as encrypting it byte-by-byte (spec.md §8).
    pub fn encrypt(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            let plain = *byte;
            let cipher_byte = plain ^ self.0.keystream_byte();
            self.0.shift_in(cipher_byte);
            *byte = cipher_byte;
        }
    }
}

/// One direction's decrypt stream.
pub struct Cfb8Decryptor(Cfb8State);

impl Cfb8Decryptor {
    #[must_use]
    pub fn new(shared_secret: &[u8; 16]) -> Self {
        Cfb8Decryptor(Cfb8State::new(shared_secret, shared_secret))
    }

    pub fn decrypt(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            let cipher_byte = *byte;
            let plain = cipher_byte ^ self.0.keystream_byte();
            self.0.shift_in(cipher_byte);
            *byte = plain;
        }
    }
}
