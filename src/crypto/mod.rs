//! Online-mode key exchange, session verification, and the AES-CFB8 stream
//! cipher (spec.md §4.4, §4.9, §6.3).

pub mod cipher;
pub mod session;

pub use cipher::{Cfb8Decryptor, Cfb8Encryptor};
pub use session::{compute_session_hash, offline_uuid, KeyPair};
