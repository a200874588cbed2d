//! # lcpt-crypto — Crypto Verifier
//!
//! The cryptographic checks a conformance run performs on a license:
//!
//! - **Passphrase hashing**: the user key is the SHA-256 digest of the
//!   UTF-8 passphrase ([`hash`]).
//! - **Key check**: `encryption.user_key.key_check` decrypts under the user
//!   key to exactly the license id ([`check_user_key`]).
//! - **AES-256-CBC** decryption with the IV prepended to the ciphertext
//!   ([`decrypt`]).
//! - **Provider certificate**: signed by the configured CA and valid at the
//!   license's `issued` instant ([`verify_certificate`]).
//! - **License signature**: RSA or ECDSA P-256 with SHA-256 over the
//!   canonical license bytes ([`verify_signature`]).
//!
//! ## Crate Policy
//!
//! - Every operation is a pure function of its inputs: no configuration, no
//!   clock, no IO except [`Certificate::from_path`].
//! - A signature or certificate that does not verify yields `Ok(false)`.
//!   `Err` is reserved for unsupported algorithm identifiers and malformed
//!   key material.
//! - No mocking of cryptographic operations in tests; certificates are
//!   generated with `rcgen` and verified for real.

pub mod algorithm;
pub mod certificate;
pub mod cipher;
pub mod encoding;
pub mod passphrase;
pub mod signature;

pub use algorithm::{CipherAlgorithm, HashAlgorithm, SignatureAlgorithm};
pub use certificate::{verify_certificate, Certificate};
pub use cipher::{decrypt, encrypt};
pub use encoding::{decode_base64, encode_base64};
pub use passphrase::{check_user_key, hash, UserKey};
pub use signature::verify_signature;
