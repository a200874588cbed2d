//! Cryptographic checks on a license.
//!
//! A check that cannot be evaluated because the license lacks a field or
//! carries malformed key material is a failure of the license, not an
//! error of the harness.

use lcpt_crypto::Certificate;
use lcpt_model::{License, LicenseError};

use crate::report::Outcome;

/// Required length of the decoded content key.
pub const CONTENT_KEY_LEN: usize = 64;

/// The provider certificate chains to `ca` and was valid at `issued`.
pub fn certificate(license: &License, ca: &Certificate) -> Outcome {
    verdict(license.check_certificate(ca), || {
        "provider certificate is not signed by the CA or was not valid when the license was issued"
            .to_string()
    })
}

/// The signature verifies over the canonical form.
pub fn signature(license: &License) -> Outcome {
    verdict(license.check_signature(), || {
        "signature does not verify over the canonical license".to_string()
    })
}

/// The content key decodes to 64 bytes.
pub fn content_key_length(license: &License) -> Outcome {
    match license.content_key() {
        Ok(key) => Outcome::check(key.len() == CONTENT_KEY_LEN, || {
            format!(
                "content key is {} bytes, expected {CONTENT_KEY_LEN}",
                key.len()
            )
        }),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

/// The key check decrypts to the license id under the passphrase.
pub fn key_check(license: &License, passphrase: Option<&str>) -> Outcome {
    let Some(passphrase) = passphrase else {
        return Outcome::error("no passphrase configured for this license");
    };
    verdict(license.check_user_key(passphrase), || {
        "key check does not decrypt to the license id with the configured passphrase".to_string()
    })
}

fn verdict(result: Result<bool, LicenseError>, message: impl FnOnce() -> String) -> Outcome {
    match result {
        Ok(ok) => Outcome::check(ok, message),
        Err(e) => Outcome::fail(e.to_string()),
    }
}
