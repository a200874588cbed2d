//! # End-to-end License Crypto
//!
//! Builds a throwaway PKI (root CA, provider certificate), issues a license
//! document signed by the provider, and runs every check a conformance run
//! performs on it: certificate chain at `issued`, signature over the
//! canonical bytes, key check, content key decryption.

use lcpt_core::{CanonicalBytes, Timestamp};
use lcpt_crypto::{
    check_user_key, decode_base64, decrypt, encode_base64, encrypt, hash, verify_certificate,
    verify_signature, Certificate, CipherAlgorithm, HashAlgorithm, SignatureAlgorithm,
};
use p256::ecdsa::signature::Signer;
use p256::pkcs8::DecodePrivateKey;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use serde_json::{json, Value};

const LICENSE_ID: &str = "ef15e740-697f-11e3-949a-0800200c9a66";
const PASSPHRASE: &str = "correct horse battery staple";

struct Issued {
    ca: Certificate,
    license: Value,
}

fn issue_license() -> Issued {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.distinguished_name.push(DnType::CommonName, "LCP Test Root");
    let ca_cert = ca_params.self_signed(&ca_key).unwrap();

    let provider_key = KeyPair::generate().unwrap();
    let mut provider_params = CertificateParams::new(Vec::<String>::new()).unwrap();
    provider_params.distinguished_name.push(DnType::CommonName, "LCP Test Provider");
    provider_params.not_before = rcgen::date_time_ymd(2016, 1, 1);
    provider_params.not_after = rcgen::date_time_ymd(2030, 1, 1);
    let provider_cert = provider_params.signed_by(&provider_key, &ca_cert, &ca_key).unwrap();

    let user_key = hash(PASSPHRASE, HashAlgorithm::SHA256_URI).unwrap();
    let key_check = encrypt(
        LICENSE_ID.as_bytes(),
        user_key.as_bytes(),
        &[7u8; 16],
        CipherAlgorithm::AES256_CBC_URI,
    )
    .unwrap();
    let content_key = encrypt(
        &[0x42u8; 32],
        user_key.as_bytes(),
        &[3u8; 16],
        CipherAlgorithm::AES256_CBC_URI,
    )
    .unwrap();

    let mut license = json!({
        "id": LICENSE_ID,
        "issued": "2017-09-01T10:00:00+02:00",
        "provider": "https://provider.example",
        "encryption": {
            "profile": "http://readium.org/lcp/basic-profile",
            "content_key": {
                "algorithm": CipherAlgorithm::AES256_CBC_URI,
                "encrypted_value": encode_base64(&content_key)
            },
            "user_key": {
                "algorithm": HashAlgorithm::SHA256_URI,
                "text_hint": "the usual",
                "key_check": encode_base64(&key_check)
            }
        },
        "rights": {"print": 10, "copy": 2048}
    });

    let canonical = CanonicalBytes::for_signature(&license).unwrap();
    let signer = p256::ecdsa::SigningKey::from_pkcs8_der(&provider_key.serialize_der()).unwrap();
    let signature: p256::ecdsa::Signature = signer.sign(canonical.as_bytes());
    license["signature"] = json!({
        "algorithm": SignatureAlgorithm::ECDSA_SHA256_URI,
        "certificate": encode_base64(provider_cert.der()),
        "value": encode_base64(&signature.to_bytes())
    });

    Issued {
        ca: Certificate::from_pem(&ca_cert.pem()).unwrap(),
        license,
    }
}

fn field<'a>(doc: &'a Value, path: &[&str]) -> &'a str {
    path.iter()
        .fold(doc, |v, k| &v[*k])
        .as_str()
        .unwrap_or_else(|| panic!("missing {}", path.join(".")))
}

#[test]
fn test_provider_certificate_chains_at_issued() {
    let issued = issue_license();
    let cert = Certificate::parse(field(&issued.license, &["signature", "certificate"])).unwrap();
    let at = Timestamp::parse(field(&issued.license, &["issued"])).unwrap();
    assert!(verify_certificate(&cert, &issued.ca, at).unwrap());

    let long_before = Timestamp::parse("2010-01-01T00:00:00Z").unwrap();
    assert!(!verify_certificate(&cert, &issued.ca, long_before).unwrap());
}

#[test]
fn test_signature_covers_everything_but_itself() {
    let issued = issue_license();
    let cert = Certificate::parse(field(&issued.license, &["signature", "certificate"])).unwrap();
    let value = field(&issued.license, &["signature", "value"]);
    let algorithm = field(&issued.license, &["signature", "algorithm"]);

    let canonical = CanonicalBytes::for_signature(&issued.license).unwrap();
    assert!(verify_signature(value, &cert, &canonical, algorithm).unwrap());

    let mut tampered = issued.license.clone();
    tampered["rights"]["print"] = json!(11);
    let canonical = CanonicalBytes::for_signature(&tampered).unwrap();
    assert!(!verify_signature(value, &cert, &canonical, algorithm).unwrap());
}

#[test]
fn test_signature_stable_under_reserialization() {
    let issued = issue_license();
    let cert = Certificate::parse(field(&issued.license, &["signature", "certificate"])).unwrap();
    let value = field(&issued.license, &["signature", "value"]);
    let algorithm = field(&issued.license, &["signature", "algorithm"]);

    let pretty = serde_json::to_string_pretty(&issued.license).unwrap();
    let reparsed: Value = serde_json::from_str(&pretty).unwrap();
    let canonical = CanonicalBytes::for_signature(&reparsed).unwrap();
    assert!(verify_signature(value, &cert, &canonical, algorithm).unwrap());
}

#[test]
fn test_key_check_and_content_key() {
    let issued = issue_license();
    let doc = &issued.license;
    let key_check = decode_base64(
        "key_check",
        field(doc, &["encryption", "user_key", "key_check"]),
    )
    .unwrap();
    assert_eq!(key_check.len(), 64);
    assert!(check_user_key(
        PASSPHRASE,
        field(doc, &["encryption", "user_key", "algorithm"]),
        &key_check,
        field(doc, &["id"]),
        field(doc, &["encryption", "content_key", "algorithm"]),
    )
    .unwrap());
    assert!(!check_user_key(
        "wrong",
        HashAlgorithm::SHA256_URI,
        &key_check,
        LICENSE_ID,
        CipherAlgorithm::AES256_CBC_URI,
    )
    .unwrap());

    let content_key = decode_base64(
        "encrypted_value",
        field(doc, &["encryption", "content_key", "encrypted_value"]),
    )
    .unwrap();
    assert_eq!(content_key.len(), 64);
    let user_key = hash(PASSPHRASE, HashAlgorithm::SHA256_URI).unwrap();
    let clear = decrypt(&content_key, user_key.as_bytes(), CipherAlgorithm::AES256_CBC_URI).unwrap();
    assert_eq!(clear, vec![0x42u8; 32]);
}
