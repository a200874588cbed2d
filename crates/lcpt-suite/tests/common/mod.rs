//! Shared fixtures for suite integration tests: a throwaway CA and
//! provider, signed licenses, permissive schemas, and a configuration file
//! in a temporary directory.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::PathBuf;

use lcpt_core::{mime, CanonicalBytes};
use lcpt_crypto::{encode_base64, encrypt, hash, CipherAlgorithm, HashAlgorithm};
use lcpt_publication::{ENCRYPTION_ENTRY, LICENSE_ENTRY};
use lcpt_suite::{Harness, SuiteConfig};
use p256::ecdsa::signature::Signer;
use p256::pkcs8::DecodePrivateKey;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use serde_json::{json, Value};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PASSPHRASE: &str = "open sesame";
pub const LICENSE_ID: &str = "3c7a7b0e-5c1c-4bde-9a8b-0a7b2c1d9e01";

/// A CA and a provider certificate it signed.
pub struct Issuer {
    ca_pem: String,
    key: KeyPair,
    cert: rcgen::Certificate,
}

impl Issuer {
    pub fn new() -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.distinguished_name.push(DnType::CommonName, "Suite Test Root");
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();

        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, "Suite Test Provider");
        params.not_before = rcgen::date_time_ymd(2015, 1, 1);
        params.not_after = rcgen::date_time_ymd(2035, 1, 1);
        let cert = params.signed_by(&key, &ca_cert, &ca_key).unwrap();

        Self {
            ca_pem: ca_cert.pem(),
            key,
            cert,
        }
    }

    /// A signed license whose status link is `status_href`.
    pub fn license(&self, status_href: &str, rights: Value) -> Value {
        self.license_with_hint(status_href, "https://provider.example/hint", rights)
    }

    /// A signed license with its hint page at `hint_href`.
    pub fn license_with_hint(&self, status_href: &str, hint_href: &str, rights: Value) -> Value {
        let user_key = hash(PASSPHRASE, HashAlgorithm::SHA256_URI).unwrap();
        let key_check = encrypt(
            LICENSE_ID.as_bytes(),
            user_key.as_bytes(),
            &[1u8; 16],
            CipherAlgorithm::AES256_CBC_URI,
        )
        .unwrap();
        let content_key = encrypt(
            &[9u8; 32],
            user_key.as_bytes(),
            &[2u8; 16],
            CipherAlgorithm::AES256_CBC_URI,
        )
        .unwrap();

        let mut license = json!({
            "id": LICENSE_ID,
            "issued": "2018-03-01T08:30:00Z",
            "provider": "https://provider.example",
            "encryption": {
                "profile": "http://readium.org/lcp/basic-profile",
                "content_key": {
                    "algorithm": CipherAlgorithm::AES256_CBC_URI,
                    "encrypted_value": encode_base64(&content_key)
                },
                "user_key": {
                    "algorithm": HashAlgorithm::SHA256_URI,
                    "text_hint": "the magic words",
                    "key_check": encode_base64(&key_check)
                }
            },
            "links": [
                {"rel": "hint", "href": hint_href},
                {"rel": "publication", "href": "https://provider.example/book.epub", "type": mime::PUBLICATION},
                {"rel": "status", "href": status_href, "type": mime::STATUS}
            ],
            "rights": rights
        });

        let canonical = CanonicalBytes::for_signature(&license).unwrap();
        let signer = p256::ecdsa::SigningKey::from_pkcs8_der(&self.key.serialize_der()).unwrap();
        let signature: p256::ecdsa::Signature = signer.sign(canonical.as_bytes());
        license["signature"] = json!({
            "algorithm": "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            "certificate": encode_base64(self.cert.der()),
            "value": encode_base64(&signature.to_bytes())
        });
        license
    }
}

/// A loan window long past.
pub fn past_loan() -> Value {
    json!({"start": "2018-03-01T08:30:00Z", "end": "2018-04-01T08:30:00Z"})
}

/// A status document served under `{base}/licenses/1`.
pub fn status_json(base: &str, status: &str, updated: &str, events: Vec<Value>) -> Value {
    json!({
        "id": LICENSE_ID,
        "status": status,
        "message": "status message",
        "updated": {"license": "2018-03-01T08:30:00Z", "status": updated},
        "events": events,
        "links": [
            {"rel": "license", "href": format!("{base}/licenses/1"), "type": mime::LICENSE},
            {"rel": "register", "href": format!("{base}/licenses/1/register{{?id,name}}"), "type": mime::STATUS, "templated": true},
            {"rel": "renew", "href": format!("{base}/licenses/1/renew{{?end,id,name}}"), "type": mime::STATUS, "templated": true},
            {"rel": "return", "href": format!("{base}/licenses/1/return{{?id,name}}"), "type": mime::STATUS, "templated": true}
        ]
    })
}

pub fn event(event_type: &str, id: &str, name: &str) -> Value {
    json!({"type": event_type, "timestamp": "2018-03-02T08:30:00Z", "id": id, "name": name})
}

const ENCRYPTION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container"
            xmlns:enc="http://www.w3.org/2001/04/xmlenc#"
            xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
  <enc:EncryptedData>
    <enc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes256-cbc"/>
    <ds:KeyInfo>
      <ds:RetrievalMethod URI="license.lcpl#/encryption/content_key"
                          Type="http://readium.org/2014/01/lcp#EncryptedContentKey"/>
    </ds:KeyInfo>
    <enc:CipherData>
      <enc:CipherReference URI="OEBPS/chapter-1.xhtml"/>
    </enc:CipherData>
  </enc:EncryptedData>
</encryption>"#;

/// A protected EPUB carrying `license`.
pub fn protected_epub(license: &Value) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(b"<container/>").unwrap();
    zip.start_file(ENCRYPTION_ENTRY, deflated).unwrap();
    zip.write_all(ENCRYPTION_XML.as_bytes()).unwrap();
    zip.start_file(LICENSE_ENTRY, deflated).unwrap();
    zip.write_all(license.to_string().as_bytes()).unwrap();
    zip.start_file("OEBPS/chapter-1.xhtml", stored).unwrap();
    zip.write_all(&[0u8; 48]).unwrap();
    zip.finish().unwrap().into_inner()
}

/// The record the encryption tool writes for content `c-42`.
pub fn content_record() -> Value {
    json!({
        "content-id": "c-42",
        "content-encryption-key": "a2V5a2V5a2V5",
        "protected-content-location": "/srv/repo/c-42.epub",
        "protected-content-length": 4096,
        "protected-content-sha256": "00ff",
        "protected-content-disposition": "book.epub"
    })
}

/// A configuration directory with schemas, the CA certificate and
/// license fixtures.
pub struct Workspace {
    pub dir: TempDir,
    fixtures: Vec<String>,
    lcp_server: Option<String>,
}

impl Workspace {
    pub fn new(issuer: &Issuer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        std::fs::create_dir(&schemas).unwrap();
        std::fs::write(
            schemas.join("license.schema.json"),
            r#"{"type": "object", "required": ["id", "issued", "provider", "encryption", "links", "signature"]}"#,
        )
        .unwrap();
        std::fs::write(
            schemas.join("status.schema.json"),
            r#"{"type": "object", "required": ["id", "status", "updated", "links"]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("cacert.pem"), &issuer.ca_pem).unwrap();
        Self {
            dir,
            fixtures: Vec::new(),
            lcp_server: None,
        }
    }

    /// Point `lcp_server` at `base_uri`.
    pub fn set_lcp_server(&mut self, base_uri: &str) {
        self.lcp_server = Some(base_uri.to_string());
    }

    /// Write `epub` as fixture `key`, with the test passphrase.
    pub fn add_epub(&mut self, key: &str, epub: &[u8]) -> PathBuf {
        let path = self.dir.path().join(format!("{key}.epub"));
        std::fs::write(&path, epub).unwrap();
        self.fixtures.push(format!(
            "  {key}: {{ epub: {key}.epub, passphrase: \"{PASSPHRASE}\" }}"
        ));
        path
    }

    /// Write `record` as content fixture `key`, with the test passphrase.
    pub fn add_content(&mut self, key: &str, record: &Value) -> PathBuf {
        let path = self.dir.path().join(format!("{key}.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(record).unwrap()).unwrap();
        self.fixtures.push(format!(
            "  {key}: {{ content: {key}.json, passphrase: \"{PASSPHRASE}\", text_hint: \"the magic words\" }}"
        ));
        path
    }

    /// Write `license` as fixture `key`, with the test passphrase.
    pub fn add_license(&mut self, key: &str, license: &Value) -> PathBuf {
        let path = self.dir.path().join(format!("{key}.lcpl"));
        std::fs::write(&path, serde_json::to_vec_pretty(license).unwrap()).unwrap();
        self.fixtures.push(format!(
            "  {key}: {{ license: {key}.lcpl, passphrase: \"{PASSPHRASE}\" }}"
        ));
        path
    }

    pub fn config_path(&self) -> PathBuf {
        let path = self.dir.path().join("conformance.yaml");
        let mut text = String::from(
            "common:\n  license: { schema: schemas/license.schema.json }\n  status: { schema: schemas/status.schema.json }\n  crypto: { cacert: cacert.pem }\nhttp: { timeout_secs: 5, retries: 0 }\n",
        );
        if let Some(base_uri) = &self.lcp_server {
            text.push_str(&format!("lcp_server: {{ base_uri: \"{base_uri}\" }}\n"));
        }
        text.push_str(if self.fixtures.is_empty() { "data: {}\n" } else { "data:\n" });
        for line in &self.fixtures {
            text.push_str(line);
            text.push('\n');
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    pub fn harness(&self) -> Harness {
        let config = SuiteConfig::load(self.config_path()).unwrap();
        Harness::new(config).unwrap()
    }
}
