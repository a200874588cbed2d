//! # `encryption.xml`
//!
//! Parsed with `roxmltree`; elements are matched by namespace and local
//! name so that prefixes chosen by the packager do not matter.
//!
//! ## Structural rules
//!
//! For each `enc:EncryptedData`:
//!
//! - `enc:EncryptionMethod/@Algorithm` is AES-256-CBC;
//! - `ds:KeyInfo/ds:RetrievalMethod` exists, with
//!   `URI="license.lcpl#/encryption/content_key"` and
//!   `Type="http://readium.org/2014/01/lcp#EncryptedContentKey"`;
//! - `enc:CipherData/enc:CipherReference/@URI` exists.

use std::fmt;

use lcpt_core::ParseError;
use roxmltree::{Document, Node};

/// OCF container namespace (root element).
pub const CONTAINER_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
/// XML Encryption namespace.
pub const XMLENC_NS: &str = "http://www.w3.org/2001/04/xmlenc#";
/// XML Signature namespace (`KeyInfo`).
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
/// EPUB compression property namespace.
pub const COMPRESSION_NS: &str = "http://www.idpf.org/2016/encryption#compression";

/// The only content cipher of the basic and 1.0 profiles.
pub const AES256_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";
/// Where the content key lives.
pub const CONTENT_KEY_URI: &str = "license.lcpl#/encryption/content_key";
/// Type of the retrieval target.
pub const CONTENT_KEY_TYPE: &str = "http://readium.org/2014/01/lcp#EncryptedContentKey";

/// One `EncryptedData` element, reduced to what the rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedData {
    /// `EncryptionMethod/@Algorithm`.
    pub algorithm: Option<String>,
    /// Whether `KeyInfo/RetrievalMethod` is present.
    pub has_retrieval_method: bool,
    /// `RetrievalMethod/@URI`.
    pub retrieval_uri: Option<String>,
    /// `RetrievalMethod/@Type`.
    pub retrieval_type: Option<String>,
    /// `CipherData/CipherReference/@URI`.
    pub cipher_reference: Option<String>,
    /// `Compression/@Method`, from the encryption properties.
    pub compression_method: Option<String>,
}

impl EncryptedData {
    /// Whether the resource was deflated before encryption.
    pub fn is_deflated(&self) -> bool {
        self.compression_method.as_deref() == Some("8")
    }
}

/// A breach of the structural rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionViolation {
    /// The root element is not `container:encryption`.
    WrongRoot(String),
    /// The encryption method is not AES-256-CBC.
    WrongAlgorithm {
        /// Position of the `EncryptedData` element.
        index: usize,
        /// Algorithm found, if any.
        found: Option<String>,
    },
    /// No `KeyInfo/RetrievalMethod`.
    MissingRetrievalMethod {
        /// Position of the `EncryptedData` element.
        index: usize,
    },
    /// `RetrievalMethod/@URI` does not point at the content key.
    WrongRetrievalUri {
        /// Position of the `EncryptedData` element.
        index: usize,
        /// URI found, if any.
        found: Option<String>,
    },
    /// `RetrievalMethod/@Type` is not the encrypted content key type.
    WrongRetrievalType {
        /// Position of the `EncryptedData` element.
        index: usize,
        /// Type found, if any.
        found: Option<String>,
    },
    /// No `CipherReference/@URI`.
    MissingCipherReference {
        /// Position of the `EncryptedData` element.
        index: usize,
    },
}

impl fmt::Display for EncryptionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = |v: &Option<String>| v.clone().unwrap_or_else(|| "(none)".to_string());
        match self {
            Self::WrongRoot(name) => write!(f, "root element is {name}, expected encryption"),
            Self::WrongAlgorithm { index, found } => write!(
                f,
                "EncryptedData[{index}]: algorithm {} is not {AES256_CBC}",
                shown(found)
            ),
            Self::MissingRetrievalMethod { index } => {
                write!(f, "EncryptedData[{index}]: no KeyInfo/RetrievalMethod")
            }
            Self::WrongRetrievalUri { index, found } => write!(
                f,
                "EncryptedData[{index}]: RetrievalMethod URI {} is not {CONTENT_KEY_URI}",
                shown(found)
            ),
            Self::WrongRetrievalType { index, found } => write!(
                f,
                "EncryptedData[{index}]: RetrievalMethod Type {} is not {CONTENT_KEY_TYPE}",
                shown(found)
            ),
            Self::MissingCipherReference { index } => {
                write!(f, "EncryptedData[{index}]: no CipherReference URI")
            }
        }
    }
}

/// A parsed `encryption.xml`.
#[derive(Debug, Clone)]
pub struct EncryptionXml {
    root: String,
    root_ns: Option<String>,
    data: Vec<EncryptedData>,
}

impl EncryptionXml {
    /// Parse the document.
    ///
    /// # Errors
    ///
    /// `ParseError::Xml` when the text is not well-formed XML.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let doc = Document::parse(text).map_err(|e| ParseError::Xml(e.to_string()))?;
        let root = doc.root_element();
        let data: Vec<EncryptedData> = root
            .children()
            .filter(|n| is(n, XMLENC_NS, "EncryptedData"))
            .map(read_encrypted_data)
            .collect();
        tracing::debug!(encrypted = data.len(), "encryption.xml parsed");
        Ok(Self {
            root: root.tag_name().name().to_string(),
            root_ns: root.tag_name().namespace().map(str::to_string),
            data,
        })
    }

    /// Parse from raw entry bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ParseError::Xml(format!("not UTF-8: {e}")))?;
        Self::parse(text)
    }

    /// All `EncryptedData` elements, in document order.
    pub fn encrypted_data(&self) -> &[EncryptedData] {
        &self.data
    }

    /// URIs of all encrypted resources, in document order.
    pub fn encrypted_resources(&self) -> impl Iterator<Item = &str> {
        self.data.iter().filter_map(|d| d.cipher_reference.as_deref())
    }

    /// Every breach of the structural rules. Empty when the document
    /// conforms.
    pub fn violations(&self) -> Vec<EncryptionViolation> {
        let mut out = Vec::new();
        if self.root != "encryption" || self.root_ns.as_deref() != Some(CONTAINER_NS) {
            out.push(EncryptionViolation::WrongRoot(self.root.clone()));
        }
        for (index, d) in self.data.iter().enumerate() {
            if d.algorithm.as_deref() != Some(AES256_CBC) {
                out.push(EncryptionViolation::WrongAlgorithm {
                    index,
                    found: d.algorithm.clone(),
                });
            }
            if !d.has_retrieval_method {
                out.push(EncryptionViolation::MissingRetrievalMethod { index });
            } else {
                if d.retrieval_uri.as_deref() != Some(CONTENT_KEY_URI) {
                    out.push(EncryptionViolation::WrongRetrievalUri {
                        index,
                        found: d.retrieval_uri.clone(),
                    });
                }
                if d.retrieval_type.as_deref() != Some(CONTENT_KEY_TYPE) {
                    out.push(EncryptionViolation::WrongRetrievalType {
                        index,
                        found: d.retrieval_type.clone(),
                    });
                }
            }
            if d.cipher_reference.is_none() {
                out.push(EncryptionViolation::MissingCipherReference { index });
            }
        }
        out
    }
}

fn is(node: &Node<'_, '_>, ns: &str, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(ns)
}

fn child<'a, 'i>(node: Node<'a, 'i>, ns: &str, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is(n, ns, name))
}

fn read_encrypted_data(node: Node<'_, '_>) -> EncryptedData {
    let retrieval = child(node, XMLDSIG_NS, "KeyInfo")
        .and_then(|k| child(k, XMLDSIG_NS, "RetrievalMethod"));
    let compression = node
        .descendants()
        .find(|n| is(n, COMPRESSION_NS, "Compression"));
    EncryptedData {
        algorithm: child(node, XMLENC_NS, "EncryptionMethod")
            .and_then(|m| m.attribute("Algorithm"))
            .map(str::to_string),
        has_retrieval_method: retrieval.is_some(),
        retrieval_uri: retrieval
            .and_then(|r| r.attribute("URI"))
            .map(str::to_string),
        retrieval_type: retrieval
            .and_then(|r| r.attribute("Type"))
            .map(str::to_string),
        cipher_reference: child(node, XMLENC_NS, "CipherData")
            .and_then(|c| child(c, XMLENC_NS, "CipherReference"))
            .and_then(|r| r.attribute("URI"))
            .map(str::to_string),
        compression_method: compression
            .and_then(|c| c.attribute("Method"))
            .map(str::to_string),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(uri: &str, compression: Option<&str>) -> String {
        let properties = compression
            .map(|m| {
                format!(
                    r#"<enc:EncryptionProperties><enc:EncryptionProperty xmlns:ns="{COMPRESSION_NS}"><ns:Compression Method="{m}" OriginalLength="1024"/></enc:EncryptionProperty></enc:EncryptionProperties>"#
                )
            })
            .unwrap_or_default();
        format!(
            r#"<enc:EncryptedData>
  <enc:EncryptionMethod Algorithm="{AES256_CBC}"/>
  <ds:KeyInfo><ds:RetrievalMethod URI="{CONTENT_KEY_URI}" Type="{CONTENT_KEY_TYPE}"/></ds:KeyInfo>
  <enc:CipherData><enc:CipherReference URI="{uri}"/></enc:CipherData>
  {properties}
</enc:EncryptedData>"#
        )
    }

    pub(crate) fn document(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<encryption xmlns="{CONTAINER_NS}" xmlns:enc="{XMLENC_NS}" xmlns:ds="{XMLDSIG_NS}">
{}
</encryption>"#,
            entries.join("\n")
        )
    }

    #[test]
    fn test_conforming_document() {
        let xml = document(&[
            entry("OEBPS/chapter1.xhtml", Some("8")),
            entry("OEBPS/images/cover.jpg", Some("0")),
        ]);
        let enc = EncryptionXml::parse(&xml).unwrap();
        assert!(enc.violations().is_empty(), "{:?}", enc.violations());
        assert_eq!(
            enc.encrypted_resources().collect::<Vec<_>>(),
            vec!["OEBPS/chapter1.xhtml", "OEBPS/images/cover.jpg"]
        );
        assert!(enc.encrypted_data()[0].is_deflated());
        assert!(!enc.encrypted_data()[1].is_deflated());
    }

    #[test]
    fn test_wrong_algorithm() {
        let xml = document(&[entry("a.xhtml", None).replace(AES256_CBC, "http://www.w3.org/2001/04/xmlenc#aes128-cbc")]);
        let violations = EncryptionXml::parse(&xml).unwrap().violations();
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0],
            EncryptionViolation::WrongAlgorithm { index: 0, .. }
        ));
        assert!(violations[0].to_string().contains("aes128-cbc"));
    }

    #[test]
    fn test_retrieval_method_rules() {
        let wrong_uri = entry("a.xhtml", None).replace(CONTENT_KEY_URI, "license.lcpl#/encryption/user_key");
        let wrong_type = entry("b.xhtml", None).replace(CONTENT_KEY_TYPE, "http://example.org/key");
        let missing = entry("c.xhtml", None).replace(
            &format!(r#"<ds:KeyInfo><ds:RetrievalMethod URI="{CONTENT_KEY_URI}" Type="{CONTENT_KEY_TYPE}"/></ds:KeyInfo>"#),
            "",
        );
        let violations = EncryptionXml::parse(&document(&[wrong_uri, wrong_type, missing]))
            .unwrap()
            .violations();
        assert_eq!(
            violations,
            vec![
                EncryptionViolation::WrongRetrievalUri {
                    index: 0,
                    found: Some("license.lcpl#/encryption/user_key".to_string())
                },
                EncryptionViolation::WrongRetrievalType {
                    index: 1,
                    found: Some("http://example.org/key".to_string())
                },
                EncryptionViolation::MissingRetrievalMethod { index: 2 },
            ]
        );
    }

    #[test]
    fn test_missing_cipher_reference() {
        let xml = document(&[entry("a.xhtml", None).replace(r#"<enc:CipherReference URI="a.xhtml"/>"#, "")]);
        let enc = EncryptionXml::parse(&xml).unwrap();
        assert_eq!(
            enc.violations(),
            vec![EncryptionViolation::MissingCipherReference { index: 0 }]
        );
        assert_eq!(enc.encrypted_resources().count(), 0);
    }

    #[test]
    fn test_wrong_root() {
        let xml = format!(r#"<manifest xmlns="{CONTAINER_NS}"/>"#);
        let violations = EncryptionXml::parse(&xml).unwrap().violations();
        assert_eq!(violations, vec![EncryptionViolation::WrongRoot("manifest".to_string())]);
    }

    #[test]
    fn test_prefix_independent() {
        let xml = format!(
            r#"<c:encryption xmlns:c="{CONTAINER_NS}"><EncryptedData xmlns="{XMLENC_NS}"><EncryptionMethod Algorithm="{AES256_CBC}"/><KeyInfo xmlns="{XMLDSIG_NS}"><RetrievalMethod URI="{CONTENT_KEY_URI}" Type="{CONTENT_KEY_TYPE}"/></KeyInfo><CipherData><CipherReference URI="x.xhtml"/></CipherData></EncryptedData></c:encryption>"#
        );
        let enc = EncryptionXml::parse(&xml).unwrap();
        assert!(enc.violations().is_empty(), "{:?}", enc.violations());
        assert_eq!(enc.encrypted_resources().next(), Some("x.xhtml"));
    }

    #[test]
    fn test_not_xml() {
        assert!(matches!(
            EncryptionXml::parse("<encryption><unclosed></encryption>"),
            Err(ParseError::Xml(_))
        ));
        assert!(EncryptionXml::from_bytes(&[0xff, 0xfe, 0x00]).is_err());
    }
}
