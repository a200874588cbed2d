//! Checks on a protected publication's archive and encryption manifest.

use std::io::{Read, Seek};

use lcpt_publication::{
    EncryptionXml, Publication, ResourceViolation, ENCRYPTION_ENTRY, LICENSE_ENTRY,
};

use crate::report::Outcome;

/// `META-INF/encryption.xml` is in the archive.
pub fn encryption_present<R: Read + Seek>(publication: &Publication<R>) -> Outcome {
    entry_present(publication, ENCRYPTION_ENTRY)
}

/// `META-INF/license.lcpl` is in the archive.
pub fn license_present<R: Read + Seek>(publication: &Publication<R>) -> Outcome {
    entry_present(publication, LICENSE_ENTRY)
}

fn entry_present<R: Read + Seek>(publication: &Publication<R>, name: &str) -> Outcome {
    Outcome::check(publication.contains(name), || format!("publication has no {name}"))
}

/// Every `EncryptedData` follows the protected-publication profile.
pub fn encryption_structure(encryption: &EncryptionXml) -> Outcome {
    let violations = encryption.violations();
    Outcome::check(violations.is_empty(), || join(&violations))
}

/// Every encrypted resource exists in the archive.
pub fn resources_present<R: Read + Seek>(
    publication: &Publication<R>,
    encryption: &EncryptionXml,
) -> Outcome {
    resource_check(publication, encryption, |v| matches!(v, ResourceViolation::Missing(_)))
}

/// No file of the clear-text allowlist is encrypted.
pub fn allowlist_in_clear<R: Read + Seek>(
    publication: &Publication<R>,
    encryption: &EncryptionXml,
) -> Outcome {
    resource_check(publication, encryption, |v| {
        matches!(v, ResourceViolation::MustNotBeEncrypted(_))
    })
}

/// No media resource is deflated before encryption.
pub fn media_uncompressed<R: Read + Seek>(
    publication: &Publication<R>,
    encryption: &EncryptionXml,
) -> Outcome {
    resource_check(publication, encryption, |v| {
        matches!(v, ResourceViolation::MediaCompressed(_))
    })
}

fn resource_check<R: Read + Seek>(
    publication: &Publication<R>,
    encryption: &EncryptionXml,
    keep: impl Fn(&ResourceViolation) -> bool,
) -> Outcome {
    let violations: Vec<_> = publication
        .resource_violations(encryption)
        .into_iter()
        .filter(|v| keep(v))
        .collect();
    Outcome::check(violations.is_empty(), || join(&violations))
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const RETRIEVAL: &str = r#"<ds:KeyInfo><ds:RetrievalMethod URI="license.lcpl#/encryption/content_key" Type="http://readium.org/2014/01/lcp#EncryptedContentKey"/></ds:KeyInfo>"#;

    fn encrypted(uri: &str, compression: Option<&str>) -> String {
        let props = compression
            .map(|m| {
                format!(
                    r#"<enc:EncryptionProperties><enc:EncryptionProperty xmlns:ns="http://www.idpf.org/2016/encryption#compression"><ns:Compression Method="{m}" OriginalLength="10"/></enc:EncryptionProperty></enc:EncryptionProperties>"#
                )
            })
            .unwrap_or_default();
        format!(
            r#"<enc:EncryptedData><enc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes256-cbc"/>{RETRIEVAL}<enc:CipherData><enc:CipherReference URI="{uri}"/></enc:CipherData>{props}</enc:EncryptedData>"#
        )
    }

    fn manifest(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0"?><encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container" xmlns:enc="http://www.w3.org/2001/04/xmlenc#" xmlns:ds="http://www.w3.org/2000/09/xmldsig#">{}</encryption>"#,
            entries.concat()
        )
    }

    fn archive(names: &[&str]) -> Publication<Cursor<Vec<u8>>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(b"x").unwrap();
        }
        Publication::from_reader(Cursor::new(zip.finish().unwrap().into_inner())).unwrap()
    }

    #[test]
    fn test_conforming_publication() {
        let p = archive(&["mimetype", LICENSE_ENTRY, ENCRYPTION_ENTRY, "OEBPS/c1.xhtml", "OEBPS/cover.jpg"]);
        let enc = EncryptionXml::parse(&manifest(&[
            encrypted("OEBPS/c1.xhtml", Some("8")),
            encrypted("OEBPS/cover.jpg", Some("0")),
        ]))
        .unwrap();
        assert!(encryption_present(&p).is_pass());
        assert!(license_present(&p).is_pass());
        assert!(encryption_structure(&enc).is_pass());
        assert!(resources_present(&p, &enc).is_pass());
        assert!(allowlist_in_clear(&p, &enc).is_pass());
        assert!(media_uncompressed(&p, &enc).is_pass());
    }

    #[test]
    fn test_each_resource_rule_reports_separately() {
        let p = archive(&["mimetype", "OEBPS/a.mp3", "META-INF/container.xml"]);
        let enc = EncryptionXml::parse(&manifest(&[
            encrypted("OEBPS/a.mp3", Some("8")),
            encrypted("META-INF/container.xml", None),
            encrypted("OEBPS/gone.xhtml", None),
        ]))
        .unwrap();
        assert!(!encryption_present(&p).is_pass());
        assert!(!license_present(&p).is_pass());

        let Outcome::Fail { message } = resources_present(&p, &enc) else {
            panic!("expected a failure");
        };
        assert!(message.contains("OEBPS/gone.xhtml"));
        assert!(!message.contains("a.mp3"));

        let Outcome::Fail { message } = allowlist_in_clear(&p, &enc) else {
            panic!("expected a failure");
        };
        assert!(message.contains("META-INF/container.xml"));

        let Outcome::Fail { message } = media_uncompressed(&p, &enc) else {
            panic!("expected a failure");
        };
        assert!(message.contains("OEBPS/a.mp3"));
    }
}
