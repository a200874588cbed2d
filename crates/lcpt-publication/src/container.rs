//! # Publication Container
//!
//! Opens the zip archive and serves the two entries the harness cares
//! about. The entry name index is built once at open time.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use lcpt_model::License;
use zip::ZipArchive;

use crate::encryption::EncryptionXml;
use crate::error::PublicationError;

/// Path of the embedded license.
pub const LICENSE_ENTRY: &str = "META-INF/license.lcpl";

/// Path of the encryption manifest.
pub const ENCRYPTION_ENTRY: &str = "META-INF/encryption.xml";

/// Entries a reading system must be able to open without the content key.
pub const MUST_NOT_ENCRYPT: [&str; 8] = [
    "mimetype",
    "META-INF/container.xml",
    "META-INF/encryption.xml",
    "META-INF/license.lcpl",
    "META-INF/manifest.xml",
    "META-INF/metadata.xml",
    "META-INF/rights.xml",
    "META-INF/signatures.xml",
];

/// Extensions of already-compressed media.
pub const MEDIA_EXTENSIONS: [&str; 8] = [
    ".jpg", ".png", ".gif", ".mp3", ".mp4", ".ogg", ".avi", ".mov",
];

/// A problem with the resources listed in `encryption.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceViolation {
    /// Listed as encrypted but absent from the archive.
    Missing(String),
    /// Listed as encrypted but must stay in clear.
    MustNotBeEncrypted(String),
    /// A media resource deflated before encryption.
    MediaCompressed(String),
}

impl fmt::Display for ResourceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(uri) => write!(f, "{uri} is listed in encryption.xml but not in the archive"),
            Self::MustNotBeEncrypted(uri) => write!(f, "{uri} must not be encrypted"),
            Self::MediaCompressed(uri) => {
                write!(f, "{uri} should not be compressed in encryption.xml")
            }
        }
    }
}

/// An opened protected publication.
pub struct Publication<R> {
    archive: ZipArchive<R>,
    names: BTreeSet<String>,
}

impl Publication<File> {
    /// Open a publication file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PublicationError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PublicationError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PublicationError::Io(e)
            }
        })?;
        let publication = Self::from_reader(file)?;
        tracing::debug!(path = %path.display(), entries = publication.names.len(), "publication opened");
        Ok(publication)
    }
}

impl<R: Read + Seek> Publication<R> {
    /// Open a publication from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self, PublicationError> {
        let archive = ZipArchive::new(reader)?;
        let names = archive.file_names().map(str::to_string).collect();
        Ok(Self { archive, names })
    }

    /// Entry names, sorted.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether the archive has an entry with this exact name.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Read an entry.
    ///
    /// # Errors
    ///
    /// `MissingEntry` when the archive has no such entry.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, PublicationError> {
        if !self.contains(name) {
            return Err(PublicationError::MissingEntry(name.to_string()));
        }
        let mut entry = self.archive.by_name(name)?;
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// The raw bytes of the embedded license.
    pub fn license_bytes(&mut self) -> Result<Vec<u8>, PublicationError> {
        self.read(LICENSE_ENTRY)
    }

    /// The embedded license, parsed.
    pub fn license(&mut self) -> Result<License, PublicationError> {
        let bytes = self.license_bytes()?;
        Ok(License::parse(&bytes)?)
    }

    /// The encryption manifest, parsed.
    pub fn encryption(&mut self) -> Result<EncryptionXml, PublicationError> {
        let bytes = self.read(ENCRYPTION_ENTRY)?;
        Ok(EncryptionXml::from_bytes(&bytes)?)
    }

    /// Check the encrypted resources against the archive.
    ///
    /// Every listed resource must exist, none may be on the clear-text
    /// allowlist, and media must not be deflated.
    pub fn resource_violations(&self, encryption: &EncryptionXml) -> Vec<ResourceViolation> {
        let mut out = Vec::new();
        for data in encryption.encrypted_data() {
            let Some(uri) = data.cipher_reference.as_deref() else {
                continue;
            };
            if !self.contains(uri) {
                out.push(ResourceViolation::Missing(uri.to_string()));
            }
            if MUST_NOT_ENCRYPT.contains(&uri) {
                out.push(ResourceViolation::MustNotBeEncrypted(uri.to_string()));
            }
            if data.is_deflated() && is_media(uri) {
                out.push(ResourceViolation::MediaCompressed(uri.to_string()));
            }
        }
        out
    }
}

/// Whether `uri` names an already-compressed media resource.
pub fn is_media(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::tests::{document, entry};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive(entries: &[(&str, &str)]) -> Publication<Cursor<Vec<u8>>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();
        Publication::from_reader(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_read_entries() {
        let mut publication = archive(&[("mimetype", "application/epub+zip"), ("a.xhtml", "x")]);
        assert!(publication.contains("mimetype"));
        assert_eq!(publication.read("mimetype").unwrap(), b"application/epub+zip");
        assert_eq!(publication.entries().collect::<Vec<_>>(), vec!["a.xhtml", "mimetype"]);
        assert!(matches!(
            publication.read(LICENSE_ENTRY),
            Err(PublicationError::MissingEntry(_))
        ));
    }

    #[test]
    fn test_resource_violations() {
        let xml = document(&[
            entry("OEBPS/ch1.xhtml", Some("8")),
            entry("OEBPS/absent.xhtml", None),
            entry("META-INF/container.xml", None),
            entry("OEBPS/img/Cover.JPG", Some("8")),
            entry("OEBPS/audio.mp3", Some("0")),
        ]);
        let mut publication = archive(&[
            ("OEBPS/ch1.xhtml", "..."),
            ("META-INF/container.xml", "<container/>"),
            ("OEBPS/img/Cover.JPG", "..."),
            ("OEBPS/audio.mp3", "..."),
            (ENCRYPTION_ENTRY, xml.as_str()),
        ]);
        let encryption = publication.encryption().unwrap();
        assert_eq!(
            publication.resource_violations(&encryption),
            vec![
                ResourceViolation::Missing("OEBPS/absent.xhtml".to_string()),
                ResourceViolation::MustNotBeEncrypted("META-INF/container.xml".to_string()),
                ResourceViolation::MediaCompressed("OEBPS/img/Cover.JPG".to_string()),
            ]
        );
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            Publication::from_reader(Cursor::new(b"{\"id\": 1}".to_vec())),
            Err(PublicationError::Zip(_))
        ));
    }

    #[test]
    fn test_media_extensions() {
        assert!(is_media("a/b.ogg"));
        assert!(is_media("movie.MOV"));
        assert!(!is_media("chapter.xhtml"));
        assert!(!is_media("font.otf"));
    }
}
