//! Compiled-module caching with fingerprint support.
//!
//! Compiling a large MIB collection takes a while; the resulting
//! [`ModuleSet`] can be written to a cache file and loaded back instead.
//! Two workflows are supported:
//!
//! 1. **Build once, ship the cache**: compile on one machine, save, and load
//!    elsewhere without verification (no MIB files present there).
//!
//! 2. **Local MIB directory**: fingerprint the MIB files, verify the cache
//!    against that fingerprint on load, and recompile when it is stale.
//!
//! # File Format
//!
//! Cache files use the `.mibc` extension by convention:
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (9 or 41 bytes)                 │
//! │   magic: [u8; 4]        "MIBC"         │
//! │   version: u32          Schema version │
//! │   has_fingerprint: u8   0 or 1         │
//! │   fingerprint: [u8; 32] (if present)   │
//! ├────────────────────────────────────────┤
//! │ Payload (postcard-encoded ModuleSet)   │
//! └────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mibtree_std::cache::{compute_fingerprint, is_cache_valid, load_cache_verified, save_cache};
//! use mibtree_std::loader::compile_files;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = ["mibs/SNMPv2-SMI.mib", "mibs/IF-MIB.mib"];
//! let contents: Vec<(&str, Vec<u8>)> = paths
//!     .iter()
//!     .map(|p| Ok((*p, std::fs::read(p)?)))
//!     .collect::<std::io::Result<_>>()?;
//! let files: Vec<(&str, &[u8])> = contents.iter().map(|(p, c)| (*p, c.as_slice())).collect();
//! let fingerprint = compute_fingerprint(&files);
//!
//! let modules = if is_cache_valid("mibs.mibc", &fingerprint) {
//!     load_cache_verified("mibs.mibc", &fingerprint)?
//! } else {
//!     let modules = compile_files(&paths)?;
//!     save_cache(&modules, "mibs.mibc", Some(fingerprint))?;
//!     modules
//! };
//! # let _ = modules;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::io;
use std::path::Path;

use mibtree_core::ModuleSet;
use sha2::{Digest, Sha256};

/// Current schema version. Bump on any breaking change to the serialized
/// module types.
pub const SCHEMA_VERSION: u32 = 1;

/// Magic bytes identifying a mibtree cache file.
const MAGIC: [u8; 4] = *b"MIBC";

/// Header size without a fingerprint: magic, version and flag.
const HEADER_LEN: usize = 9;

const FINGERPRINT_LEN: usize = 32;

/// Cache error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// File does not start with the expected magic bytes.
    #[error("invalid magic bytes (expected MIBC)")]
    InvalidMagic,
    /// Schema version mismatch.
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version.
        expected: u32,
        /// Found version.
        found: u32,
    },
    /// Fingerprint does not match the expected value, or verification was
    /// requested for a cache written without one.
    #[error("fingerprint mismatch")]
    FingerprintMismatch,
    /// Header is truncated.
    #[error("truncated header")]
    TruncatedHeader,
    /// Postcard serialization failed.
    #[error("postcard serialization failed: {0}")]
    SerializationFailed(#[source] postcard::Error),
    /// Postcard deserialization failed.
    #[error("postcard deserialization failed: {0}")]
    DeserializationFailed(#[source] postcard::Error),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Compute a fingerprint from MIB file contents.
///
/// The fingerprint includes the schema version so that a format change
/// invalidates old caches. Files are sorted by name for determinism.
///
/// # Arguments
///
/// * `files` - Pairs of `(filename, content)` for all MIB files
///
/// # Returns
///
/// A 32-byte SHA-256 fingerprint.
#[must_use]
pub fn compute_fingerprint<S: AsRef<str>>(files: &[(S, &[u8])]) -> [u8; 32] {
    let mut sorted: Vec<_> = files.iter().collect();
    sorted.sort_by_key(|(name, _)| name.as_ref());

    let mut hasher = Sha256::new();
    hasher.update(SCHEMA_VERSION.to_le_bytes());
    for (name, content) in sorted {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(content);
    }

    hasher.finalize().into()
}

/// Serialize compiled modules to cache bytes.
///
/// # Errors
///
/// [`CacheError::SerializationFailed`] if postcard rejects the payload.
pub fn serialize_modules(
    modules: &ModuleSet,
    fingerprint: Option<[u8; 32]>,
) -> Result<Vec<u8>, CacheError> {
    let payload = postcard::to_allocvec(modules).map_err(CacheError::SerializationFailed)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + FINGERPRINT_LEN + payload.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    match fingerprint {
        Some(fp) => {
            bytes.push(1);
            bytes.extend_from_slice(&fp);
        }
        None => bytes.push(0),
    }
    bytes.extend_from_slice(&payload);

    tracing::debug!(
        modules = modules.len(),
        bytes = bytes.len(),
        fingerprint = fingerprint.is_some(),
        "serialized module cache"
    );
    Ok(bytes)
}

/// Deserialize compiled modules from cache bytes.
///
/// # Arguments
///
/// * `bytes` - Cache file contents
/// * `expected_fingerprint` - If `Some`, verify the stored fingerprint
///   matches; if `None`, skip verification
///
/// # Errors
///
/// Returns an error if:
/// - the header is truncated or the magic bytes don't match
/// - the schema version doesn't match
/// - the fingerprint doesn't match (when verification is requested)
/// - postcard deserialization fails
pub fn deserialize_modules(
    bytes: &[u8],
    expected_fingerprint: Option<&[u8; 32]>,
) -> Result<ModuleSet, CacheError> {
    let (stored, payload) = split_header(bytes)?;
    match (expected_fingerprint, stored) {
        (Some(expected), Some(stored)) if &stored != expected => {
            return Err(CacheError::FingerprintMismatch)
        }
        (Some(_), None) => return Err(CacheError::FingerprintMismatch),
        _ => {}
    }

    let modules: ModuleSet =
        postcard::from_bytes(payload).map_err(CacheError::DeserializationFailed)?;
    tracing::debug!(modules = modules.len(), "loaded module cache");
    Ok(modules)
}

/// Extract the fingerprint from cache bytes without decoding the payload.
///
/// # Errors
///
/// Returns an error if the header is invalid.
pub fn get_fingerprint(bytes: &[u8]) -> Result<Option<[u8; 32]>, CacheError> {
    split_header(bytes).map(|(fingerprint, _)| fingerprint)
}

/// Validate the header and split off the payload.
fn split_header(bytes: &[u8]) -> Result<(Option<[u8; 32]>, &[u8]), CacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(CacheError::TruncatedHeader);
    }
    if bytes[0..4] != MAGIC {
        return Err(CacheError::InvalidMagic);
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != SCHEMA_VERSION {
        return Err(CacheError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found: version,
        });
    }

    if bytes[8] == 0 {
        return Ok((None, &bytes[HEADER_LEN..]));
    }
    let end = HEADER_LEN + FINGERPRINT_LEN;
    let fingerprint: [u8; 32] = bytes
        .get(HEADER_LEN..end)
        .and_then(|fp| fp.try_into().ok())
        .ok_or(CacheError::TruncatedHeader)?;
    Ok((Some(fingerprint), &bytes[end..]))
}

/// Save compiled modules to a cache file.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn save_cache<P: AsRef<Path>>(
    modules: &ModuleSet,
    path: P,
    fingerprint: Option<[u8; 32]>,
) -> Result<(), CacheError> {
    let bytes = serialize_modules(modules, fingerprint)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Load compiled modules from a cache file without fingerprint
/// verification.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the cache is invalid.
pub fn load_cache<P: AsRef<Path>>(path: P) -> Result<ModuleSet, CacheError> {
    let bytes = fs::read(path)?;
    deserialize_modules(&bytes, None)
}

/// Load compiled modules from a cache file with fingerprint verification.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the cache is invalid,
/// or the fingerprint doesn't match.
pub fn load_cache_verified<P: AsRef<Path>>(
    path: P,
    expected_fingerprint: &[u8; 32],
) -> Result<ModuleSet, CacheError> {
    let bytes = fs::read(path)?;
    deserialize_modules(&bytes, Some(expected_fingerprint))
}

/// Check if a cache file exists and has a matching fingerprint.
///
/// Returns `false` if the cache doesn't exist, is invalid, or has a
/// different (or no) fingerprint.
#[must_use]
pub fn is_cache_valid<P: AsRef<Path>>(path: P, expected_fingerprint: &[u8; 32]) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };

    match get_fingerprint(&bytes) {
        Ok(Some(fp)) => fp == *expected_fingerprint,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mibtree_core::Compiler;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn sample_modules() -> ModuleSet {
        let mut compiler = Compiler::new();
        compiler.add_source(
            "TEST-MIB",
            "TEST-MIB DEFINITIONS ::= BEGIN\n\
             org OBJECT IDENTIFIER ::= { iso 3 }\n\
             dod OBJECT IDENTIFIER ::= { org 6 }\n\
             END\n",
        );
        compiler.compile_all();
        compiler.into_modules()
    }

    #[test]
    fn test_compute_fingerprint_deterministic() {
        let files: &[(&str, &[u8])] = &[("a.mib", b"content a"), ("b.mib", b"content b")];
        assert_eq!(compute_fingerprint(files), compute_fingerprint(files));
    }

    #[test]
    fn test_compute_fingerprint_order_independent() {
        let files1: &[(&str, &[u8])] = &[("a.mib", b"content a"), ("b.mib", b"content b")];
        let files2: &[(&str, &[u8])] = &[("b.mib", b"content b"), ("a.mib", b"content a")];
        assert_eq!(compute_fingerprint(files1), compute_fingerprint(files2));
    }

    #[test]
    fn test_compute_fingerprint_content_sensitive() {
        let files1: &[(&str, &[u8])] = &[("a.mib", b"content a")];
        let files2: &[(&str, &[u8])] = &[("a.mib", b"content b")];
        assert_ne!(compute_fingerprint(files1), compute_fingerprint(files2));
    }

    #[test]
    fn test_round_trip_no_fingerprint() {
        let modules = sample_modules();
        let bytes = serialize_modules(&modules, None).unwrap();
        assert_eq!(get_fingerprint(&bytes).unwrap(), None);
        let restored = deserialize_modules(&bytes, None).unwrap();
        assert_eq!(restored, modules);
        assert_eq!(
            restored.lookup_object("dod").and_then(|o| o.oid()),
            Some("1.3.6")
        );
    }

    #[test]
    fn test_round_trip_with_fingerprint() {
        let modules = sample_modules();
        let fp = [42u8; 32];
        let bytes = serialize_modules(&modules, Some(fp)).unwrap();
        assert_eq!(get_fingerprint(&bytes).unwrap(), Some(fp));
        assert_eq!(deserialize_modules(&bytes, Some(&fp)).unwrap(), modules);
        // Verification is optional on load.
        assert_eq!(deserialize_modules(&bytes, None).unwrap(), modules);
    }

    #[test]
    fn test_fingerprint_mismatch() {
        let modules = ModuleSet::new();
        let bytes = serialize_modules(&modules, Some([42u8; 32])).unwrap();
        let result = deserialize_modules(&bytes, Some(&[0u8; 32]));
        assert!(matches!(result, Err(CacheError::FingerprintMismatch)));

        let bare = serialize_modules(&modules, None).unwrap();
        let result = deserialize_modules(&bare, Some(&[0u8; 32]));
        assert!(matches!(result, Err(CacheError::FingerprintMismatch)));
    }

    #[test]
    fn test_invalid_headers() {
        assert!(matches!(
            deserialize_modules(b"MIBC", None),
            Err(CacheError::TruncatedHeader)
        ));
        assert!(matches!(
            deserialize_modules(b"WMIB\x01\x00\x00\x00\x00", None),
            Err(CacheError::InvalidMagic)
        ));
        assert!(matches!(
            deserialize_modules(b"MIBC\x09\x00\x00\x00\x00", None),
            Err(CacheError::VersionMismatch { expected: 1, found: 9 })
        ));
        assert!(matches!(
            get_fingerprint(b"MIBC\x01\x00\x00\x00\x01\x2a\x2a"),
            Err(CacheError::TruncatedHeader)
        ));
    }

    #[test]
    fn test_corrupt_payload() {
        let mut bytes = serialize_modules(&sample_modules(), None).unwrap();
        bytes.truncate(HEADER_LEN + 3);
        assert!(matches!(
            deserialize_modules(&bytes, None),
            Err(CacheError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let modules = sample_modules();
        let fp = [42u8; 32];
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_owned();

        save_cache(&modules, &path, Some(fp)).unwrap();
        assert_eq!(load_cache_verified(&path, &fp).unwrap(), modules);
        assert_eq!(load_cache(&path).unwrap(), modules);
    }

    #[test]
    fn test_is_cache_valid() {
        let fp = [42u8; 32];
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_owned();

        save_cache(&sample_modules(), &path, Some(fp)).unwrap();

        assert!(is_cache_valid(&path, &fp));
        assert!(!is_cache_valid(&path, &[0u8; 32]));
        assert!(!is_cache_valid("/nonexistent/path.mibc", &fp));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_cache("/nonexistent/path.mibc").unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
    }
}
