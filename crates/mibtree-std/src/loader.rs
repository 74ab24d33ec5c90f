//! Filesystem loading of MIB files.
//!
//! Each file becomes one compile unit named after its file stem, so
//! `mibs/IF-MIB.txt` is queued as `IF-MIB`. A module header inside the file
//! still takes precedence for the module name. Files are queued in the
//! order given; base modules such as `SNMPv2-SMI` must come first.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mibtree_core::{Compiler, ModuleSet};

use crate::cache::{self, CacheError};

/// Loader error.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A MIB file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Cache file could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A MIB file read into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Compile unit name (the file stem).
    pub unit: String,
    /// Raw file contents.
    pub contents: Vec<u8>,
}

impl SourceFile {
    /// Read a file.
    ///
    /// # Errors
    ///
    /// [`LoadError::Read`] if the file cannot be read.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| LoadError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            unit: unit_name(path),
            contents,
        })
    }

    /// Contents as text. Invalid UTF-8 is replaced rather than rejected;
    /// older MIBs are often Latin-1.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        let text = String::from_utf8_lossy(&self.contents);
        if matches!(text, Cow::Owned(_)) {
            tracing::warn!(unit = %self.unit, "MIB file is not valid UTF-8");
        }
        text
    }
}

/// Unit name for a path: the file stem, or the whole path if it has none.
fn unit_name(path: &Path) -> String {
    path.file_stem()
        .and_then(OsStr::to_str)
        .map_or_else(|| path.to_string_lossy().into_owned(), str::to_owned)
}

/// Read every file and queue it on a fresh [`Compiler`], without compiling.
///
/// # Errors
///
/// [`LoadError::Read`] for the first file that cannot be read.
pub fn load_files<I, P>(paths: I) -> Result<Compiler, LoadError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let sources = read_sources(paths)?;
    Ok(queue(&sources))
}

/// Read and compile every file, in order.
///
/// # Errors
///
/// [`LoadError::Read`] for the first file that cannot be read.
pub fn compile_files<I, P>(paths: I) -> Result<ModuleSet, LoadError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut compiler = load_files(paths)?;
    compiler.compile_all();
    Ok(compiler.into_modules())
}

/// Compile files, going through a cache file keyed by their fingerprint.
///
/// A cache whose fingerprint matches the files is loaded instead of
/// compiling. Otherwise the files are compiled and the cache rewritten; a
/// failed write is logged and does not fail the call.
///
/// # Errors
///
/// [`LoadError::Read`] if a MIB file cannot be read.
pub fn compile_files_cached<I, P>(paths: I, cache_path: impl AsRef<Path>) -> Result<ModuleSet, LoadError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let cache_path = cache_path.as_ref();
    let sources = read_sources(paths)?;
    let files: Vec<(&str, &[u8])> = sources
        .iter()
        .map(|s| (s.unit.as_str(), s.contents.as_slice()))
        .collect();
    let fingerprint = cache::compute_fingerprint(&files);

    if cache::is_cache_valid(cache_path, &fingerprint) {
        match cache::load_cache_verified(cache_path, &fingerprint) {
            Ok(modules) => return Ok(modules),
            Err(err) => tracing::warn!(
                cache = %cache_path.display(),
                error = %err,
                "discarding unreadable cache"
            ),
        }
    }

    let mut compiler = queue(&sources);
    compiler.compile_all();
    let modules = compiler.into_modules();
    if let Err(err) = cache::save_cache(&modules, cache_path, Some(fingerprint)) {
        tracing::warn!(cache = %cache_path.display(), error = %err, "failed to write cache");
    }
    Ok(modules)
}

fn read_sources<I, P>(paths: I) -> Result<Vec<SourceFile>, LoadError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(SourceFile::read).collect()
}

fn queue(sources: &[SourceFile]) -> Compiler {
    let mut compiler = Compiler::new();
    for source in sources {
        let module = compiler.add_source(&source.unit, &source.text());
        tracing::debug!(unit = %source.unit, module = %module, "queued MIB file");
    }
    compiler
}
