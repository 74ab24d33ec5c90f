//! mibtree-std: filesystem loader and module cache
//!
//! This crate provides the IO around `mibtree-core`: reading MIB files from
//! disk into a [`Compiler`](mibtree_core::Compiler) and caching compiled
//! [`ModuleSet`](mibtree_core::ModuleSet)s between runs.

pub mod cache;
pub mod loader;

pub use cache::CacheError;
pub use loader::{compile_files, compile_files_cached, load_files, LoadError, SourceFile};
pub use mibtree_core;
