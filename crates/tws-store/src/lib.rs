//! Local persistence for trace warning sync.
//!
//! Holds the records the download engine reads and writes between runs:
//! package metadata (one record per downloaded package), the caller's
//! relevant check-in windows, the per-region "last run succeeded" flag, and
//! the verified package bytes themselves.
//!
//! # Storage Backends
//!
//! - [`InMemoryMetadataStore`] / [`InMemoryPackageStore`] -- for tests and embedding
//! - [`FileMetadataStore`] / [`DirPackageStore`] -- durable, on-disk
//!
//! # Design Rules
//!
//! 1. Metadata records are unique by `(id, region)`; insert replaces.
//! 2. Reads always observe the current contents, never a cached snapshot.
//! 3. On-disk writes are atomic: a crash leaves the old or the new file.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{DirPackageStore, FileMetadataStore};
pub use memory::{InMemoryMetadataStore, InMemoryPackageStore};
pub use traits::{DownloadStatusStore, MetadataPredicate, MetadataStore, PackageStore};
