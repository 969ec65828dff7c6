//! # recordio storage
//!
//! Storage handles that a recordio log is written to and replayed from.
//!
//! A backend is an **opaque byte store**: it appends bytes, reads them back
//! by offset and flushes them. It knows nothing about frames, headers or
//! checksums; `recordio_core` owns the on-disk layout.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and ephemeral logs
//! - [`FileBackend`] - For persistent logs using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use recordio_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//!
//! // Short reads at end of storage are allowed through `read_available`.
//! assert_eq!(backend.read_available(6, 100).unwrap(), b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
