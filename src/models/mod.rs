//! Data types passed between the Storage Handler and its callers.
//!
//! These describe what a caller gets back from an operation; the raw bytes on
//! disk are owned by the storage backends.

pub mod stored_file;
