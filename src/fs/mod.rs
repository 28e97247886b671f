//! Filesystem utilities for bistro.
//!
//! Atomic whole-file replacement for the history log and its export.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
