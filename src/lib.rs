//! clipmon - clipboard change monitor
//!
//! Watches the system clipboard, classifies each new copy as image, files,
//! text or other, and reports it once to registered listeners. Usable as a
//! Rust library, as a C shared library (see `ffi`), or through the `clipmon`
//! binary.

pub mod clipboard;
pub mod config;
pub mod ffi;
pub mod image;
pub mod logging;
pub mod models;
pub mod monitor;
