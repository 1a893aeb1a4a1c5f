//! plex-export - browse and export a Plex Media Server catalog
//!
//! This library crate exposes configuration loading and the export context
//! for the binary and for integration testing. The object graph itself lives
//! in the `plex-catalog` crate.

pub mod config;
pub mod export;
