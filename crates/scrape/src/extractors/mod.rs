// ABOUTME: Extraction core: field declarations, per-node extraction, and positional record assembly.
// ABOUTME: Also loads field profiles from JSON, including the embedded default profile.

//! Extraction module.
//!
//! Submodules:
//! - `field`: field specifications, compiled field sets, per-node extraction.
//! - `assemble`: column evaluation and index-aligned record assembly.
//! - `loader`: JSON field profiles.

pub mod assemble;
pub mod field;
pub mod loader;
