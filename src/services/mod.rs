//! Services behind the export route and the CLI.
//!
//! `sources` resolves image references to bytes (local assets or an
//! allow-listed HTTP origin); `fonts` loads the face directory at startup.

pub mod fonts;
pub mod sources;
