//! theme-sync - sync design-tool color-theme exports into a variable store
//!
//! This library normalizes a loosely-structured theme export (named color
//! roles across light/dark contrast variants) into a canonical
//! mode -> token -> hex mapping, then diffs it against a host's variable
//! collection and applies the minimal create/update set. Dry-run produces
//! the full preview without mutating anything.

pub mod cache;
pub mod color;
pub mod error;
pub mod host;
pub mod logging;
pub mod resolver;
pub mod summary;
pub mod sync;
pub mod theme;
