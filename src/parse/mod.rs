//! Tab text parsing: line classification, token scanning, system
//! alignment, and document assembly.

pub mod document;
pub mod duration;
pub mod lines;
pub mod note;
pub mod system;

pub use document::{parse_tab, parse_tab_with_ticks};
