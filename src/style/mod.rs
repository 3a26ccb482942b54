//! Style fingerprinting for source blog posts
//!
//! The analyzer extracts the lexical and structural signature of a sample
//! post (sentence endings, characteristic expressions, emotion vocabulary,
//! embed markers) that the prompt builder uses to steer generation toward
//! the same voice.

mod analyzer;
mod short_name;

pub use analyzer::{MarkerInfo, MarkerKind, MarkerOccurrence, StyleAnalyzer, StyleFingerprint};
pub use short_name::derive_short_name;
