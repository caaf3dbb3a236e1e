//! Normalization of per-gene evidence from external search tools.
//!
//! Homology searches (phage and bacterial protein references) and profile
//! searches report tool-native scores per gene. [`adapter::EvidenceAdapter`]
//! collapses them into one [`adapter::EvidenceScores`] per gene, keeping
//! "no evidence" distinct from a low score.

pub mod adapter;

pub use adapter::{EvidenceAdapter, EvidenceError, EvidenceScores, EvidenceTable, RawHit};
