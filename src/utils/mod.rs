//! Shared helpers: input limits, sequence normalization and checksums.

pub mod validation;
