//! Prophage region calling.
//!
//! The pipeline for one genome runs leaf-first through these stages:
//!
//! 1. [`window`]: score fixed-size gene windows from normalized evidence
//! 2. [`caller`]: threshold and merge windows into candidate regions
//! 3. [`boundary`] (with [`repeats`]): snap candidate edges to attachment
//!    sites or gene boundaries
//! 4. [`filter`] (optionally with [`density`]): drop weak or overlapping
//!    regions
//!
//! [`engine::ProphageScanner`] drives the stages and scans batches of
//! genomes in parallel.

pub mod boundary;
pub mod caller;
pub mod config;
pub mod density;
pub mod engine;
pub mod filter;
pub mod repeats;
pub mod window;

pub use config::ScanConfig;
pub use engine::{GenomeInput, GenomeOutcome, GenomeReport, ProphageScanner, ScanError, ScanNote};
