//! Core data types for prophage calling.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Gene`]: A predicted gene with 0-based, half-open coordinates and strand
//! - [`Genome`]: One contig with its ordered genes and optional sequence
//! - [`Window`], [`CandidateRegion`], [`RefinedRegion`]: Intermediate calling results
//! - [`ProphageCall`]: The final, immutable output record
//! - [`BoundaryEvidence`], [`Confidence`]: How well each call is delimited
//!
//! ## Coordinates
//!
//! All coordinates are 0-based and half-open (`[start, end)`), matching BED.
//! GFF3 input (1-based, closed) is converted on parse.
//!
//! [`Gene`]: gene::Gene
//! [`Genome`]: genome::Genome
//! [`Window`]: region::Window
//! [`CandidateRegion`]: region::CandidateRegion
//! [`RefinedRegion`]: region::RefinedRegion
//! [`ProphageCall`]: region::ProphageCall
//! [`BoundaryEvidence`]: types::BoundaryEvidence
//! [`Confidence`]: types::Confidence

pub mod gene;
pub mod genome;
pub mod region;
pub mod types;
