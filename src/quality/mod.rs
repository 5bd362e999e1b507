//! # Quality Assurance
//!
//! Validation and scoring of untrusted LLM findings. The scorer is a pure
//! function over a finding and its category; no I/O, deterministic output.

pub mod scorer;

pub use scorer::{QualityScorer, QualityWeights};
