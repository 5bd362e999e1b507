//! # Data Model Layer
//!
//! Domain data types shared across the analysis engine: table schema
//! snapshots supplied by the schema client, analysis categories, and the
//! finding types produced by parsing and scoring LLM output.

pub mod finding;
pub mod table;

pub use finding::{
    AnalysisCategory, Effort, Finding, Priority, QualityBand, QualityBreakdown, ScoredFinding,
};
pub use table::{
    extract_relationships, FieldDescriptor, Relationship, TableDescriptor, ViewDescriptor,
};
