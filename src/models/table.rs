//! # Table Schema Snapshots
//!
//! Immutable table metadata supplied by the external schema client. The
//! engine never mutates a descriptor; every analysis works against the
//! snapshot it was handed. The schema fingerprint derived here keys the
//! analysis cache so that any schema change invalidates cached results
//! without explicit invalidation calls.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single field in a table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Type-specific options (select choices, link targets, formula text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

/// A relationship between tables, derived from link/lookup/rollup fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub field_name: String,
    #[serde(rename = "type")]
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_table_id: Option<String>,
}

/// A saved view on a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: String,
}

/// Immutable snapshot of one table's schema, supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub base_id: String,
    pub table_id: String,
    pub table_name: String,
    /// Ordered field list; ordering is part of the schema fingerprint
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u64>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub views: Vec<ViewDescriptor>,
}

impl TableDescriptor {
    /// Deterministic fingerprint of the field list and relationship list.
    ///
    /// Cache keys embed this hash, so a schema change (field added, renamed,
    /// retyped, relationship changed) produces a new key and the stale entry
    /// simply ages out.
    pub fn schema_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in &self.fields {
            hasher.update(field.name.as_bytes());
            hasher.update([0x1f]);
            hasher.update(field.field_type.as_bytes());
            hasher.update([0x1e]);
        }
        for rel in &self.relationships {
            hasher.update(rel.field_name.as_bytes());
            hasher.update([0x1f]);
            hasher.update(rel.relationship_type.as_bytes());
            hasher.update([0x1f]);
            if let Some(linked) = &rel.linked_table_id {
                hasher.update(linked.as_bytes());
            }
            hasher.update([0x1e]);
        }
        let digest = hasher.finalize();
        // 16 hex chars is plenty for key disambiguation
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Derive relationships from field descriptors when the schema client returns
/// link/lookup/rollup fields without an explicit relationship list.
pub fn extract_relationships(fields: &[FieldDescriptor]) -> Vec<Relationship> {
    fields
        .iter()
        .filter_map(|field| {
            let relationship_type = match field.field_type.as_str() {
                "multipleRecordLinks" => "link",
                "lookup" => "lookup",
                "rollup" => "rollup",
                _ => return None,
            };
            let linked_table_id = field
                .options
                .as_ref()
                .and_then(|opts| opts.get("linkedTableId"))
                .and_then(|v| v.as_str())
                .map(String::from);
            Some(Relationship {
                field_name: field.name.clone(),
                relationship_type: relationship_type.to_string(),
                linked_table_id,
            })
        })
        .collect()
}
