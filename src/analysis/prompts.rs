//! # Analysis Prompt Builders
//!
//! Category-specific prompt construction from a table descriptor. Each
//! category maps to a fixed builder through a closed match - adding a
//! category requires a deliberate update here, not a runtime string match.
//! Only the prompt shape matters to the engine: a schema context block, a
//! category focus section, and the structured JSON response contract that
//! the parser expects.

use crate::models::{AnalysisCategory, TableDescriptor};

/// JSON response contract appended to every analysis prompt
const RESPONSE_CONTRACT: &str = r#"
Respond in JSON format with an array of findings:
```json
[
  {
    "issue_type": "string",
    "priority": "high|medium|low",
    "description": "string",
    "recommendation": "string",
    "impact": "string",
    "effort": "low|medium|high",
    "estimated_improvement": "string",
    "implementation_steps": ["step1", "step2"],
    "confidence_score": 0.0
  }
]
```
Return an empty array if no issues are found."#;

/// Builds category-specific analysis prompts
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the prompt for one (table, category) analysis
    pub fn build(&self, table: &TableDescriptor, category: AnalysisCategory) -> String {
        let focus = match category {
            AnalysisCategory::Structure => STRUCTURE_FOCUS,
            AnalysisCategory::Normalization => NORMALIZATION_FOCUS,
            AnalysisCategory::FieldTypes => FIELD_TYPES_FOCUS,
            AnalysisCategory::Relationships => RELATIONSHIPS_FOCUS,
            AnalysisCategory::Performance => PERFORMANCE_FOCUS,
            AnalysisCategory::DataQuality => DATA_QUALITY_FOCUS,
        };

        format!(
            "You are an expert database optimization consultant. Analyze the \
             following table and provide detailed improvement recommendations.\n\n\
             {}\n\n{}\n{}",
            schema_context(table),
            focus,
            RESPONSE_CONTRACT
        )
    }
}

/// Render the table schema block shared by every category prompt
fn schema_context(table: &TableDescriptor) -> String {
    let fields = serde_json::to_string_pretty(&table.fields)
        .unwrap_or_else(|_| "[]".to_string());
    let relationships = serde_json::to_string_pretty(&table.relationships)
        .unwrap_or_else(|_| "[]".to_string());
    let views = serde_json::to_string_pretty(&table.views)
        .unwrap_or_else(|_| "[]".to_string());
    let record_count = table
        .record_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    format!(
        "TABLE INFORMATION:\n\
         - Base ID: {}\n\
         - Table Name: {}\n\
         - Table ID: {}\n\
         - Record Count: {}\n\n\
         FIELDS:\n{}\n\n\
         RELATIONSHIPS:\n{}\n\n\
         VIEWS:\n{}",
        table.base_id,
        table.table_name,
        table.table_id,
        record_count,
        fields,
        relationships,
        views
    )
}

const STRUCTURE_FOCUS: &str = "\
ANALYSIS FOCUS:
Analyze this table for structural improvements including:
1. Field organization and grouping
2. Primary key effectiveness
3. Field dependencies and redundancy
4. Table size and complexity
5. View organization efficiency";

const NORMALIZATION_FOCUS: &str = "\
ANALYSIS FOCUS:
Identify violations of database normal forms and suggest improvements:
1. First normal form: multi-value fields, atomic value violations, repeating groups
2. Second normal form: partial dependencies on composite keys
3. Third normal form: transitive dependencies, derivable calculated fields
4. Denormalization opportunities where performance justifies them
For each issue, suggest table splitting strategies, new relationships, and
field relocation with the performance trade-offs involved.";

const FIELD_TYPES_FOCUS: &str = "\
ANALYSIS FOCUS:
Examine each field for:
1. Field type optimization: incorrect types for data content, text field sizing,
   number precision, date vs datetime usage, select vs multi-select fit
2. Field configuration: missing descriptions, inadequate validation rules,
   default value opportunities, required field settings
3. Lookup and formula fields: formulas that could be simplified, lookup chains
   causing slowdowns, calculated vs stored data decisions
4. Field naming consistency and ordering";

const RELATIONSHIPS_FOCUS: &str = "\
ANALYSIS FOCUS:
Analyze table relationships and suggest improvements:
1. Missing relationships: fields that should link to other tables, potential
   many-to-many relationships, lookup opportunities for consistency
2. Relationship configuration: bidirectional vs unidirectional links, link
   field naming, cascade considerations
3. Data integrity: orphaned record potential, referential integrity issues,
   circular references
4. Performance impact of relationship chains and rollup calculations";

const PERFORMANCE_FOCUS: &str = "\
ANALYSIS FOCUS:
Analyze this table for performance improvements:
1. Record count impact: archiving strategies, data lifecycle management
2. Field performance: complex formula fields, lookup chain length, rollup
   calculation efficiency
3. View optimization: excessive view count, complex filtering and sorting,
   grouping impact
4. Query patterns: commonly filtered fields, indexing opportunities, search
   performance";

const DATA_QUALITY_FOCUS: &str = "\
ANALYSIS FOCUS:
Analyze this table for data quality improvements:
1. Data validation: missing validation rules, inconsistent formats, invalid
   data patterns
2. Completeness: fields with high null rates, required fields not enforced,
   missing mandatory relationships
3. Consistency: naming conventions, duplicate record potential, cross-field
   validation rules
4. Standardization: text formatting, date format variations, number precision,
   selection option hygiene";
