//! # Quality Scorer
//!
//! Converts a parsed `Finding` into a `ScoredFinding` with a weighted
//! composite quality score and a discrete band. Pure and deterministic:
//! scoring the same finding twice yields the same score.
//!
//! Composite components and weights:
//!
//! | component       | weight | signal                                          |
//! |-----------------|--------|-------------------------------------------------|
//! | confidence      | 0.30   | model-reported confidence score                 |
//! | content_quality | 0.25   | description/recommendation depth, no boilerplate|
//! | actionability   | 0.20   | implementation steps and concrete action verbs  |
//! | specificity     | 0.15   | quantified improvement, category alignment      |
//! | consistency     | 0.10   | priority not contradicted by low confidence     |

use crate::constants::quality_bands;
use crate::models::{
    AnalysisCategory, Effort, Finding, Priority, QualityBand, QualityBreakdown, ScoredFinding,
};

const MIN_DESCRIPTION_LEN: usize = 20;
const MIN_RECOMMENDATION_LEN: usize = 30;

/// Hedging language that signals a boilerplate or low-commitment finding
const VAGUE_PHRASES: [&str; 6] = [
    "maybe",
    "possibly",
    "might",
    "could be",
    "perhaps",
    "potentially",
];

/// Verbs that indicate a recommendation the operator can act on
const ACTION_VERBS: [&str; 9] = [
    "create",
    "add",
    "remove",
    "update",
    "modify",
    "implement",
    "configure",
    "set up",
    "change",
];

/// Schema vocabulary expected in a concrete recommendation
const SCHEMA_TERMS: [&str; 7] = [
    "field",
    "table",
    "view",
    "formula",
    "relationship",
    "validation",
    "record",
];

/// Component weights for the composite quality score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityWeights {
    pub confidence: f64,
    pub content_quality: f64,
    pub actionability: f64,
    pub specificity: f64,
    pub consistency: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            confidence: 0.30,
            content_quality: 0.25,
            actionability: 0.20,
            specificity: 0.15,
            consistency: 0.10,
        }
    }
}

/// Pure scorer for parsed findings
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    weights: QualityWeights,
}

impl QualityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: QualityWeights) -> Self {
        Self { weights }
    }

    /// Score a finding for its category. Output is always in [0, 1].
    pub fn score(&self, finding: &Finding, category: AnalysisCategory) -> ScoredFinding {
        let breakdown = QualityBreakdown {
            confidence: finding.confidence_score.clamp(0.0, 1.0),
            content_quality: content_quality(finding),
            actionability: actionability(finding),
            specificity: specificity(finding, category),
            consistency: consistency(finding),
        };

        let quality_score = (self.weights.confidence * breakdown.confidence
            + self.weights.content_quality * breakdown.content_quality
            + self.weights.actionability * breakdown.actionability
            + self.weights.specificity * breakdown.specificity
            + self.weights.consistency * breakdown.consistency)
            .clamp(0.0, 1.0);

        ScoredFinding {
            finding: finding.clone(),
            quality_score,
            quality_band: band_for(quality_score),
            breakdown,
        }
    }
}

/// Map a continuous score to its discrete band
fn band_for(score: f64) -> QualityBand {
    if score >= quality_bands::HIGH {
        QualityBand::High
    } else if score >= quality_bands::ACCEPTABLE {
        QualityBand::Acceptable
    } else if score >= quality_bands::REVIEW {
        QualityBand::Review
    } else {
        QualityBand::Rejected
    }
}

fn content_quality(finding: &Finding) -> f64 {
    let mut score: f64 = 1.0;

    if finding.description.trim().len() < MIN_DESCRIPTION_LEN {
        score -= 0.3;
    }
    if finding.recommendation.trim().len() < MIN_RECOMMENDATION_LEN {
        score -= 0.3;
    }

    let combined = format!(
        "{} {}",
        finding.description.to_lowercase(),
        finding.recommendation.to_lowercase()
    );
    let vague_count = VAGUE_PHRASES
        .iter()
        .filter(|phrase| combined.contains(*phrase))
        .count();
    if vague_count > 2 {
        score -= 0.2;
    }

    if !has_quantified_language(&finding.recommendation) {
        score -= 0.1;
    }

    score.max(0.0)
}

fn actionability(finding: &Finding) -> f64 {
    let mut score: f64 = 1.0;

    if finding.implementation_steps.is_empty() {
        score -= 0.4;
    }

    let recommendation = finding.recommendation.to_lowercase();
    if !ACTION_VERBS.iter().any(|verb| recommendation.contains(verb)) {
        score -= 0.3;
    }

    if !SCHEMA_TERMS.iter().any(|term| recommendation.contains(term)) {
        score -= 0.1;
    }

    score.max(0.0)
}

fn specificity(finding: &Finding, category: AnalysisCategory) -> f64 {
    let mut score: f64 = 1.0;

    match &finding.estimated_improvement {
        Some(estimate) if estimate.chars().any(|c| c.is_ascii_digit()) => {}
        _ => score -= 0.4,
    }

    let content = format!(
        "{} {}",
        finding.description.to_lowercase(),
        finding.recommendation.to_lowercase()
    );
    if !category_keywords(category)
        .iter()
        .any(|keyword| content.contains(keyword))
    {
        score -= 0.3;
    }

    if !content.contains("table") && !content.contains("field") && !content.contains("record") {
        score -= 0.2;
    }

    score.max(0.0)
}

fn consistency(finding: &Finding) -> f64 {
    let mut score: f64 = 1.0;

    // High priority contradicted by low model confidence
    if finding.priority == Priority::High {
        if finding.confidence_score < 0.4 {
            score -= 0.5;
        } else if finding.confidence_score < 0.7 {
            score -= 0.2;
        }
    }

    let step_count = finding.implementation_steps.len();
    if finding.effort == Effort::Low && step_count > 3 {
        score -= 0.2;
    }
    if finding.effort == Effort::High && step_count < 2 {
        score -= 0.2;
    }

    score.max(0.0)
}

fn has_quantified_language(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.chars().any(|c| c.is_ascii_digit())
        || lower.contains("reduce")
        || lower.contains("increase")
        || lower.contains("improve")
}

/// Vocabulary expected in content aligned with a category
fn category_keywords(category: AnalysisCategory) -> &'static [&'static str] {
    match category {
        AnalysisCategory::Structure => &["field", "organization", "layout", "grouping", "structure"],
        AnalysisCategory::Normalization => {
            &["normalize", "redundancy", "dependency", "split", "duplicate"]
        }
        AnalysisCategory::FieldTypes => &["type", "format", "validation", "constraint"],
        AnalysisCategory::Relationships => &["link", "lookup", "rollup", "reference", "relationship"],
        AnalysisCategory::Performance => &["speed", "load", "query", "index", "performance"],
        AnalysisCategory::DataQuality => {
            &["validation", "consistency", "accuracy", "completeness", "quality"]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_finding() -> Finding {
        Finding {
            issue_type: "redundant_field".to_string(),
            priority: Priority::High,
            description: "The Status and Stage fields duplicate the same lifecycle information"
                .to_string(),
            recommendation:
                "Remove the Stage field and update views to filter on the Status field instead"
                    .to_string(),
            impact: "Eliminates double data entry and drift between the two fields".to_string(),
            effort: Effort::Low,
            estimated_improvement: Some("Removes ~15% of per-record maintenance".to_string()),
            implementation_steps: vec![
                "Audit views referencing Stage".to_string(),
                "Remove the Stage field".to_string(),
            ],
            confidence_score: 0.9,
        }
    }

    fn weak_finding() -> Finding {
        Finding {
            issue_type: "misc".to_string(),
            priority: Priority::High,
            description: "Could be better".to_string(),
            recommendation: "Maybe improve things, possibly, perhaps".to_string(),
            impact: "Unknown".to_string(),
            effort: Effort::High,
            estimated_improvement: None,
            implementation_steps: vec![],
            confidence_score: 0.2,
        }
    }

    #[test]
    fn test_strong_finding_bands_high() {
        let scorer = QualityScorer::new();
        let scored = scorer.score(&strong_finding(), AnalysisCategory::Structure);
        assert!(scored.quality_score >= quality_bands::HIGH);
        assert_eq!(scored.quality_band, QualityBand::High);
    }

    #[test]
    fn test_weak_finding_is_rejected() {
        let scorer = QualityScorer::new();
        let scored = scorer.score(&weak_finding(), AnalysisCategory::Structure);
        assert!(scored.quality_score < quality_bands::REVIEW);
        assert_eq!(scored.quality_band, QualityBand::Rejected);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = QualityScorer::new();
        let finding = strong_finding();
        let first = scorer.score(&finding, AnalysisCategory::Structure);
        let second = scorer.score(&finding, AnalysisCategory::Structure);
        assert_eq!(first.quality_score, second.quality_score);
        assert_eq!(first.breakdown, second.breakdown);
    }

    #[test]
    fn test_score_in_unit_interval_for_out_of_range_confidence() {
        let scorer = QualityScorer::new();
        let mut finding = strong_finding();
        finding.confidence_score = 3.5;
        let scored = scorer.score(&finding, AnalysisCategory::Structure);
        assert!((0.0..=1.0).contains(&scored.quality_score));

        finding.confidence_score = -1.0;
        let scored = scorer.score(&finding, AnalysisCategory::Structure);
        assert!((0.0..=1.0).contains(&scored.quality_score));
    }

    #[test]
    fn test_high_priority_low_confidence_is_penalized() {
        let scorer = QualityScorer::new();
        let mut finding = strong_finding();
        finding.confidence_score = 0.35;

        let mut calibrated = strong_finding();
        calibrated.priority = Priority::Medium;
        calibrated.confidence_score = 0.35;

        let contradicted = scorer.score(&finding, AnalysisCategory::Structure);
        let consistent = scorer.score(&calibrated, AnalysisCategory::Structure);
        assert!(contradicted.quality_score < consistent.quality_score);
    }

    #[test]
    fn test_missing_steps_reduce_actionability() {
        let scorer = QualityScorer::new();
        let mut finding = strong_finding();
        finding.implementation_steps.clear();
        finding.effort = Effort::Medium;
        let without_steps = scorer.score(&finding, AnalysisCategory::Structure);
        let with_steps = scorer.score(&strong_finding(), AnalysisCategory::Structure);
        assert!(without_steps.breakdown.actionability < with_steps.breakdown.actionability);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(band_for(0.8), QualityBand::High);
        assert_eq!(band_for(0.79), QualityBand::Acceptable);
        assert_eq!(band_for(0.7), QualityBand::Acceptable);
        assert_eq!(band_for(0.69), QualityBand::Review);
        assert_eq!(band_for(0.5), QualityBand::Review);
        assert_eq!(band_for(0.49), QualityBand::Rejected);
    }
}
