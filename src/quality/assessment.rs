//! Quality assessment engine.
//!
//! Combines the four dimension scores into an overall 0-100 score, derives a
//! severity tier and decides whether the document needs another iteration.
//! If an analyzer fails, a simplified keyword/length scorer produces a
//! [`Degraded`](crate::core::Degraded) assessment instead of aborting.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dimensions::{
    count_terms, AnalysisError, Boundary, ClarityAnalyzer, CompletenessAnalyzer,
    ConsistencyAnalyzer, Dimension, DimensionAnalyzer, DimensionScore, Document,
    StructuralAnalyzer,
};
use super::vocabulary::{content_categories, phase_guidance};
use crate::core::{settle, with_fallback, AnalysisConfig, Confidence, Phase};

/// Dimension score below which the assessment is critical.
const CRITICAL_FLOOR: f64 = 0.4;
/// Dimension score below which the assessment is at least major.
const MAJOR_FLOOR: f64 = 0.6;
/// Dimension score below which another iteration is required.
const ITERATION_FLOOR: f64 = 0.5;
/// Dimension score below which the dimension's issues become recommendations.
const RECOMMENDATION_FLOOR: f64 = 0.6;

/// Overall health tier of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Acceptable,
}

impl Severity {
    /// Classify an overall score and its dimensions.
    pub fn classify(overall_score: u32, dimensions: &[QualityDimension]) -> Self {
        let lowest = dimensions.iter().map(|d| d.score).fold(f64::INFINITY, f64::min);
        if overall_score < 50 || lowest < CRITICAL_FLOOR {
            Self::Critical
        } else if overall_score < 70 || lowest < MAJOR_FLOOR {
            Self::Major
        } else if overall_score < 85 {
            Self::Minor
        } else {
            Self::Acceptable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Acceptable => "acceptable",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored quality dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDimension {
    /// Which dimension
    pub dimension: Dimension,
    /// Display name
    pub name: String,
    /// Score in [0, 1]
    pub score: f64,
    /// Weight in [0, 1]
    pub weight: f64,
    /// Supporting observations
    pub details: Vec<String>,
    /// Problems worth fixing
    pub issues: Vec<String>,
}

impl QualityDimension {
    fn from_score(dimension: Dimension, score: DimensionScore) -> Self {
        Self {
            dimension,
            name: dimension.name().to_string(),
            score: score.score,
            weight: dimension.weight(),
            details: score.details,
            issues: score.issues,
        }
    }
}

/// Result of assessing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Phase the document was scored for
    pub phase: Phase,
    /// Weighted score in [0, 100]
    pub overall_score: u32,
    /// The four dimensions, in [`Dimension::ALL`] order
    pub dimensions: Vec<QualityDimension>,
    /// Health tier
    pub severity: Severity,
    /// Issues from weak dimensions followed by phase guidance
    pub recommendations: Vec<String>,
    /// Whether another revision is needed before the phase is done
    pub requires_iteration: bool,
}

impl QualityAssessment {
    /// Compose an assessment from scored dimensions.
    pub fn compose(phase: Phase, dimensions: Vec<QualityDimension>) -> Self {
        let weighted: f64 = dimensions.iter().map(|d| d.score * d.weight).sum();
        let overall_score = (weighted * 100.0).round().clamp(0.0, 100.0) as u32;
        let severity = Severity::classify(overall_score, &dimensions);
        let requires_iteration = overall_score < phase.quality_threshold()
            || dimensions.iter().any(|d| d.score < ITERATION_FLOOR);

        let mut recommendations: Vec<String> = dimensions
            .iter()
            .filter(|d| d.score < RECOMMENDATION_FLOOR)
            .flat_map(|d| d.issues.iter().cloned())
            .collect();
        recommendations.extend(phase_guidance(phase).iter().map(|s| (*s).to_string()));

        Self { phase, overall_score, dimensions, severity, recommendations, requires_iteration }
    }

    /// Look up a dimension by kind.
    pub fn dimension(&self, dimension: Dimension) -> Option<&QualityDimension> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }

    /// Render a markdown report.
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {} Quality Assessment\n\n", self.phase.display_name());
        md.push_str(&format!("- **Overall score:** {}/100\n", self.overall_score));
        md.push_str(&format!("- **Severity:** {}\n", self.severity));
        md.push_str(&format!(
            "- **Requires iteration:** {}\n\n",
            if self.requires_iteration { "yes" } else { "no" }
        ));

        md.push_str("## Dimensions\n\n");
        md.push_str("| Dimension | Score | Weight |\n|-----------|-------|--------|\n");
        for dim in &self.dimensions {
            md.push_str(&format!("| {} | {:.2} | {:.2} |\n", dim.name, dim.score, dim.weight));
        }
        md.push('\n');

        for dim in &self.dimensions {
            if dim.details.is_empty() && dim.issues.is_empty() {
                continue;
            }
            md.push_str(&format!("### {}\n\n", dim.name));
            for detail in &dim.details {
                md.push_str(&format!("- {detail}\n"));
            }
            for issue in &dim.issues {
                md.push_str(&format!("- ⚠ {issue}\n"));
            }
            md.push('\n');
        }

        if !self.recommendations.is_empty() {
            md.push_str("## Recommendations\n\n");
            for rec in &self.recommendations {
                md.push_str(&format!("- {rec}\n"));
            }
        }

        md
    }
}

/// Runs the four analyzers and composes their results.
pub struct QualityEngine {
    analyzers: Vec<Box<dyn DimensionAnalyzer>>,
}

impl QualityEngine {
    /// Create an engine with the built-in analyzers.
    pub fn new(config: &AnalysisConfig) -> Self {
        let max = config.max_document_chars;
        Self {
            analyzers: vec![
                Box::new(StructuralAnalyzer::new(max)),
                Box::new(CompletenessAnalyzer::new(max)),
                Box::new(ClarityAnalyzer::new(max)),
                Box::new(ConsistencyAnalyzer::new(max)),
            ],
        }
    }

    /// Replace the analyzer for the dimension `analyzer` scores.
    pub fn with_analyzer(mut self, analyzer: Box<dyn DimensionAnalyzer>) -> Self {
        let dimension = analyzer.dimension();
        self.analyzers.retain(|a| a.dimension() != dimension);
        self.analyzers.push(analyzer);
        self
    }

    /// Assess `text` as a document of `phase`.
    ///
    /// Returns `Err(Degraded)` with an approximate assessment when any
    /// analyzer fails.
    pub fn assess(&self, text: &str, phase: Phase) -> Confidence<QualityAssessment> {
        let doc = Document::parse(text);
        let result = with_fallback(
            || self.assess_document(&doc, phase),
            |err| fallback_assessment(&doc, phase, &err.to_string()),
        );

        match &result {
            Ok(assessment) => tracing::debug!(
                phase = %phase,
                score = assessment.overall_score,
                severity = %assessment.severity,
                requires_iteration = assessment.requires_iteration,
                "Assessed document"
            ),
            Err(degraded) => tracing::warn!(
                phase = %phase,
                score = degraded.value.overall_score,
                reason = %degraded.reason,
                "Analyzer failed, using fallback scorer"
            ),
        }

        result
    }

    fn assess_document(
        &self,
        doc: &Document<'_>,
        phase: Phase,
    ) -> Result<QualityAssessment, AnalysisError> {
        let mut dimensions = Vec::with_capacity(Dimension::ALL.len());
        for dimension in Dimension::ALL {
            let analyzer = self
                .analyzers
                .iter()
                .find(|a| a.dimension() == dimension)
                .ok_or_else(|| AnalysisError::Failed {
                    dimension,
                    message: "no analyzer registered".to_string(),
                })?;
            let score = analyzer.analyze(doc, phase)?;
            dimensions.push(QualityDimension::from_score(dimension, score));
        }
        Ok(QualityAssessment::compose(phase, dimensions))
    }
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl fmt::Debug for QualityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<Dimension> = self.analyzers.iter().map(|a| a.dimension()).collect();
        f.debug_struct("QualityEngine").field("analyzers", &dims).finish()
    }
}

/// Assess `text` with the default engine, accepting a degraded result.
pub fn analyze(text: &str, phase: Phase) -> QualityAssessment {
    settle(QualityEngine::default().assess(text, phase)).0
}

/// Keyword/length approximation used when an analyzer fails.
///
/// Every dimension receives the same approximate score so the composed
/// overall score equals it.
fn fallback_assessment(doc: &Document<'_>, phase: Phase, reason: &str) -> QualityAssessment {
    let score = if doc.is_blank() {
        0.0
    } else {
        let length = (doc.char_count() as f64 / phase.expected_length() as f64).min(1.0);
        let keywords: Vec<&str> =
            content_categories(phase).iter().flat_map(|c| c.keywords.iter().copied()).collect();
        let hits = keywords
            .iter()
            .filter(|kw| count_terms(doc.lowercase(), kw, Boundary::Prefix) > 0)
            .count();
        let coverage = hits as f64 / keywords.len() as f64;
        0.5 * length + 0.5 * coverage
    };

    let dimensions = Dimension::ALL
        .iter()
        .map(|&dimension| QualityDimension {
            dimension,
            name: dimension.name().to_string(),
            score,
            weight: dimension.weight(),
            details: vec!["Approximate score from keyword and length heuristics".to_string()],
            issues: Vec::new(),
        })
        .collect();

    let mut assessment = QualityAssessment::compose(phase, dimensions);
    assessment.recommendations.insert(0, format!("Quality analysis was approximate: {reason}"));
    assessment
}
