//! Document quality assessment.
//!
//! Text is split into sections, scored along four weighted dimensions and
//! combined into a single assessment with a severity tier and
//! recommendations.

pub mod assessment;
pub mod dimensions;
pub mod sections;
pub mod vocabulary;

pub use assessment::{analyze, QualityAssessment, QualityDimension, QualityEngine, Severity};
pub use dimensions::{
    AnalysisError, ClarityAnalyzer, CompletenessAnalyzer, ConsistencyAnalyzer, Dimension,
    DimensionAnalyzer, DimensionScore, Document, StructuralAnalyzer,
};
pub use sections::{extract_sections, Section};
