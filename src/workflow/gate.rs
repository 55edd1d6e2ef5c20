//! Phase gates.
//!
//! A gate decides whether a project may leave a phase: the phase's artifact
//! must exist, score at least the gate's required quality, and have at least
//! the required number of recorded iterations.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;

use super::iteration::IterationTracker;
use super::store::{IterationRecord, PhaseArtifact, StoreError, WorkflowStore};
use super::synthesize::{synthesize, PhaseParams};
use crate::core::{settle, Config, GatesConfig, Phase, PhaseParseError};
use crate::quality::dimensions::{count_terms, Boundary};
use crate::quality::vocabulary::find_category;
use crate::quality::{QualityAssessment, QualityEngine, Severity};

/// Score given to a non-empty directory artifact without full assessment.
pub const DIRECTORY_PASS_SCORE: u32 = 70;

/// Recommendations quoted as blocking reasons when quality falls short.
const MAX_RECOMMENDATION_REASONS: usize = 3;

/// Errors raised while evaluating a gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The document or history store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A phase has no document to record.
    #[error("No {phase} document found for project '{project}'")]
    NoDocument { project: String, phase: Phase },
}

/// A condition that can block a phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingCondition {
    /// The phase artifact does not exist
    MissingDocument,
    /// The quality score is below the gate's requirement
    QualityBelowRequired,
    /// Too few iterations have been recorded
    InsufficientIterations,
}

const ALL_CONDITIONS: [BlockingCondition; 3] = [
    BlockingCondition::MissingDocument,
    BlockingCondition::QualityBelowRequired,
    BlockingCondition::InsufficientIterations,
];

/// Requirements for leaving one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowGate {
    pub phase: Phase,
    /// Minimum overall score (0-100)
    pub required_quality: u32,
    /// Minimum recorded iterations
    pub required_iterations: usize,
    /// Content categories the document must touch
    pub required_content: Vec<&'static str>,
    /// Conditions this gate enforces
    pub blocking_conditions: Vec<BlockingCondition>,
}

impl WorkflowGate {
    /// Built-in gate for `phase`.
    pub fn builtin(phase: Phase) -> Self {
        let (required_quality, required_iterations) = match phase {
            Phase::Spec => (75, 2),
            Phase::Plan => (80, 2),
            Phase::Tasks => (70, 1),
            Phase::Implement => (70, 1),
        };
        let required_content: &[&'static str] = match phase {
            Phase::Spec => &["User Definition", "Functional Requirements", "Success Criteria"],
            Phase::Plan => &["Architecture", "Technology", "Data Model"],
            Phase::Tasks => &["Task Breakdown", "Verification"],
            Phase::Implement => &["Code Changes", "Testing"],
        };

        Self {
            phase,
            required_quality,
            required_iterations,
            required_content: required_content.to_vec(),
            blocking_conditions: ALL_CONDITIONS.to_vec(),
        }
    }

    /// Whether this gate enforces `condition`.
    pub fn enforces(&self, condition: BlockingCondition) -> bool {
        self.blocking_conditions.contains(&condition)
    }
}

/// One gate per phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateTable {
    gates: [WorkflowGate; 4],
}

impl Default for GateTable {
    fn default() -> Self {
        Self { gates: Phase::ALL.map(WorkflowGate::builtin) }
    }
}

impl GateTable {
    /// Built-in gates with any configured overrides applied.
    pub fn from_config(config: &GatesConfig) -> Self {
        let mut table = Self::default();
        for gate in &mut table.gates {
            let overrides = config.for_phase(gate.phase);
            if let Some(quality) = overrides.required_quality {
                gate.required_quality = quality;
            }
            if let Some(iterations) = overrides.required_iterations {
                gate.required_iterations = iterations;
            }
        }
        table
    }

    /// Gate for `phase`.
    pub fn get(&self, phase: Phase) -> &WorkflowGate {
        match phase {
            Phase::Spec => &self.gates[0],
            Phase::Plan => &self.gates[1],
            Phase::Tasks => &self.gates[2],
            Phase::Implement => &self.gates[3],
        }
    }

    /// Resolve a phase name to its gate.
    pub fn resolve(&self, name: &str) -> Result<&WorkflowGate, PhaseParseError> {
        Ok(self.get(name.parse()?))
    }

    /// Gates in workflow order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkflowGate> {
        self.gates.iter()
    }
}

/// Outcome of a readiness check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStatus {
    pub project: String,
    /// Phase checked, `None` when the requested name was not a phase
    pub current_phase: Option<Phase>,
    pub can_proceed: bool,
    /// Ranked reasons the gate is closed
    pub blocking_reasons: Vec<String>,
    pub quality_score: u32,
    /// Severity of the full assessment, if one ran
    pub severity: Option<Severity>,
    pub required_quality: u32,
    pub required_iterations: usize,
    /// Recorded history length
    pub iteration_count: usize,
    /// Recorded iterations judged meaningful
    pub meaningful_iterations: usize,
    pub recommendations: Vec<String>,
    pub document_exists: bool,
    /// The score came from a synthesized document
    pub synthetic: bool,
    /// Why the score is approximate, if it is
    pub degraded: Option<String>,
}

impl WorkflowStatus {
    fn unknown_phase(project: &str, error: &PhaseParseError) -> Self {
        Self {
            project: project.to_string(),
            current_phase: None,
            can_proceed: false,
            blocking_reasons: vec![error.to_string()],
            quality_score: 0,
            severity: None,
            required_quality: 0,
            required_iterations: 0,
            iteration_count: 0,
            meaningful_iterations: 0,
            recommendations: Vec::new(),
            document_exists: false,
            synthetic: false,
            degraded: None,
        }
    }

    /// Render a markdown report.
    pub fn to_markdown(&self) -> String {
        let phase = self.current_phase.map_or("unknown", Phase::as_str);
        let mut md = format!("# Gate: {} / {phase}\n\n", self.project);
        let _ = writeln!(
            md,
            "- **Status:** {}",
            if self.can_proceed { "ready to proceed" } else { "blocked" }
        );
        let _ = write!(md, "- **Quality:** {}/{}", self.quality_score, self.required_quality);
        if let Some(severity) = self.severity {
            let _ = write!(md, " ({severity})");
        }
        if self.synthetic {
            md.push_str(" [synthetic]");
        }
        md.push('\n');
        let _ = writeln!(
            md,
            "- **Iterations:** {}/{} ({} meaningful)",
            self.iteration_count, self.required_iterations, self.meaningful_iterations
        );
        if let Some(reason) = &self.degraded {
            let _ = writeln!(md, "- **Approximate:** {reason}");
        }

        if !self.blocking_reasons.is_empty() {
            md.push_str("\n## Blocking\n\n");
            for reason in &self.blocking_reasons {
                let _ = writeln!(md, "- {reason}");
            }
        }

        if !self.recommendations.is_empty() {
            md.push_str("\n## Recommendations\n\n");
            for rec in &self.recommendations {
                let _ = writeln!(md, "- {rec}");
            }
        }

        md
    }
}

/// Result of asking to leave a phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdvanceDecision {
    /// The gate passed and the workflow moves on
    Advance { from: Phase, to: Phase, status: WorkflowStatus },
    /// The final phase's gate passed
    Complete { status: WorkflowStatus },
    /// The gate is closed
    Blocked { status: WorkflowStatus },
}

impl AdvanceDecision {
    /// The gate status behind the decision.
    pub fn status(&self) -> &WorkflowStatus {
        match self {
            Self::Advance { status, .. } | Self::Complete { status } | Self::Blocked { status } => {
                status
            }
        }
    }
}

/// How a phase artifact was scored.
struct Scored {
    document_exists: bool,
    synthetic: bool,
    quality_score: u32,
    assessment: Option<QualityAssessment>,
    degraded: Option<String>,
    missing_content: Vec<String>,
}

impl Scored {
    fn missing() -> Self {
        Self {
            document_exists: false,
            synthetic: false,
            quality_score: 0,
            assessment: None,
            degraded: None,
            missing_content: Vec::new(),
        }
    }
}

/// Evaluates phase gates against a store.
pub struct GateEvaluator {
    store: Arc<dyn WorkflowStore>,
    gates: GateTable,
    engine: QualityEngine,
    tracker: IterationTracker,
    synthetic_confidence: f64,
}

impl GateEvaluator {
    /// Create an evaluator using `config` for gates, analysis and tracking.
    pub fn new(store: Arc<dyn WorkflowStore>, config: &Config) -> Self {
        Self {
            store,
            gates: GateTable::from_config(&config.gates),
            engine: QualityEngine::new(&config.analysis),
            tracker: IterationTracker::new(config.tracker.clone()),
            synthetic_confidence: config.analysis.synthetic_confidence,
        }
    }

    /// Replace the quality engine.
    pub fn with_engine(mut self, engine: QualityEngine) -> Self {
        self.engine = engine;
        self
    }

    /// The gate table in use.
    pub fn gates(&self) -> &GateTable {
        &self.gates
    }

    /// Check whether `project` may leave the phase named `phase`.
    ///
    /// An unknown phase name fails the check with a single blocking reason
    /// and no scoring.
    pub async fn check_phase_readiness(
        &self,
        project: &str,
        phase: &str,
        params: Option<&PhaseParams>,
    ) -> Result<WorkflowStatus, GateError> {
        match phase.parse::<Phase>() {
            Ok(phase) => self.check(project, phase, params).await,
            Err(e) => {
                tracing::warn!(project, phase, "Unknown phase requested");
                Ok(WorkflowStatus::unknown_phase(project, &e))
            }
        }
    }

    /// Check whether `project` may leave `phase`.
    pub async fn check(
        &self,
        project: &str,
        phase: Phase,
        params: Option<&PhaseParams>,
    ) -> Result<WorkflowStatus, GateError> {
        let gate = self.gates.get(phase);
        let scored = self.score_artifact(project, phase, params).await?;

        let history = self.store.read_history(project, phase).await?;
        let iteration_count = history.len();
        let meaningful_iterations = history.iter().filter(|r| r.is_meaningful()).count();

        let mut recommendations = scored.missing_content.clone();
        if let Some(assessment) = &scored.assessment {
            recommendations.extend(assessment.recommendations.iter().cloned());
        }

        let missing = gate.enforces(BlockingCondition::MissingDocument) && !scored.document_exists;
        let quality_short = gate.enforces(BlockingCondition::QualityBelowRequired)
            && scored.quality_score < gate.required_quality;
        let iterations_short = gate.enforces(BlockingCondition::InsufficientIterations)
            && iteration_count < gate.required_iterations;

        let mut blocking_reasons = Vec::new();
        if missing {
            let mut reason = format!(
                "{} document is missing (expected {})",
                phase.display_name(),
                phase.artifact_name()
            );
            if scored.synthetic {
                reason.push_str("; the score is an estimate from the supplied parameters");
            }
            blocking_reasons.push(reason);
        }
        if quality_short {
            blocking_reasons.push(format!(
                "Quality score {} is below the required {} ({} points short)",
                scored.quality_score,
                gate.required_quality,
                gate.required_quality - scored.quality_score
            ));
        }
        if iterations_short {
            blocking_reasons.push(format!(
                "{iteration_count} of {} required iterations recorded ({} more needed)",
                gate.required_iterations,
                gate.required_iterations - iteration_count
            ));
        }
        if quality_short {
            blocking_reasons.extend(recommendations.iter().take(MAX_RECOMMENDATION_REASONS).cloned());
        }

        let can_proceed = !missing && !quality_short && !iterations_short;

        tracing::info!(
            project,
            phase = %phase,
            can_proceed,
            quality = scored.quality_score,
            iterations = iteration_count,
            "Gate evaluated"
        );

        Ok(WorkflowStatus {
            project: project.to_string(),
            current_phase: Some(phase),
            can_proceed,
            blocking_reasons,
            quality_score: scored.quality_score,
            severity: scored.assessment.as_ref().map(|a| a.severity),
            required_quality: gate.required_quality,
            required_iterations: gate.required_iterations,
            iteration_count,
            meaningful_iterations,
            recommendations,
            document_exists: scored.document_exists,
            synthetic: scored.synthetic,
            degraded: scored.degraded,
        })
    }

    /// Score `content` as a new revision of `phase`, compare it with the
    /// previous revision and append it to the history.
    ///
    /// Returns the one-line summary of the comparison.
    pub async fn record_iteration(
        &self,
        project: &str,
        phase: Phase,
        content: &str,
    ) -> Result<String, GateError> {
        let (assessment, degraded) = settle(self.engine.assess(content, phase));
        if let Some(reason) = &degraded {
            tracing::warn!(project, phase = %phase, reason = %reason, "Recording approximate score");
        }

        let history = self.store.read_history(project, phase).await?;
        let iteration_number = history.len() + 1;
        let analysis = match history.last() {
            Some(previous) => {
                if let Some(reason) = &previous.degraded {
                    tracing::debug!(
                        project,
                        phase = %phase,
                        reason = %reason,
                        "Previous score was approximate"
                    );
                }
                self.tracker.analyze(
                    iteration_number,
                    &previous.content,
                    content,
                    previous.quality_score,
                    assessment.overall_score,
                    &previous.suggestions,
                )
            }
            None => self.tracker.analyze(iteration_number, "", content, 0, assessment.overall_score, &[]),
        };

        let summary = analysis.summary.clone();
        let record = IterationRecord::new(
            content.to_string(),
            assessment.overall_score,
            assessment.recommendations,
            Some(analysis),
        )
        .with_degraded(degraded);
        self.store.append_history(project, phase, record).await?;

        tracing::info!(project, phase = %phase, iteration = iteration_number, "Recorded iteration");
        Ok(summary)
    }

    /// Record the stored document of `phase` as a new revision.
    pub async fn record_current(&self, project: &str, phase: Phase) -> Result<String, GateError> {
        match self.store.read_document(project, phase).await? {
            Some(PhaseArtifact::Document(text)) => self.record_iteration(project, phase, &text).await,
            _ => Err(GateError::NoDocument { project: project.to_string(), phase }),
        }
    }

    /// Check `current`'s gate and name the next phase if it passes.
    pub async fn advance(&self, project: &str, current: Phase) -> Result<AdvanceDecision, GateError> {
        let status = self.check(project, current, None).await?;
        let decision = match (status.can_proceed, current.next()) {
            (false, _) => AdvanceDecision::Blocked { status },
            (true, Some(to)) => AdvanceDecision::Advance { from: current, to, status },
            (true, None) => AdvanceDecision::Complete { status },
        };
        Ok(decision)
    }

    async fn score_artifact(
        &self,
        project: &str,
        phase: Phase,
        params: Option<&PhaseParams>,
    ) -> Result<Scored, GateError> {
        let gate = self.gates.get(phase);
        let artifact = self.store.read_document(project, phase).await?;

        let scored = match (artifact, params) {
            (Some(PhaseArtifact::Document(text)), _) => {
                let (assessment, degraded) = settle(self.engine.assess(&text, phase));
                Scored {
                    document_exists: true,
                    synthetic: false,
                    quality_score: assessment.overall_score,
                    assessment: Some(assessment),
                    degraded,
                    missing_content: missing_required_content(gate, &text),
                }
            }
            (Some(PhaseArtifact::Directory(entries)), _) if !entries.is_empty() => {
                tracing::debug!(project, phase = %phase, files = entries.len(), "Directory artifact present");
                Scored {
                    document_exists: true,
                    synthetic: false,
                    quality_score: DIRECTORY_PASS_SCORE,
                    assessment: None,
                    degraded: None,
                    missing_content: Vec::new(),
                }
            }
            (_, Some(params)) => {
                let text = synthesize(phase, params);
                let (assessment, degraded) = settle(self.engine.assess(&text, phase));
                let quality_score =
                    (f64::from(assessment.overall_score) * self.synthetic_confidence).round() as u32;
                tracing::debug!(
                    project,
                    phase = %phase,
                    raw = assessment.overall_score,
                    adjusted = quality_score,
                    "Scored synthesized document"
                );
                Scored {
                    document_exists: false,
                    synthetic: true,
                    quality_score,
                    assessment: Some(assessment),
                    degraded,
                    missing_content: missing_required_content(gate, &text),
                }
            }
            _ => Scored::missing(),
        };

        Ok(scored)
    }
}

impl std::fmt::Debug for GateEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateEvaluator")
            .field("gates", &self.gates)
            .field("engine", &self.engine)
            .field("synthetic_confidence", &self.synthetic_confidence)
            .finish_non_exhaustive()
    }
}

/// Recommendations for required categories with no keyword in `text`.
fn missing_required_content(gate: &WorkflowGate, text: &str) -> Vec<String> {
    gate.required_content
        .iter()
        .filter(|name| !covers_category(text, gate.phase, name))
        .map(|name| format!("Missing required content: {name}"))
        .collect()
}

/// Whether `text` touches at least one keyword of category `name` of `phase`.
pub fn covers_category(text: &str, phase: Phase, name: &str) -> bool {
    let lower = text.to_lowercase();
    find_category(phase, name).is_some_and(|category| {
        category.keywords.iter().any(|kw| count_terms(&lower, kw, Boundary::Prefix) > 0)
    })
}
