//! Workflow phases.
//!
//! The authoring workflow moves through four fixed phases. Every table keyed
//! by phase (weights, thresholds, gates, required sections) matches on this
//! enum exhaustively, so adding a phase is a compile error until each table
//! handles it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A stage of the authoring workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Specification document
    Spec,
    /// Technical plan document
    Plan,
    /// Task breakdown (directory of task files)
    Tasks,
    /// Implementation artifacts (directory)
    Implement,
}

/// How a phase's artifact is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A single markdown document
    File,
    /// A directory of files
    Directory,
}

impl Phase {
    /// All phases in workflow order.
    pub const ALL: [Self; 4] = [Self::Spec, Self::Plan, Self::Tasks, Self::Implement];

    /// Lowercase identifier used in paths, config keys and CLI arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Plan => "plan",
            Self::Tasks => "tasks",
            Self::Implement => "implement",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Spec => "Specification",
            Self::Plan => "Plan",
            Self::Tasks => "Tasks",
            Self::Implement => "Implementation",
        }
    }

    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Spec => Some(Self::Plan),
            Self::Plan => Some(Self::Tasks),
            Self::Tasks => Some(Self::Implement),
            Self::Implement => None,
        }
    }

    /// Storage shape of this phase's artifact.
    pub fn artifact_kind(self) -> ArtifactKind {
        match self {
            Self::Spec | Self::Plan => ArtifactKind::File,
            Self::Tasks | Self::Implement => ArtifactKind::Directory,
        }
    }

    /// File or directory name of the artifact inside a project.
    pub fn artifact_name(self) -> &'static str {
        match self {
            Self::Spec => "spec.md",
            Self::Plan => "plan.md",
            Self::Tasks => "tasks",
            Self::Implement => "implement",
        }
    }

    /// Minimum content length (characters) expected for a well-developed document.
    pub fn expected_length(self) -> usize {
        match self {
            Self::Spec => 800,
            Self::Plan => 1200,
            Self::Tasks => 600,
            Self::Implement => 1000,
        }
    }

    /// Overall score below which another iteration is required.
    ///
    /// Later phases tolerate less ambiguity.
    pub fn quality_threshold(self) -> u32 {
        match self {
            Self::Spec => 75,
            Self::Plan => 80,
            Self::Tasks => 70,
            Self::Implement => 85,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a phase name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown workflow phase '{0}' (expected one of: spec, plan, tasks, implement)")]
pub struct PhaseParseError(pub String);

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spec" | "specify" | "specification" => Ok(Self::Spec),
            "plan" => Ok(Self::Plan),
            "tasks" | "task" => Ok(Self::Tasks),
            "implement" | "implementation" => Ok(Self::Implement),
            _ => Err(PhaseParseError(s.to_string())),
        }
    }
}
