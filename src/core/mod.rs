//! Core types for Specgate.
//!
//! This module contains the fundamental pieces shared by the quality engine
//! and the workflow gate: phases, configuration, and degraded results.

mod config;
mod degradation;
mod phase;

pub use config::{AnalysisConfig, Config, GateOverride, GatesConfig, GeneralConfig, TrackerConfig};
pub use degradation::{settle, with_fallback, Confidence, Degraded};
pub use phase::{ArtifactKind, Phase, PhaseParseError};
