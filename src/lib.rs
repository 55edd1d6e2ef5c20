#![allow(dead_code)]
#![allow(clippy::format_push_string)]
#![allow(clippy::unused_self)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_arguments)]

//! # Specgate
//!
//! Quality gates for a phased document-authoring workflow.
//!
//! A project moves from specification to plan to tasks to implementation.
//! Specgate scores each phase's document along four weighted dimensions and
//! only lets the project advance once the document is good enough and has
//! been revised a minimum number of times.
//!
//! ## Features
//!
//! - **Quality assessment**: structural, completeness, clarity and consistency scores
//! - **Phase gates**: required quality and iteration counts per phase
//! - **Iteration tracking**: word-level diffs, score deltas and feedback incorporation
//! - **Degraded scoring**: an approximate score when an analyzer fails, flagged as such
//!
//! ## Quick Start
//!
//! ```bash
//! # Score a document
//! specgate analyze spec.md --phase spec
//!
//! # Record a revision, then check the gate
//! specgate record checkout spec
//! specgate check checkout spec
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::redundant_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod core;
pub mod quality;
pub mod workflow;

// Re-export commonly used types
pub use crate::core::{Config, Confidence, Degraded, Phase, PhaseParseError};
pub use quality::{analyze, QualityAssessment, QualityEngine, Severity};
pub use workflow::{
    AdvanceDecision, FsStore, GateError, GateEvaluator, IterationTracker, MemoryStore, PhaseParams,
    WorkflowStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "specgate";
