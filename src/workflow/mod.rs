//! Quality-gated workflow.
//!
//! Documents move through the spec, plan, tasks and implement phases. Each
//! phase has a gate that checks the document's quality score and the number
//! of recorded revisions before the project may move on.
//!
//! ## Stores
//!
//! - `FsStore` - one directory per project, JSON history under `.specgate/`
//! - `MemoryStore` - in-process, for tests and embedding
//!
//! ## Evaluation
//!
//! - `GateEvaluator` - readiness checks, iteration recording, phase advance
//! - `IterationTracker` - decides whether a revision was a real improvement

pub mod gate;
pub mod iteration;
pub mod store;
pub mod synthesize;

pub use gate::{
    AdvanceDecision, BlockingCondition, GateError, GateEvaluator, GateTable, WorkflowGate,
    WorkflowStatus,
};
pub use iteration::{
    ContentDelta, FeedbackIncorporation, IterationAnalysis, IterationTracker, Modification,
    QualityImprovement,
};
pub use store::{
    DocumentStore, FsStore, IterationRecord, IterationStore, MemoryStore, PhaseArtifact,
    StoreError, WorkflowStore,
};
pub use synthesize::{synthesize, PhaseParams};
