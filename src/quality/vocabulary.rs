//! Fixed word lists used by the quality analyzers.
//!
//! Every table keyed by phase matches exhaustively on [`Phase`].

use crate::core::Phase;

/// A section every document of a phase is expected to have.
#[derive(Debug, Clone, Copy)]
pub struct RequiredSection {
    /// Display name
    pub name: &'static str,
    /// Lowercase substrings that identify the section in a heading
    pub aliases: &'static [&'static str],
}

/// A content category scored by keyword coverage.
#[derive(Debug, Clone, Copy)]
pub struct ContentCategory {
    /// Display name
    pub name: &'static str,
    /// Lowercase keywords; a keyword counts once however often it appears
    pub keywords: &'static [&'static str],
}

const fn section(name: &'static str, aliases: &'static [&'static str]) -> RequiredSection {
    RequiredSection { name, aliases }
}

const fn category(name: &'static str, keywords: &'static [&'static str]) -> ContentCategory {
    ContentCategory { name, keywords }
}

const SPEC_SECTIONS: [RequiredSection; 7] = [
    section("Overview", &["overview", "summary", "introduction", "purpose", "background"]),
    section("Users", &["user", "persona", "audience", "stakeholder", "actor"]),
    section("Requirements", &["requirement", "feature", "functional", "capabilit"]),
    section("Success Criteria", &["success", "criteria", "acceptance", "metric", "outcome"]),
    section("Constraints", &["constraint", "limitation", "assumption", "dependenc"]),
    section("Scope", &["scope", "non-goal", "out of scope", "boundar"]),
    section("Risks", &["risk", "edge case", "open question", "unknown"]),
];

const PLAN_SECTIONS: [RequiredSection; 7] = [
    section("Architecture", &["architecture", "design", "overview", "approach"]),
    section("Technology Stack", &["technology", "stack", "tooling", "dependenc", "framework"]),
    section("Data Model", &["data", "model", "schema", "entit", "storage"]),
    section("Components", &["component", "module", "service", "interface", "api"]),
    section("Milestones", &["phase", "milestone", "timeline", "roadmap", "schedule"]),
    section("Testing", &["test", "verification", "validation", "quality"]),
    section("Risks", &["risk", "mitigation", "trade-off", "tradeoff"]),
];

const TASKS_SECTIONS: [RequiredSection; 6] = [
    section("Overview", &["overview", "summary", "context", "goal"]),
    section("Task List", &["task", "work item", "backlog", "checklist"]),
    section("Dependencies", &["dependenc", "prerequisite", "order", "sequenc"]),
    section("Estimates", &["estimate", "effort", "size", "sizing"]),
    section("Acceptance", &["acceptance", "done", "criteria", "definition"]),
    section("Testing", &["test", "verif", "validation"]),
];

const IMPLEMENT_SECTIONS: [RequiredSection; 6] = [
    section("Overview", &["overview", "summary", "context"]),
    section("Changes", &["change", "implementation", "approach", "solution"]),
    section("Files", &["file", "module", "component", "structure"]),
    section("Testing", &["test", "verification", "validation"]),
    section("Deployment", &["deploy", "release", "rollout", "migration"]),
    section("Documentation", &["documentation", "docs", "notes", "follow-up"]),
];

/// Sections a document of `phase` is expected to contain.
pub fn required_sections(phase: Phase) -> &'static [RequiredSection] {
    match phase {
        Phase::Spec => &SPEC_SECTIONS,
        Phase::Plan => &PLAN_SECTIONS,
        Phase::Tasks => &TASKS_SECTIONS,
        Phase::Implement => &IMPLEMENT_SECTIONS,
    }
}

const SPEC_CATEGORIES: [ContentCategory; 4] = [
    category("User Definition", &["user", "persona", "audience", "customer", "stakeholder", "role"]),
    category(
        "Functional Requirements",
        &["feature", "requirement", "must", "shall", "capability", "function"],
    ),
    category("Success Criteria", &["goal", "criteria", "metric", "measure", "success", "outcome"]),
    category("Constraints", &["constraint", "limit", "assumption", "dependency", "budget", "deadline"]),
];

const PLAN_CATEGORIES: [ContentCategory; 4] = [
    category("Architecture", &["architecture", "component", "layer", "module", "service", "pattern"]),
    category("Technology", &["language", "framework", "library", "database", "stack", "version"]),
    category("Data Model", &["data", "model", "schema", "entity", "field", "relationship"]),
    category("Delivery", &["milestone", "phase", "timeline", "risk", "test", "deploy"]),
];

const TASKS_CATEGORIES: [ContentCategory; 4] = [
    category("Task Breakdown", &["task", "step", "subtask", "story", "item", "checklist"]),
    category("Ordering", &["depends", "dependency", "before", "after", "blocked", "parallel"]),
    category("Estimation", &["estimate", "hour", "day", "point", "effort", "size"]),
    category("Verification", &["test", "verify", "acceptance", "done", "review", "check"]),
];

const IMPLEMENT_CATEGORIES: [ContentCategory; 4] = [
    category("Code Changes", &["file", "function", "module", "change", "implement", "refactor"]),
    category("Testing", &["test", "unit", "integration", "coverage", "assert", "fixture"]),
    category("Error Handling", &["error", "failure", "retry", "fallback", "exception", "validation"]),
    category("Operations", &["deploy", "config", "log", "monitor", "migration", "rollback"]),
];

/// Content categories scored for `phase`.
pub fn content_categories(phase: Phase) -> &'static [ContentCategory; 4] {
    match phase {
        Phase::Spec => &SPEC_CATEGORIES,
        Phase::Plan => &PLAN_CATEGORIES,
        Phase::Tasks => &TASKS_CATEGORIES,
        Phase::Implement => &IMPLEMENT_CATEGORIES,
    }
}

/// Look up a category of `phase` by name, ignoring case.
pub fn find_category(phase: Phase, name: &str) -> Option<&'static ContentCategory> {
    content_categories(phase).iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Words that signal a logical transition between paragraphs.
pub const LOGICAL_CONNECTORS: &[&str] = &[
    "therefore",
    "however",
    "furthermore",
    "moreover",
    "additionally",
    "consequently",
    "because",
    "thus",
    "hence",
    "since",
    "first",
    "second",
    "finally",
    "then",
    "next",
    "as a result",
    "in addition",
    "for example",
    "in contrast",
    "similarly",
    "meanwhile",
    "subsequently",
    "accordingly",
];

/// Hedging words.
pub const HEDGES: &[&str] =
    &["might", "may", "could", "possibly", "perhaps", "probably", "maybe", "likely"];

/// Quantities without a number.
pub const VAGUE_QUANTIFIERS: &[&str] =
    &["some", "many", "few", "several", "various", "a lot", "lots of", "most", "numerous"];

/// Qualities without a measure.
pub const VAGUE_QUALIFIERS: &[&str] = &[
    "fast",
    "quick",
    "easy",
    "simple",
    "user-friendly",
    "intuitive",
    "robust",
    "scalable",
    "efficient",
    "flexible",
    "good",
    "nice",
    "appropriate",
    "reasonable",
    "adequate",
    "seamless",
];

/// Placeholder phrases.
pub const VAGUE_PHRASES: &[&str] = &[
    "etc",
    "and so on",
    "as needed",
    "if necessary",
    "as appropriate",
    "tbd",
    "to be determined",
    "and/or",
    "somehow",
    "something like",
];

/// Families of interchangeable terms; using more than one member is inconsistent.
pub const TERM_FAMILIES: &[&[&str]] = &[
    &["user", "customer", "client"],
    &["login", "log in", "sign in", "signin"],
    &["setup", "set up", "set-up"],
    &["email", "e-mail"],
    &["database", "db", "datastore"],
    &["frontend", "front-end", "front end"],
    &["backend", "back-end", "back end"],
    &["config", "configuration", "settings"],
];

/// Words ignored when extracting key terms from a suggestion.
pub const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "and", "any", "are", "because", "been", "before",
    "being", "below", "between", "both", "but", "can", "could", "does", "doing", "down", "during",
    "each", "every", "few", "for", "from", "further", "have", "having", "here", "into", "just",
    "least", "more", "most", "much", "must", "need", "needs", "only", "other", "over", "own",
    "same", "should", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "under", "until", "very", "were", "what", "when",
    "where", "which", "while", "with", "within", "without", "would", "your", "make", "sure",
    "consider", "ensure", "please",
];

/// Fixed guidance appended to every assessment of `phase`.
pub fn phase_guidance(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Spec => &[
            "Describe who the users are and what problem they have",
            "State measurable success criteria",
            "List constraints and explicit non-goals",
        ],
        Phase::Plan => &[
            "Justify the architecture against the specification's requirements",
            "Name concrete technologies and versions",
            "Break delivery into milestones with testing strategy",
        ],
        Phase::Tasks => &[
            "Make each task small enough to finish in a day",
            "Record dependencies between tasks",
            "Give every task a verifiable done condition",
        ],
        Phase::Implement => &[
            "Cover new code paths with tests",
            "Document error handling and failure modes",
            "Describe deployment and rollback steps",
        ],
    }
}
