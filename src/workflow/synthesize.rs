//! Virtual documents built from caller-supplied parameters.
//!
//! When a phase has no artifact yet, a caller may describe what the document
//! would contain. The gate scores the synthesized text at reduced confidence.

use serde::{Deserialize, Serialize};

use crate::core::Phase;

/// Inline description of a phase document.
///
/// Every field is optional; each phase uses the fields relevant to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseParams {
    /// Document title
    pub title: Option<String>,

    /// One-paragraph overview
    pub summary: Option<String>,

    /// Target users or personas
    pub users: Vec<String>,

    /// Functional requirements
    pub requirements: Vec<String>,

    /// Measurable success criteria
    pub success_criteria: Vec<String>,

    /// Constraints and assumptions
    pub constraints: Vec<String>,

    /// Architecture description
    pub architecture: Option<String>,

    /// Languages, frameworks and libraries
    pub technologies: Vec<String>,

    /// Major components or modules
    pub components: Vec<String>,

    /// Delivery milestones
    pub milestones: Vec<String>,

    /// Work items
    pub tasks: Vec<String>,

    /// Code changes made or planned
    pub changes: Vec<String>,

    /// Tests covering the work
    pub tests: Vec<String>,
}

impl PhaseParams {
    /// Whether no field carries content.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn push_list(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("## {heading}\n\n"));
    for item in items {
        md.push_str(&format!("- {item}\n"));
    }
    md.push('\n');
}

fn push_checklist(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("## {heading}\n\n"));
    for item in items {
        md.push_str(&format!("- [ ] {item}\n"));
    }
    md.push('\n');
}

fn push_paragraph(md: &mut String, heading: &str, text: Option<&str>) {
    if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
        md.push_str(&format!("## {heading}\n\n{text}\n\n"));
    }
}

/// Build a virtual markdown document for `phase` from `params`.
pub fn synthesize(phase: Phase, params: &PhaseParams) -> String {
    let title = params.title.as_deref().unwrap_or_else(|| phase.display_name());
    let mut md = format!("# {title}\n\n");
    let summary = params.summary.as_deref();

    match phase {
        Phase::Spec => {
            push_paragraph(&mut md, "Overview", summary);
            push_list(&mut md, "Users", &params.users);
            push_list(&mut md, "Requirements", &params.requirements);
            push_list(&mut md, "Success Criteria", &params.success_criteria);
            push_list(&mut md, "Constraints", &params.constraints);
        }
        Phase::Plan => {
            push_paragraph(&mut md, "Overview", summary);
            push_paragraph(&mut md, "Architecture", params.architecture.as_deref());
            push_list(&mut md, "Technology Stack", &params.technologies);
            push_list(&mut md, "Components", &params.components);
            push_list(&mut md, "Milestones", &params.milestones);
            push_list(&mut md, "Testing", &params.tests);
        }
        Phase::Tasks => {
            push_paragraph(&mut md, "Overview", summary);
            push_checklist(&mut md, "Task List", &params.tasks);
            push_list(&mut md, "Acceptance Criteria", &params.success_criteria);
            push_list(&mut md, "Testing", &params.tests);
        }
        Phase::Implement => {
            push_paragraph(&mut md, "Overview", summary);
            push_list(&mut md, "Changes", &params.changes);
            push_list(&mut md, "Files", &params.components);
            push_list(&mut md, "Testing", &params.tests);
        }
    }

    md.trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::sections::extract_sections;

    fn spec_params() -> PhaseParams {
        PhaseParams {
            title: Some("Checkout".to_string()),
            summary: Some("A one-page checkout for returning customers.".to_string()),
            users: vec!["Returning customers".to_string()],
            requirements: vec!["Pay with a saved card".to_string()],
            success_criteria: vec!["Checkout completes in under 30 seconds".to_string()],
            ..PhaseParams::default()
        }
    }

    #[test]
    fn test_synthesize_spec() {
        let doc = synthesize(Phase::Spec, &spec_params());
        assert!(doc.starts_with("# Checkout\n"));
        assert!(doc.contains("## Users\n\n- Returning customers"));
        assert!(!doc.contains("## Constraints"));

        let sections = extract_sections(&doc);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].subsections.len(), 4);
    }

    #[test]
    fn test_synthesize_tasks_uses_checklist() {
        let params = PhaseParams {
            tasks: vec!["Add card form".to_string(), "Wire payment API".to_string()],
            ..PhaseParams::default()
        };
        let doc = synthesize(Phase::Tasks, &params);
        assert!(doc.starts_with("# Tasks\n"));
        assert!(doc.contains("- [ ] Add card form\n- [ ] Wire payment API"));
    }

    #[test]
    fn test_empty_params() {
        let params = PhaseParams::default();
        assert!(params.is_empty());
        assert_eq!(synthesize(Phase::Plan, &params), "# Plan\n");
        assert!(!spec_params().is_empty());
    }

    #[test]
    fn test_params_from_json() {
        let params: PhaseParams =
            serde_json::from_str(r#"{"title": "Plan", "technologies": ["Rust 1.82"]}"#).unwrap();
        assert_eq!(params.technologies, vec!["Rust 1.82".to_string()]);
        assert!(params.users.is_empty());
    }
}
