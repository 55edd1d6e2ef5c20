//! Quality dimension analyzers.
//!
//! Four independent scorers, each producing a 0-1 score with supporting
//! details and issues. Analyzers are pure functions of the document text and
//! phase; they fail only when the document is outside what they can score.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::sections::{count_words, extract_sections, flatten, heading_levels, Section};
use super::vocabulary::{
    content_categories, required_sections, HEDGES, LOGICAL_CONNECTORS, TERM_FAMILIES,
    VAGUE_PHRASES, VAGUE_QUALIFIERS, VAGUE_QUANTIFIERS,
};
use crate::core::Phase;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+\S").unwrap());
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]+\S").unwrap());
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*```").unwrap());
static CHECKBOX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([ \t]*[-*+][ \t]+)\[[ xX]\]").unwrap());
static REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]\n]*)\]").unwrap());

/// Structural markers at which content depth saturates.
const MARKER_SATURATION: f64 = 10.0;

/// Distinct keywords at which a content category counts as fully covered.
const CATEGORY_SATURATION: usize = 3;

/// The four quality axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Structural,
    Completeness,
    Clarity,
    Consistency,
}

impl Dimension {
    /// All dimensions in reporting order.
    pub const ALL: [Self; 4] = [Self::Structural, Self::Completeness, Self::Clarity, Self::Consistency];

    /// Weight in whole percent. The four weights sum to exactly 100.
    pub fn weight_percent(self) -> u32 {
        match self {
            Self::Structural => 25,
            Self::Completeness => 30,
            Self::Clarity => 25,
            Self::Consistency => 20,
        }
    }

    /// Weight as a fraction.
    pub fn weight(self) -> f64 {
        f64::from(self.weight_percent()) / 100.0
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Structural => "Structural",
            Self::Completeness => "Completeness",
            Self::Clarity => "Clarity",
            Self::Consistency => "Consistency",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of a single analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Score in [0, 1]
    pub score: f64,
    /// Supporting observations
    pub details: Vec<String>,
    /// Problems worth fixing
    pub issues: Vec<String>,
}

impl DimensionScore {
    /// Score for a blank document.
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            details: vec!["Document is empty".to_string()],
            issues: vec!["Document has no content".to_string()],
        }
    }

    fn new(score: f64, details: Vec<String>, issues: Vec<String>) -> Self {
        Self { score: clamp_unit(score), details, issues }
    }
}

/// Errors raised by an analyzer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    /// The document exceeds the configured size limit.
    #[error("document has {chars} characters, limit is {limit}")]
    DocumentTooLarge { chars: usize, limit: usize },

    /// The analyzer could not score the document.
    #[error("{dimension} analysis failed: {message}")]
    Failed { dimension: Dimension, message: String },
}

/// A parsed document shared by all analyzers of one assessment.
#[derive(Debug)]
pub struct Document<'a> {
    /// Raw text
    pub text: &'a str,
    /// Section tree
    pub sections: Vec<Section>,
    lower: String,
    words: usize,
    chars: usize,
}

impl<'a> Document<'a> {
    /// Parse `text` once for every analyzer.
    pub fn parse(text: &'a str) -> Self {
        Self {
            text,
            sections: extract_sections(text),
            lower: text.to_lowercase(),
            words: count_words(text),
            chars: text.chars().count(),
        }
    }

    /// Lowercased text.
    pub fn lowercase(&self) -> &str {
        &self.lower
    }

    /// Whitespace-separated word count.
    pub fn word_count(&self) -> usize {
        self.words
    }

    /// Character count.
    pub fn char_count(&self) -> usize {
        self.chars
    }

    /// Whether the document has no non-whitespace content.
    pub fn is_blank(&self) -> bool {
        self.words == 0
    }

    fn ensure_within(&self, limit: usize) -> Result<(), AnalysisError> {
        if self.chars > limit {
            return Err(AnalysisError::DocumentTooLarge { chars: self.chars, limit });
        }
        Ok(())
    }
}

/// A scorer for one quality dimension.
pub trait DimensionAnalyzer: Send + Sync {
    /// The dimension this analyzer scores.
    fn dimension(&self) -> Dimension;

    /// Score `doc` for `phase`.
    fn analyze(&self, doc: &Document<'_>, phase: Phase) -> Result<DimensionScore, AnalysisError>;
}

/// Section presence, logical flow and content depth.
#[derive(Debug, Clone)]
pub struct StructuralAnalyzer {
    max_chars: usize,
}

/// Keyword coverage of the phase's content categories.
#[derive(Debug, Clone)]
pub struct CompletenessAnalyzer {
    max_chars: usize,
}

/// Density of ambiguous terms.
#[derive(Debug, Clone)]
pub struct ClarityAnalyzer {
    max_chars: usize,
}

/// Terminology, heading format and reference consistency.
#[derive(Debug, Clone)]
pub struct ConsistencyAnalyzer {
    max_chars: usize,
}

macro_rules! impl_new {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// Create an analyzer that refuses documents longer than `max_chars`.
                pub fn new(max_chars: usize) -> Self {
                    Self { max_chars }
                }
            }
        )*
    };
}

impl_new!(StructuralAnalyzer, CompletenessAnalyzer, ClarityAnalyzer, ConsistencyAnalyzer);

impl DimensionAnalyzer for StructuralAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Structural
    }

    fn analyze(&self, doc: &Document<'_>, phase: Phase) -> Result<DimensionScore, AnalysisError> {
        doc.ensure_within(self.max_chars)?;
        if doc.is_blank() {
            return Ok(DimensionScore::empty());
        }

        let mut details = Vec::new();
        let mut issues = Vec::new();

        // Section presence
        let titles: Vec<String> =
            flatten(&doc.sections).iter().map(|s| s.title.to_lowercase()).collect();
        let required = required_sections(phase);
        let mut found = 0usize;
        for req in required {
            if titles.iter().any(|t| req.aliases.iter().any(|alias| t.contains(alias))) {
                found += 1;
            } else {
                issues.push(format!("Missing section: {}", req.name));
            }
        }
        let presence = found as f64 / required.len() as f64;
        details.push(format!("Sections: {found}/{} expected present", required.len()));

        // Logical flow
        let (connected, transitions, flow) = logical_flow(doc.text);
        if transitions > 0 {
            details.push(format!(
                "Logical flow: {connected}/{transitions} paragraph transitions use connectors"
            ));
        }
        if flow < 0.3 {
            issues.push(
                "Few logical connectors between paragraphs; link ideas with words like 'therefore' or 'however'"
                    .to_string(),
            );
        }

        // Content depth
        let expected = phase.expected_length();
        let length_score = ratio(doc.char_count(), expected);
        let markers = structural_markers(doc.text);
        let marker_score = (markers as f64 / MARKER_SATURATION).min(1.0);
        let depth = (length_score + marker_score) / 2.0;
        details.push(format!(
            "Content depth: {:.2} ({} characters, {markers} structural markers)",
            depth,
            doc.char_count()
        ));
        if doc.char_count() < expected {
            issues.push(format!(
                "Content is shorter than expected for a {phase} document ({}/{expected} characters)",
                doc.char_count()
            ));
        }
        if markers < 3 {
            issues.push("Add lists, numbered steps or code blocks to structure the content".to_string());
        }

        let score = 0.3 * presence + 0.4 * flow + 0.3 * depth;
        Ok(DimensionScore::new(score, details, issues))
    }
}

impl DimensionAnalyzer for CompletenessAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Completeness
    }

    fn analyze(&self, doc: &Document<'_>, phase: Phase) -> Result<DimensionScore, AnalysisError> {
        doc.ensure_within(self.max_chars)?;
        if doc.is_blank() {
            return Ok(DimensionScore::empty());
        }

        let mut details = Vec::new();
        let mut issues = Vec::new();
        let categories = content_categories(phase);
        let mut total = 0.0;

        for category in categories {
            let matched = category
                .keywords
                .iter()
                .filter(|kw| count_terms(doc.lowercase(), kw, Boundary::Prefix) > 0)
                .count();
            let needed = CATEGORY_SATURATION.min(category.keywords.len());
            let coverage = ratio(matched, needed);
            total += coverage;

            details.push(format!(
                "{}: {matched}/{} keywords ({:.0}% covered)",
                category.name,
                category.keywords.len(),
                coverage * 100.0
            ));
            if matched == 0 {
                issues.push(format!("Missing content: {}", category.name));
            } else if coverage < 0.5 {
                issues.push(format!(
                    "Thin coverage of {} ({matched} of {needed} keywords needed)",
                    category.name
                ));
            }
        }

        Ok(DimensionScore::new(total / categories.len() as f64, details, issues))
    }
}

impl DimensionAnalyzer for ClarityAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Clarity
    }

    fn analyze(&self, doc: &Document<'_>, _phase: Phase) -> Result<DimensionScore, AnalysisError> {
        doc.ensure_within(self.max_chars)?;
        if doc.is_blank() {
            return Ok(DimensionScore::empty());
        }

        let groups: [(&[&str], &str); 4] = [
            (HEDGES, "Replace hedging words with definite statements"),
            (VAGUE_QUANTIFIERS, "Quantify vague amounts with numbers"),
            (VAGUE_QUALIFIERS, "Define measurable targets for vague qualities"),
            (VAGUE_PHRASES, "Resolve placeholders and open-ended phrases"),
        ];

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut issues = Vec::new();
        for (terms, advice) in groups {
            let mut found = Vec::new();
            for term in terms {
                let n = count_terms(doc.lowercase(), term, Boundary::Whole);
                if n > 0 {
                    counts.insert(*term, n);
                    found.push(*term);
                }
            }
            if !found.is_empty() {
                issues.push(format!("{advice} ({})", found.join(", ")));
            }
        }

        let ambiguous: usize = counts.values().sum();
        let per_hundred = ambiguous as f64 / doc.word_count() as f64 * 100.0;
        let score = (1.0 - per_hundred / 10.0).max(0.0);

        let mut details = vec![format!(
            "{ambiguous} ambiguous terms in {} words ({per_hundred:.1} per 100 words)",
            doc.word_count()
        )];
        if !counts.is_empty() {
            let mut frequent: Vec<_> = counts.iter().collect();
            frequent.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let top: Vec<String> =
                frequent.iter().take(5).map(|(term, n)| format!("{term} ({n})")).collect();
            details.push(format!("Most frequent: {}", top.join(", ")));
        }
        if per_hundred > 2.0 {
            issues.insert(0, format!("High ambiguity: {per_hundred:.1} vague terms per 100 words"));
        }

        Ok(DimensionScore::new(score, details, issues))
    }
}

impl DimensionAnalyzer for ConsistencyAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Consistency
    }

    fn analyze(&self, doc: &Document<'_>, _phase: Phase) -> Result<DimensionScore, AnalysisError> {
        doc.ensure_within(self.max_chars)?;
        if doc.is_blank() {
            return Ok(DimensionScore::empty());
        }

        let mut details = Vec::new();
        let mut issues = Vec::new();

        // Terminology
        let mut mixed_families = 0usize;
        for family in TERM_FAMILIES {
            let used: Vec<&str> = family
                .iter()
                .copied()
                .filter(|term| count_terms(doc.lowercase(), term, Boundary::Plural) > 0)
                .collect();
            if used.len() > 1 {
                mixed_families += 1;
                issues.push(format!("Inconsistent terminology: {}", used.join(" / ")));
            }
        }
        let terminology = (1.0 - 0.1 * mixed_families as f64).max(0.0);
        details.push(format!("Terminology: {mixed_families} mixed term families"));

        // Heading format
        let levels = heading_levels(doc.text);
        let spread = match (levels.iter().min(), levels.iter().max()) {
            (Some(min), Some(max)) => max - min,
            _ => 0,
        };
        let format = if spread > 3 {
            issues.push(format!("Heading levels span {} levels; flatten the hierarchy", spread + 1));
            0.8
        } else {
            1.0
        };
        details.push(format!("Heading level spread: {spread}"));

        // References
        let without_checkboxes = CHECKBOX.replace_all(doc.text, "$1");
        let mut total_refs = 0usize;
        let mut empty_refs = 0usize;
        for caps in REFERENCE.captures_iter(&without_checkboxes) {
            total_refs += 1;
            if caps[1].trim().is_empty() {
                empty_refs += 1;
            }
        }
        let references = if total_refs == 0 {
            1.0
        } else {
            (total_refs - empty_refs) as f64 / total_refs as f64
        };
        if empty_refs > 0 {
            issues.push(format!("{empty_refs} empty bracketed references"));
        }
        details.push(format!("References: {}/{total_refs} non-empty", total_refs - empty_refs));

        let score = (terminology + format + references) / 3.0;
        Ok(DimensionScore::new(score, details, issues))
    }
}

/// Connected transitions, total transitions and the resulting flow score.
fn logical_flow(text: &str) -> (usize, usize, f64) {
    let paragraphs: Vec<String> = PARAGRAPH_BREAK
        .split(text)
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    match paragraphs.len() {
        0 => (0, 0, 0.0),
        1 => (0, 0, 0.5),
        n => {
            let connected = paragraphs[1..]
                .iter()
                .filter(|p| {
                    LOGICAL_CONNECTORS.iter().any(|c| count_terms(p, c, Boundary::Whole) > 0)
                })
                .count();
            (connected, n - 1, connected as f64 / (n - 1) as f64)
        }
    }
}

/// Bullets, numbered items and fenced code-block pairs.
fn structural_markers(text: &str) -> usize {
    BULLET.find_iter(text).count()
        + NUMBERED.find_iter(text).count()
        + FENCE.find_iter(text).count() / 2
}

/// How a term must be delimited to count as a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Boundary {
    /// Word boundary on both sides
    Whole,
    /// Word boundary before; any suffix allowed
    Prefix,
    /// Word boundary on both sides, optional trailing `s`
    Plural,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Count occurrences of `term` in already-lowercased `haystack`.
pub(crate) fn count_terms(haystack: &str, term: &str, boundary: Boundary) -> usize {
    haystack
        .match_indices(term)
        .filter(|(start, _)| {
            let before_ok = haystack[..*start].chars().next_back().map_or(true, |c| !is_word_char(c));
            if !before_ok {
                return false;
            }
            let mut rest = haystack[start + term.len()..].chars();
            match boundary {
                Boundary::Prefix => true,
                Boundary::Whole => rest.next().map_or(true, |c| !is_word_char(c)),
                Boundary::Plural => match rest.next() {
                    None => true,
                    Some('s') => rest.next().map_or(true, |c| !is_word_char(c)),
                    Some(c) => !is_word_char(c),
                },
            }
        })
        .count()
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64).min(1.0)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
