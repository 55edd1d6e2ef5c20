//! Heading-delimited section extraction.
//!
//! Turns markdown-ish text into a tree of titled sections. The tree is built
//! once per analysis call and never mutated afterwards.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap());

static EXAMPLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bfor example\b",
        r"(?i)\be\.g\.",
        r"(?i)\bsuch as\b",
        r#""[^"\n]{10,}""#,
        r"(?m)^\s*```",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+(\.\d+)?\s?%",
        r"[$€£]\s?\d",
        r"(?i)\b\d+(\.\d+)?\s?(ms|milliseconds?|s|secs?|seconds?|min|minutes?|h|hours?|days?|weeks?)\b",
        r"\bv?\d+\.\d+(\.\d+)?\b",
        r"\d",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A titled section of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text without the `#` markers
    pub title: String,

    /// Heading level (1-6)
    pub level: usize,

    /// Body text directly under this heading (excluding subsections)
    pub content: String,

    /// Whitespace-separated tokens in `content`
    pub word_count: usize,

    /// Whether `content` contains an example
    pub has_examples: bool,

    /// Whether `content` contains a number, percentage, duration or version
    pub has_numbers: bool,

    /// Nested sections
    pub subsections: Vec<Section>,
}

impl Section {
    /// Iterate over this section and all of its descendants, pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.subsections.iter().rev());
            Some(next)
        })
    }

    /// Total words in this section and its descendants.
    pub fn total_words(&self) -> usize {
        self.iter().map(|s| s.word_count).sum()
    }
}

/// A section still receiving lines.
struct OpenSection {
    title: String,
    level: usize,
    body: Vec<String>,
    children: Vec<Section>,
}

impl OpenSection {
    fn close(self) -> Section {
        let content = self.body.join("\n").trim().to_string();
        Section {
            word_count: count_words(&content),
            has_examples: has_examples(&content),
            has_numbers: has_numbers(&content),
            title: self.title,
            level: self.level,
            content,
            subsections: self.children,
        }
    }
}

/// Parse `text` into top-level sections.
///
/// A heading of level L closes every open section with level >= L and
/// becomes a child of the nearest remaining open section. Text before the
/// first heading belongs to no section. Lines inside fenced code blocks are
/// never treated as headings.
pub fn extract_sections(text: &str) -> Vec<Section> {
    let mut roots = Vec::new();
    let mut stack: Vec<OpenSection> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        let heading = if in_fence { None } else { HEADING.captures(line) };

        let Some(caps) = heading else {
            if let Some(current) = stack.last_mut() {
                current.body.push(line.to_string());
            }
            continue;
        };

        let level = caps[1].len();
        while stack.last().is_some_and(|open| open.level >= level) {
            if let Some(open) = stack.pop() {
                attach(open.close(), &mut stack, &mut roots);
            }
        }

        stack.push(OpenSection {
            title: caps[2].trim().to_string(),
            level,
            body: Vec::new(),
            children: Vec::new(),
        });
    }

    while let Some(open) = stack.pop() {
        attach(open.close(), &mut stack, &mut roots);
    }

    roots
}

fn attach(section: Section, stack: &mut [OpenSection], roots: &mut Vec<Section>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(section),
        None => roots.push(section),
    }
}

/// Flatten a section forest into pre-order.
pub fn flatten(sections: &[Section]) -> Vec<&Section> {
    sections.iter().flat_map(Section::iter).collect()
}

/// Heading levels used in `text`, in document order, ignoring fenced code.
pub fn heading_levels(text: &str) -> Vec<usize> {
    let mut in_fence = false;
    let mut levels = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = HEADING.captures(line) {
            levels.push(caps[1].len());
        }
    }
    levels
}

/// Count whitespace-separated, non-empty tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether `text` contains an example phrase, a long quotation or a code block.
pub fn has_examples(text: &str) -> bool {
    EXAMPLE_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Whether `text` contains any numeric detail.
pub fn has_numbers(text: &str) -> bool {
    NUMBER_PATTERNS.iter().any(|re| re.is_match(text))
}
