//! Iteration tracking.
//!
//! Compares two versions of a phase document and decides whether the
//! revision was a real improvement: a word-level diff, the quality delta,
//! and how many of the previous version's suggestions were acted on.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::ops::Range;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffTag};

use crate::core::TrackerConfig;
use crate::quality::vocabulary::STOP_WORDS;

/// Items listed per group in the detailed analysis.
const DETAIL_LIMIT: usize = 5;

/// Word-level changes between two versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDelta {
    /// Words inserted, including the new side of modifications
    pub added_words: usize,
    /// Words deleted, including the old side of modifications
    pub removed_words: usize,
    /// New word count minus old word count
    pub net_word_change: i64,
    /// Inserted runs with no related removal
    pub additions: Vec<String>,
    /// Deleted runs with no related insertion
    pub removals: Vec<String>,
    /// Removed runs rewritten in place
    pub modifications: Vec<Modification>,
}

/// A removed run paired with the run that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub before: String,
    pub after: String,
    /// Jaccard similarity of the two runs' lowercase word sets
    pub similarity: f64,
}

/// Score change between two versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityImprovement {
    pub old_score: u32,
    pub new_score: u32,
    /// `new_score - old_score`
    pub improvement: i64,
    /// Improvement relative to the old score, in percent
    pub percentage: f64,
    pub significant: bool,
}

/// How many of the previous suggestions the new version addresses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackIncorporation {
    pub total_suggestions: usize,
    pub implemented: Vec<String>,
    pub not_implemented: Vec<String>,
    /// `implemented / total * 100`, 0 without suggestions
    pub rate: f64,
}

/// Full comparison of one revision against its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationAnalysis {
    /// 1-based position in the history
    pub iteration_number: usize,
    pub quality_improvement: QualityImprovement,
    pub content_delta: ContentDelta,
    pub feedback_incorporation: FeedbackIncorporation,
    /// Whether the revision counts as real progress
    pub meaningful: bool,
    /// One-line summary
    pub summary: String,
    /// Markdown report
    pub detailed_analysis: String,
}

/// Compares document versions and keeps a per-project log of the results.
#[derive(Debug, Default)]
pub struct IterationTracker {
    config: TrackerConfig,
    log: Mutex<HashMap<String, Vec<IterationAnalysis>>>,
}

impl IterationTracker {
    /// Create a tracker with the given thresholds.
    pub fn new(config: TrackerConfig) -> Self {
        Self { config, log: Mutex::new(HashMap::new()) }
    }

    /// Thresholds in use.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Compare `old` and `new` and append the result to `project`'s log.
    ///
    /// The iteration number is the project's log length plus one.
    pub fn track_iteration(
        &self,
        project: &str,
        old: &str,
        new: &str,
        old_score: u32,
        new_score: u32,
        previous_suggestions: &[String],
    ) -> IterationAnalysis {
        let mut log = self.log.lock();
        let entries = log.entry(project.to_string()).or_default();
        let analysis =
            self.analyze(entries.len() + 1, old, new, old_score, new_score, previous_suggestions);
        entries.push(analysis.clone());

        tracing::debug!(
            project,
            iteration = analysis.iteration_number,
            meaningful = analysis.meaningful,
            "Tracked iteration"
        );
        analysis
    }

    /// Every analysis tracked for `project`, oldest first.
    pub fn analyses(&self, project: &str) -> Vec<IterationAnalysis> {
        self.log.lock().get(project).cloned().unwrap_or_default()
    }

    /// Compare two versions without touching the log.
    pub fn analyze(
        &self,
        iteration_number: usize,
        old: &str,
        new: &str,
        old_score: u32,
        new_score: u32,
        previous_suggestions: &[String],
    ) -> IterationAnalysis {
        let content_delta = diff_words(old, new, self.config.modification_similarity);
        let quality_improvement = self.quality_improvement(old_score, new_score);
        let feedback_incorporation = incorporation(
            previous_suggestions,
            &new.to_lowercase(),
            self.config.incorporation_threshold,
        );

        let meaningful = quality_improvement.significant
            || content_delta.added_words >= self.config.substantial_added_words
            || feedback_incorporation.rate >= self.config.meaningful_incorporation_rate
            || (content_delta.net_word_change > self.config.net_growth_words
                && quality_improvement.improvement > 0);

        let mut analysis = IterationAnalysis {
            iteration_number,
            quality_improvement,
            content_delta,
            feedback_incorporation,
            meaningful,
            summary: String::new(),
            detailed_analysis: String::new(),
        };
        analysis.summary = summarize(&analysis);
        analysis.detailed_analysis = detail(&analysis);
        analysis
    }

    fn quality_improvement(&self, old_score: u32, new_score: u32) -> QualityImprovement {
        let improvement = i64::from(new_score) - i64::from(old_score);
        let percentage = if old_score == 0 {
            if improvement > 0 {
                100.0
            } else {
                0.0
            }
        } else {
            improvement as f64 / f64::from(old_score) * 100.0
        };
        let significant = improvement as f64 >= self.config.significant_points
            || percentage >= self.config.significant_percentage;

        QualityImprovement { old_score, new_score, improvement, percentage, significant }
    }
}

/// Jaccard similarity of two word sets. Two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn word_set(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Accumulates diff operations into a [`ContentDelta`].
struct DeltaBuilder<'a> {
    old: &'a [&'a str],
    new: &'a [&'a str],
    threshold: f64,
    pending_removal: Option<Range<usize>>,
    delta: ContentDelta,
}

impl<'a> DeltaBuilder<'a> {
    fn removed(&mut self, range: Range<usize>) {
        self.flush();
        self.pending_removal = Some(range);
    }

    fn inserted(&mut self, range: Range<usize>) {
        match self.pending_removal.take() {
            Some(removed) => self.paired(removed, range),
            None => {
                self.delta.added_words += range.len();
                self.delta.additions.push(self.new[range].join(" "));
            }
        }
    }

    fn paired(&mut self, removed: Range<usize>, added: Range<usize>) {
        self.flush();
        let (old, new) = (self.old, self.new);
        let before = &old[removed];
        let after = &new[added];
        self.delta.removed_words += before.len();
        self.delta.added_words += after.len();

        let similarity = jaccard(&word_set(before), &word_set(after));
        if similarity > self.threshold {
            self.delta.modifications.push(Modification {
                before: before.join(" "),
                after: after.join(" "),
                similarity,
            });
        } else {
            self.delta.removals.push(before.join(" "));
            self.delta.additions.push(after.join(" "));
        }
    }

    fn flush(&mut self) {
        if let Some(range) = self.pending_removal.take() {
            self.delta.removed_words += range.len();
            self.delta.removals.push(self.old[range].join(" "));
        }
    }
}

/// Word-level diff of `old` against `new`.
///
/// Adjacent removed and added runs whose word sets have a Jaccard similarity
/// above `threshold` are reported as modifications.
pub fn diff_words(old: &str, new: &str, threshold: f64) -> ContentDelta {
    let old_words: Vec<&str> = old.split_whitespace().collect();
    let new_words: Vec<&str> = new.split_whitespace().collect();

    let mut builder = DeltaBuilder {
        old: &old_words,
        new: &new_words,
        threshold,
        pending_removal: None,
        delta: ContentDelta {
            net_word_change: new_words.len() as i64 - old_words.len() as i64,
            ..ContentDelta::default()
        },
    };

    for op in capture_diff_slices(Algorithm::Myers, &old_words, &new_words) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => builder.flush(),
            DiffTag::Delete => builder.removed(old_range),
            DiffTag::Insert => builder.inserted(new_range),
            DiffTag::Replace => builder.paired(old_range, new_range),
        }
    }
    builder.flush();
    builder.delta
}

/// Significant terms of a suggestion.
///
/// Lowercased, punctuation stripped, stop-words and tokens of three
/// characters or fewer dropped.
pub fn key_terms(suggestion: &str) -> Vec<String> {
    let cleaned: String = suggestion
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn is_implemented(suggestion: &str, content_lower: &str, threshold: f64) -> bool {
    let terms = key_terms(suggestion);
    if terms.is_empty() {
        return false;
    }
    let present = terms.iter().filter(|t| content_lower.contains(t.as_str())).count();
    present as f64 / terms.len() as f64 > threshold
}

fn incorporation(suggestions: &[String], content_lower: &str, threshold: f64) -> FeedbackIncorporation {
    let (implemented, not_implemented): (Vec<String>, Vec<String>) = suggestions
        .iter()
        .cloned()
        .partition(|s| is_implemented(s, content_lower, threshold));

    let rate = if suggestions.is_empty() {
        0.0
    } else {
        implemented.len() as f64 / suggestions.len() as f64 * 100.0
    };

    FeedbackIncorporation { total_suggestions: suggestions.len(), implemented, not_implemented, rate }
}

fn summarize(analysis: &IterationAnalysis) -> String {
    let q = &analysis.quality_improvement;
    let d = &analysis.content_delta;
    let f = &analysis.feedback_incorporation;

    let mut summary = format!(
        "Iteration {}: quality {} -> {} ({:+}), +{}/-{} words",
        analysis.iteration_number, q.old_score, q.new_score, q.improvement, d.added_words, d.removed_words
    );
    if !d.modifications.is_empty() {
        let _ = write!(summary, ", {} modified", d.modifications.len());
    }
    if f.total_suggestions > 0 {
        let _ = write!(summary, ", {}/{} suggestions addressed", f.implemented.len(), f.total_suggestions);
    }
    summary.push_str(if analysis.meaningful { "; meaningful" } else { "; not meaningful" });
    summary
}

fn detail(analysis: &IterationAnalysis) -> String {
    let q = &analysis.quality_improvement;
    let d = &analysis.content_delta;
    let f = &analysis.feedback_incorporation;

    let mut md = format!("## Iteration {}\n\n", analysis.iteration_number);

    md.push_str("### Quality\n\n");
    let _ = writeln!(md, "- Score: {} -> {} ({:+})", q.old_score, q.new_score, q.improvement);
    let _ = writeln!(md, "- Relative change: {:.1}%", q.percentage);
    let _ = writeln!(md, "- Significant: {}\n", if q.significant { "yes" } else { "no" });

    md.push_str("### Content\n\n");
    let _ = writeln!(md, "- Words added: {}", d.added_words);
    let _ = writeln!(md, "- Words removed: {}", d.removed_words);
    let _ = writeln!(md, "- Net change: {:+}", d.net_word_change);
    for m in d.modifications.iter().take(DETAIL_LIMIT) {
        let _ = writeln!(md, "- Modified: \"{}\" -> \"{}\"", m.before, m.after);
    }
    md.push('\n');

    if f.total_suggestions > 0 {
        md.push_str("### Feedback\n\n");
        let _ = writeln!(md, "- Incorporation rate: {:.0}%", f.rate);
        for s in f.implemented.iter().take(DETAIL_LIMIT) {
            let _ = writeln!(md, "- [x] {s}");
        }
        for s in f.not_implemented.iter().take(DETAIL_LIMIT) {
            let _ = writeln!(md, "- [ ] {s}");
        }
        md.push('\n');
    }

    let _ = writeln!(
        md,
        "**Verdict:** {}",
        if analysis.meaningful { "meaningful iteration" } else { "not a meaningful iteration" }
    );
    md
}
