//! Pattern substitution engine.
//!
//! Rules are applied in insertion order, each one scanning the output of the
//! rules before it. Matching is always case-insensitive and the replacement
//! token is inserted literally. Because later rules see earlier
//! replacements, overlapping rules give order-dependent (but deterministic)
//! results: the first rule to rewrite a region wins it.

use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A pattern and the token that replaces its matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    pub pattern: String,
    pub replacement: String,
}

impl ReplacementRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// A pattern is a regex when it starts with a word boundary (`\b`) or
    /// contains a character class (`[`). Anything else is matched literally.
    pub fn is_regex(&self) -> bool {
        self.pattern.starts_with(r"\b") || self.pattern.contains('[')
    }
}

/// A user-managed keyword, as kept by front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub original: String,
    pub replacement: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// On-disk keyword list: `{"keywords": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStore {
    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,
}

impl KeywordStore {
    /// Enabled entries as replacement rules, in order.
    pub fn rules(&self) -> Vec<ReplacementRule> {
        rules_from_keywords(&self.keywords)
    }
}

/// Convert keyword entries to rules, dropping disabled ones.
pub fn rules_from_keywords(entries: &[KeywordEntry]) -> Vec<ReplacementRule> {
    entries
        .iter()
        .filter(|k| k.enabled)
        .map(|k| ReplacementRule::new(k.original.as_str(), k.replacement.as_str()))
        .collect()
}

/// The stock keyword list.
pub fn default_keywords() -> Vec<KeywordEntry> {
    const DEFAULTS: &[(&str, &str)] = &[
        ("confidential", "[REDACTED]"),
        ("secret", "[REDACTED]"),
        ("internal", "[INTERNAL]"),
        ("proprietary", "[PROPRIETARY]"),
        ("classified", "[CLASSIFIED]"),
        (r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b", "[EMAIL]"),
        (r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", "[PHONE]"),
        (r"\b\d{3}-\d{2}-\d{4}\b", "[SSN]"),
        (r"\b\d{1,2}/\d{1,2}/\d{4}\b", "[DATE]"),
        (r"\$[\d,]+\.?\d*", "[AMOUNT]"),
    ];
    DEFAULTS
        .iter()
        .map(|(original, replacement)| KeywordEntry {
            original: original.to_string(),
            replacement: replacement.to_string(),
            enabled: true,
        })
        .collect()
}

/// Result of applying a rule set to a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    replacement: String,
}

/// A validated, compiled, ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule up front. The first malformed rule fails the whole
    /// set with [`Error::Pattern`] naming its position.
    pub fn new(rules: &[ReplacementRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if rule.pattern.is_empty() {
                return Err(Error::InvalidOptions(format!(
                    "replacement rule #{i} has an empty pattern"
                )));
            }
            let source = if rule.is_regex() {
                rule.pattern.clone()
            } else {
                regex::escape(&rule.pattern)
            };
            let regex = RegexBuilder::new(&source)
                .case_insensitive(true)
                .build()
                .map_err(|source| Error::Pattern {
                    rule: i,
                    pattern: rule.pattern.clone(),
                    source,
                })?;
            compiled.push(CompiledRule {
                regex,
                replacement: rule.replacement.clone(),
            });
        }
        tracing::debug!(rules = compiled.len(), "compiled replacement rules");
        Ok(Self { rules: compiled })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply all rules to `text`.
    pub fn apply(&self, text: &str) -> Substitution {
        let mut current = text.to_string();
        let mut count = 0;
        if text.is_empty() {
            return Substitution {
                text: current,
                count,
            };
        }

        for rule in &self.rules {
            let matches = rule.regex.find_iter(&current).count();
            if matches == 0 {
                continue;
            }
            count += matches;
            current = rule
                .regex
                .replace_all(&current, NoExpand(&rule.replacement))
                .into_owned();
        }

        Substitution {
            text: current,
            count,
        }
    }

    /// Apply all rules across a sequence of adjacent text leaves.
    ///
    /// Matching runs over the concatenation, so a term split between leaves
    /// is still found. The replacement lands in the leaf where the match
    /// starts; the remainder of the match is cut from the following leaves.
    /// Returns the number of matches.
    pub fn apply_segments(&self, segments: &mut [String]) -> usize {
        if segments.is_empty() {
            return 0;
        }

        let mut count = 0;
        for rule in &self.rules {
            let joined = segments.concat();
            if joined.is_empty() {
                break;
            }
            let spans: Vec<(usize, usize)> = rule
                .regex
                .find_iter(&joined)
                .map(|m| (m.start(), m.end()))
                .collect();
            if spans.is_empty() {
                continue;
            }
            count += spans.len();

            let mut starts = Vec::with_capacity(segments.len());
            let mut offset = 0;
            for seg in segments.iter() {
                starts.push((offset, offset + seg.len()));
                offset += seg.len();
            }

            // Right to left, so offsets left of each match stay valid.
            for &(start, end) in spans.iter().rev() {
                splice(segments, &starts, start, end, &rule.replacement);
            }
        }
        count
    }
}

fn splice(
    segments: &mut [String],
    bounds: &[(usize, usize)],
    start: usize,
    end: usize,
    replacement: &str,
) {
    let owner = bounds
        .iter()
        .position(|&(s, e)| s <= start && start < e)
        .unwrap_or(segments.len() - 1);

    let (owner_start, owner_end) = bounds[owner];
    let local_start = start - owner_start;
    let local_end = end.min(owner_end) - owner_start;
    segments[owner].replace_range(local_start..local_end, replacement);

    for i in owner + 1..segments.len() {
        let (seg_start, seg_end) = bounds[i];
        if seg_start >= end {
            break;
        }
        let cut = end.min(seg_end) - seg_start;
        segments[i].replace_range(..cut, "");
    }
}
