//! Pattern-based dispatch rules
//!
//! Every pattern passes a safety check before it is compiled: overly long
//! patterns and nested unbounded quantifiers such as `(a+)+` are rejected.
//! Rejected patterns are skipped and reported, never fatal.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

/// Longest pattern accepted by the safety validator
pub const MAX_PATTERN_LEN: usize = 200;

/// Compiled program size limit handed to the regex engine
const REGEX_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    None,
    Bounded,
    Unbounded,
}

#[derive(Debug, Default)]
struct GroupFrame {
    /// Group body contains an unbounded repetition
    unbounded: bool,
}

/// Check a pattern against the safety rules without compiling it
pub fn validate_pattern(pattern: &str) -> Result<(), PlanningError> {
    if pattern.is_empty() {
        return Err(PlanningError::rejected(pattern, "empty pattern"));
    }
    if pattern.chars().count() > MAX_PATTERN_LEN {
        return Err(PlanningError::rejected(
            pattern,
            format!("pattern longer than {} characters", MAX_PATTERN_LEN),
        ));
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut stack = vec![GroupFrame::default()];
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i = (i + 2).min(chars.len());
            }
            '[' => {
                i = skip_class(&chars, i);
            }
            '(' => {
                stack.push(GroupFrame::default());
                i += 1;
                continue;
            }
            ')' => {
                if stack.len() < 2 {
                    return Err(PlanningError::rejected(pattern, "unbalanced parentheses"));
                }
                let frame = stack.pop().unwrap_or_default();
                i += 1;
                let (quantifier, len) = quantifier_at(&chars, i);
                if quantifier == Quantifier::Unbounded && frame.unbounded {
                    return Err(PlanningError::rejected(
                        pattern,
                        "nested unbounded quantifier",
                    ));
                }
                if frame.unbounded || quantifier == Quantifier::Unbounded {
                    mark_unbounded(&mut stack);
                }
                i += len;
                continue;
            }
            _ => {
                i += 1;
            }
        }

        // Quantifier applied to the atom just consumed
        let (quantifier, len) = quantifier_at(&chars, i);
        if quantifier == Quantifier::Unbounded {
            mark_unbounded(&mut stack);
        }
        i += len;
    }

    if stack.len() != 1 {
        return Err(PlanningError::rejected(pattern, "unbalanced parentheses"));
    }
    Ok(())
}

/// Validate and compile a pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex, PlanningError> {
    validate_pattern(pattern)?;
    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| PlanningError::rejected(pattern, format!("invalid regex: {}", e)))
}

fn mark_unbounded(stack: &mut [GroupFrame]) {
    if let Some(top) = stack.last_mut() {
        top.unbounded = true;
    }
}

/// Index just past the character class starting at `start`
fn skip_class(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() && chars[i] != ']' {
        if chars[i] == '\\' {
            i += 1;
        }
        i += 1;
    }
    (i + 1).min(chars.len())
}

fn quantifier_at(chars: &[char], i: usize) -> (Quantifier, usize) {
    let (quantifier, mut len) = match chars.get(i) {
        Some('*') | Some('+') => (Quantifier::Unbounded, 1),
        Some('?') => (Quantifier::Bounded, 1),
        Some('{') => match counted_repetition(chars, i) {
            Some((unbounded, len)) if unbounded => (Quantifier::Unbounded, len),
            Some((_, len)) => (Quantifier::Bounded, len),
            None => return (Quantifier::None, 0),
        },
        _ => return (Quantifier::None, 0),
    };
    // Lazy / possessive suffix
    if matches!(chars.get(i + len), Some('?') | Some('+')) {
        len += 1;
    }
    (quantifier, len)
}

/// Parse `{n}`, `{n,m}` or `{n,}` at `start`. Returns (unbounded, length).
fn counted_repetition(chars: &[char], start: usize) -> Option<(bool, usize)> {
    let close = chars[start..].iter().position(|&c| c == '}')? + start;
    let body: String = chars[start + 1..close].iter().collect();
    let mut parts = body.splitn(2, ',');
    let min = parts.next()?.trim();
    if min.is_empty() || !min.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let unbounded = match parts.next() {
        None => false,
        Some(max) if max.trim().is_empty() => true,
        Some(max) if max.trim().chars().all(|c| c.is_ascii_digit()) => false,
        Some(_) => return None,
    };
    Some((unbounded, close - start + 1))
}

/// A rule as written in selection tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub workers: Vec<String>,
}

/// A validated, compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: String,
    pub workers: Vec<String>,
    regex: Regex,
}

impl Rule {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Ordered list of rules, compiled once and evaluated per request
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile rules in order. Rejected patterns are skipped and returned.
    pub fn compile(specs: &[RuleSpec]) -> (Self, Vec<PlanningError>) {
        let mut rules = Vec::with_capacity(specs.len());
        let mut rejected = Vec::new();

        for spec in specs {
            match compile_pattern(&spec.pattern) {
                Ok(regex) => rules.push(Rule {
                    pattern: spec.pattern.clone(),
                    workers: spec.workers.clone(),
                    regex,
                }),
                Err(e) => {
                    tracing::warn!("Skipping dispatch rule: {}", e);
                    rejected.push(e);
                }
            }
        }

        (Self { rules }, rejected)
    }

    /// Rules whose pattern matches, in declaration order
    pub fn matching<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |rule| rule.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
