//! Line rules for prescription field extraction
//!
//! Each field is described by one rule: a pattern a line must match, an
//! optional pattern it must not match, and label tokens removed from the
//! chosen line. Rules only look at single lines.

use std::sync::LazyLock;

use regex::Regex;

/// A `(predicate, extractor)` pair for one field
pub struct LineRule {
    pattern: Regex,
    exclude: Option<Regex>,
    strip: Option<Regex>,
}

impl LineRule {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: compile(pattern),
            exclude: None,
            strip: None,
        }
    }

    fn excluding(mut self, pattern: &str) -> Self {
        self.exclude = Some(compile(pattern));
        self
    }

    fn stripping(mut self, pattern: &str) -> Self {
        self.strip = Some(compile(pattern));
        self
    }

    /// Whether a line selects this rule's field
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
            && !self.exclude.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// First line, in source order, that matches
    pub fn first_match<'a>(&self, lines: &[&'a str]) -> Option<&'a str> {
        lines.iter().copied().find(|line| self.matches(line))
    }

    /// Remove every label token and trim
    pub fn clean(&self, line: &str) -> String {
        match &self.strip {
            Some(re) => re.replace_all(line, "").trim().to_string(),
            None => line.trim().to_string(),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction patterns are valid")
}

pub static PATIENT: LazyLock<LineRule> = LazyLock::new(|| {
    LineRule::new(r"(?i)patient|name")
        .excluding(r"(?i)medication|drug|rx")
        .stripping(r"(?i)patient:?|name:?")
});

pub static MEDICATION: LazyLock<LineRule> = LazyLock::new(|| {
    LineRule::new(r"(?i)mg|tablet|capsule|ml|rx|medication|drug")
        .stripping(r"(?i)rx:?|medication:?")
});

pub static DOSAGE: LazyLock<LineRule> = LazyLock::new(|| {
    LineRule::new(r"(?i)daily|times|once|twice|thrice|every|hours|morning|evening")
});

pub static QUANTITY: LazyLock<LineRule> =
    LazyLock::new(|| LineRule::new(r"(?i)quantity|qty|#"));

pub static PRESCRIBER: LazyLock<LineRule> = LazyLock::new(|| {
    LineRule::new(r"(?i)dr\.|doctor|physician|prescribed by")
        .stripping(r"(?i)dr\.|doctor|physician|prescribed by:?")
});

// ASCII digits only; `u32::from_str` rejects other scripts
static DIGITS: LazyLock<Regex> = LazyLock::new(|| compile(r"[0-9]+"));

/// First run of digits as a positive count
pub fn first_number(line: &str) -> Option<u32> {
    DIGITS
        .find(line)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
}
