// src/classifier.rs
//! Heuristic hate-speech classifier.
//!
//! The label is decided by an ordered list of regex indicators applied to the
//! lowercased text, with one fallback rule (group reference + negative
//! sentiment). The confidence is sampled independently of the label.

use rand::distr::{Distribution, Uniform};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hostility indicators, tested in order. First match wins.
pub const HOSTILITY_PATTERNS: [&str; 10] = [
    r"\bhate\b",
    r"\bkill\b",
    r"should die",
    r"go back",
    r"can't stand",
    r"cant stand",
    r"get out",
    r"you(?: are|'re| re) (?:stupid|idiot|idiots)",
    r"\bdisgusting\b",
    r"\bscum\b",
];

/// Fallback rule: a generic group reference...
pub const GROUP_REFERENCE_PATTERN: &str = r"\b(?:people|they|them)\b";
/// ...together with a negative sentiment word anywhere in the text.
pub const GROUP_SENTIMENT_PATTERN: &str = r"\b(?:hate|can't stand|dislike)\b";

pub const DEFAULT_CONFIDENCE_LOW: f64 = 0.94;
pub const DEFAULT_CONFIDENCE_HIGH: f64 = 0.99;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid confidence range [{low}, {high}]: {reason}")]
    ConfidenceRange { low: f64, high: f64, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Hate")]
    Hate,
    #[serde(rename = "Not Hate")]
    NotHate,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Hate => "Hate",
            Label::NotHate => "Not Hate",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule turned a text into `Hate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// One of [`HOSTILITY_PATTERNS`] (the regex source).
    Pattern(&'static str),
    /// Group reference and sentiment word both present.
    GroupSentiment,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Pattern(p) => write!(f, "pattern:{p}"),
            Indicator::GroupSentiment => f.write_str("group+sentiment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    pub score: f64,
    #[serde(skip)]
    pub indicator: Option<Indicator>,
}

/// Anything that can label a text. The HTTP layer only depends on this.
pub trait Classify: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError>;
}

/// Closed interval the confidence is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceRange {
    low: f64,
    high: f64,
}

impl Default for ConfidenceRange {
    fn default() -> Self {
        Self {
            low: DEFAULT_CONFIDENCE_LOW,
            high: DEFAULT_CONFIDENCE_HIGH,
        }
    }
}

impl ConfidenceRange {
    pub fn new(low: f64, high: f64) -> Result<Self, ClassifierError> {
        let reason = if !low.is_finite() || !high.is_finite() {
            Some("bounds must be finite")
        } else if low > high {
            Some("low bound exceeds high bound")
        } else {
            None
        };
        match reason {
            Some(r) => Err(ClassifierError::ConfidenceRange {
                low,
                high,
                reason: r.to_string(),
            }),
            None => Ok(Self { low, high }),
        }
    }

    /// Uniform sample over `[low, high]`, rounded to 4 decimal places.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, ClassifierError> {
        let dist = Uniform::new_inclusive(self.low, self.high).map_err(|e| {
            ClassifierError::ConfidenceRange {
                low: self.low,
                high: self.high,
                reason: e.to_string(),
            }
        })?;
        let raw = dist.sample(rng);
        // Rounding can't leave the interval when both bounds have <= 4 decimals;
        // clamp anyway for custom ranges.
        Ok(round4(raw).clamp(self.low, self.high))
    }
}

#[inline]
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    patterns: Vec<(&'static str, Regex)>,
    group_reference: Regex,
    group_sentiment: Regex,
    confidence: ConfidenceRange,
}

fn compile(pattern: &str) -> Result<Regex, ClassifierError> {
    Regex::new(pattern).map_err(|source| ClassifierError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl HeuristicClassifier {
    pub fn new() -> Result<Self, ClassifierError> {
        let patterns = HOSTILITY_PATTERNS
            .iter()
            .map(|p| compile(p).map(|re| (*p, re)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            group_reference: compile(GROUP_REFERENCE_PATTERN)?,
            group_sentiment: compile(GROUP_SENTIMENT_PATTERN)?,
            confidence: ConfidenceRange::default(),
        })
    }

    pub fn with_confidence(mut self, range: ConfidenceRange) -> Self {
        self.confidence = range;
        self
    }

    /// Returns the first rule that fires for `text`, if any.
    pub fn detect(&self, text: &str) -> Option<Indicator> {
        let t = text.to_lowercase();

        if let Some((src, _)) = self.patterns.iter().find(|(_, re)| re.is_match(&t)) {
            return Some(Indicator::Pattern(*src));
        }

        if self.group_reference.is_match(&t) && self.group_sentiment.is_match(&t) {
            return Some(Indicator::GroupSentiment);
        }

        None
    }

    pub fn is_hateful(&self, text: &str) -> bool {
        self.detect(text).is_some()
    }

    pub fn classify_with_rng<R: Rng + ?Sized>(
        &self,
        text: &str,
        rng: &mut R,
    ) -> Result<Prediction, ClassifierError> {
        let indicator = self.detect(text);
        let label = if indicator.is_some() {
            Label::Hate
        } else {
            Label::NotHate
        };
        let score = self.confidence.sample(rng)?;
        Ok(Prediction {
            label,
            score,
            indicator,
        })
    }
}

impl Classify for HeuristicClassifier {
    /// Label + confidence using the thread-local RNG (seeded from OS entropy).
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        self.classify_with_rng(text, &mut rand::rng())
    }
}
