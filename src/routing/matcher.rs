//! Segment pattern matching.
//!
//! # Responsibilities
//! - Parse route names and backend templates ("rides/:id/assign")
//! - Match a normalized segment list against a pattern
//! - Render a backend template from captured parameters
//!
//! # Design Decisions
//! - Segment-wise comparison; a pattern only matches a list of equal length,
//!   so "rides/:id" and "rides/:id/assign" can never collide
//! - Literal comparison is case-sensitive
//! - No regex

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern `{0}` has an empty segment")]
    EmptySegment(String),

    #[error("pattern `{0}` has a parameter without a name")]
    UnnamedParam(String),

    #[error("pattern `{pattern}` repeats parameter `{param}`")]
    DuplicateParam { pattern: String, param: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path pattern: literal segments and `:name` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPattern {
    source: String,
    segments: Vec<Segment>,
}

/// Parameter values captured by a successful match, in pattern order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl SegmentPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();

        for raw in pattern.split('/') {
            if raw.is_empty() {
                return Err(PatternError::EmptySegment(pattern.to_string()));
            }

            match raw.strip_prefix(':') {
                Some("") => return Err(PatternError::UnnamedParam(pattern.to_string())),
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                    if duplicate {
                        return Err(PatternError::DuplicateParam {
                            pattern: pattern.to_string(),
                            param: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern has no placeholders.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Placeholder names, in order of appearance.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a normalized segment list. Returns the captured parameters.
    pub fn matches(&self, segments: &[String]) -> Option<Params> {
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (expected, actual) in self.segments.iter().zip(segments) {
            match expected {
                Segment::Literal(literal) if literal == actual => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if actual.is_empty() => return None,
                Segment::Param(name) => params.push((name.clone(), actual.clone())),
            }
        }

        Some(Params(params))
    }

    /// Substitute captured parameters into this pattern used as a template.
    /// Returns `None` if a placeholder has no value.
    pub fn render(&self, params: &Params) -> Option<String> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(literal.as_str()),
                Segment::Param(name) => parts.push(params.get(name)?),
            }
        }
        Some(parts.join("/"))
    }
}
