//! Path pattern matching logic.
//!
//! # Responsibilities
//! - Compile `/pet/{petId}` style patterns into segments
//! - Match request paths segment by segment
//! - Extract and percent-decode path parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A parameter occupies a whole segment and never matches an empty one
//! - Trailing slashes are significant (`/pet/` does not match `/pet`)
//! - No regex to guarantee O(n) matching

use thiserror::Error;

/// Error produced when a path pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("path pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("path pattern {pattern:?} has a malformed parameter segment {segment:?}")]
    MalformedParam { pattern: String, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

/// Ordered path parameters extracted from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathArgs {
    values: Vec<(&'static str, String)>,
}

impl PathArgs {
    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

impl FromIterator<(&'static str, String)> for PathArgs {
    fn from_iter<I: IntoIterator<Item = (&'static str, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: &'static str,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern such as `/pet/{petId}`.
    pub fn parse(pattern: &'static str) -> Result<Self, PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let segments = rest
            .split('/')
            .map(|segment| match segment.strip_prefix('{') {
                Some(inner) => match inner.strip_suffix('}') {
                    Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                        Ok(Segment::Param(name))
                    }
                    _ => Err(PatternError::MalformedParam {
                        pattern: pattern.to_string(),
                        segment: segment.to_string(),
                    }),
                },
                None if segment.contains(['{', '}']) => Err(PatternError::MalformedParam {
                    pattern: pattern.to_string(),
                    segment: segment.to_string(),
                }),
                None => Ok(Segment::Literal(segment)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pattern, segments })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &'static str {
        self.pattern
    }

    /// Number of parameter segments.
    pub fn arity(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Param(_)))
            .count()
    }

    /// Number of literal segments, used to order routes by specificity.
    pub fn literal_count(&self) -> usize {
        self.segments.len() - self.arity()
    }

    /// Match a request path, returning the extracted parameters.
    pub fn matches(&self, path: &str) -> Option<PathArgs> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut values = Vec::with_capacity(self.arity());

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if part != *literal {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    // Undecodable input is passed through raw; the codec rejects it.
                    let value = urlencoding::decode(part)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| part.to_string());
                    values.push((*name, value));
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }

        Some(PathArgs { values })
    }
}
