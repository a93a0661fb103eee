//! Pattern syntax tree and axis identifiers

use serde::{Deserialize, Serialize};

/// One element of a pattern side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisToken {
    /// Named axis: `h`
    Axis(String),

    /// Parenthesized group occupying one dimension: `(h w)`
    Group(Vec<String>),

    /// Batch wildcard: `...`
    Ellipsis,

    /// Length-1 axis, asserted on input and inserted on output: `1`
    Singleton,

    /// Fixed-length constraint: `3`
    Literal(usize),
}

impl std::fmt::Display for AxisToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisToken::Axis(name) => write!(f, "{}", name),
            AxisToken::Group(members) => write!(f, "({})", members.join(" ")),
            AxisToken::Ellipsis => write!(f, "..."),
            AxisToken::Singleton => write!(f, "1"),
            AxisToken::Literal(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered tokens of one pattern side
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AxisSpec {
    pub tokens: Vec<AxisToken>,
}

impl AxisSpec {
    pub fn new(tokens: Vec<AxisToken>) -> Self {
        Self { tokens }
    }

    pub fn has_ellipsis(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, AxisToken::Ellipsis))
    }

    /// Number of tokens that consume exactly one dimension
    pub fn fixed_rank(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| !matches!(t, AxisToken::Ellipsis))
            .count()
    }

    pub fn contains_literal(&self, value: usize) -> bool {
        self.tokens.contains(&AxisToken::Literal(value))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AxisToken> {
        self.tokens.iter()
    }
}

impl std::fmt::Display for AxisSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// A validated `input -> output` pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub input: AxisSpec,
    pub output: AxisSpec,
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.input, self.output)
    }
}

/// Identity of one intermediate axis slot
///
/// Batch and singleton slots carry indices instead of synthesized names, so
/// they can never collide with user axis names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AxisId {
    Named(String),
    /// j-th axis absorbed by the ellipsis
    Batch(usize),
    /// Input singleton at the given token index
    Squeezed(usize),
    /// Output singleton at the given token index
    Inserted(usize),
    /// Literal passed through to the output
    Literal(usize),
}

impl AxisId {
    pub fn named(name: &str) -> Self {
        AxisId::Named(name.to_string())
    }
}

impl std::fmt::Display for AxisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisId::Named(name) => write!(f, "{}", name),
            AxisId::Batch(j) => write!(f, "batch_{}", j),
            AxisId::Squeezed(i) => write!(f, "singleton_{}", i),
            AxisId::Inserted(i) => write!(f, "inserted_{}", i),
            AxisId::Literal(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display() {
        let spec = AxisSpec::new(vec![
            AxisToken::Ellipsis,
            AxisToken::Group(vec!["h".into(), "w".into()]),
            AxisToken::Singleton,
            AxisToken::Literal(3),
            AxisToken::Axis("c".into()),
        ]);
        assert_eq!(spec.to_string(), "... (h w) 1 3 c");
        assert_eq!(spec.fixed_rank(), 4);
        assert!(spec.has_ellipsis());
        assert!(spec.contains_literal(3));
    }

    #[test]
    fn test_axis_id_display() {
        assert_eq!(AxisId::Batch(2).to_string(), "batch_2");
        assert_eq!(AxisId::Squeezed(0).to_string(), "singleton_0");
        assert_ne!(AxisId::named("batch_0"), AxisId::Batch(0));
    }
}
