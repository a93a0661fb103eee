//! Error types for pattern rearrangement

use thiserror::Error;

/// Result type for rearrangement operations
pub type RearrangeResult<T> = Result<T, RearrangeError>;

/// Which half of a pattern an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Input => write!(f, "input"),
            Side::Output => write!(f, "output"),
        }
    }
}

/// Rearrangement errors
#[derive(Debug, Error)]
pub enum RearrangeError {
    #[error("Syntax error: {message}")]
    Syntax { message: String },

    #[error("Ellipsis must be present in both input and output or neither (found only in {side})")]
    EllipsisMismatch { side: Side },

    #[error("Repeated dimension name '{name}' in {side} pattern")]
    DuplicateAxis { name: String, side: Side },

    #[error("Too many unspecified axes in group ({}): cannot infer {}", .group.join(" "), .unresolved.join(", "))]
    AmbiguousGroup {
        group: Vec<String>,
        unresolved: Vec<String>,
    },

    #[error("Group size mismatch for ({}): {message}", .group.join(" "))]
    GroupMismatch { group: Vec<String>, message: String },

    #[error("Expected singleton axis at position {position}, got {got}")]
    Singleton { position: usize, got: usize },

    #[error("Literal mismatch at position {position}: expected {expected}, got {got}")]
    LiteralMismatch {
        position: usize,
        expected: usize,
        got: usize,
    },

    #[error("Shape consumption error: {message}")]
    ShapeConsumption { message: String },

    #[error("Output axis '{name}' not in input and not specified")]
    MissingOutputAxis { name: String },

    #[error("Axis '{name}' was given length {hint} but has length {got}")]
    AxisLengthMismatch { name: String, hint: usize, got: usize },

    #[error("Shape mismatch: {message}")]
    ShapeConservation { message: String },
}

/// Tag for each error variant, for callers that branch on the kind only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    EllipsisMismatch,
    DuplicateAxis,
    AmbiguousGroup,
    GroupMismatch,
    Singleton,
    LiteralMismatch,
    ShapeConsumption,
    MissingOutputAxis,
    AxisLengthMismatch,
    ShapeConservation,
}

impl RearrangeError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        RearrangeError::Syntax { message: msg.into() }
    }

    pub fn consumption(msg: impl Into<String>) -> Self {
        RearrangeError::ShapeConsumption { message: msg.into() }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        RearrangeError::MissingOutputAxis { name: name.into() }
    }

    pub fn conservation(msg: impl Into<String>) -> Self {
        RearrangeError::ShapeConservation { message: msg.into() }
    }

    pub fn group_mismatch(group: &[String], msg: impl Into<String>) -> Self {
        RearrangeError::GroupMismatch {
            group: group.to_vec(),
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RearrangeError::Syntax { .. } => ErrorKind::Syntax,
            RearrangeError::EllipsisMismatch { .. } => ErrorKind::EllipsisMismatch,
            RearrangeError::DuplicateAxis { .. } => ErrorKind::DuplicateAxis,
            RearrangeError::AmbiguousGroup { .. } => ErrorKind::AmbiguousGroup,
            RearrangeError::GroupMismatch { .. } => ErrorKind::GroupMismatch,
            RearrangeError::Singleton { .. } => ErrorKind::Singleton,
            RearrangeError::LiteralMismatch { .. } => ErrorKind::LiteralMismatch,
            RearrangeError::ShapeConsumption { .. } => ErrorKind::ShapeConsumption,
            RearrangeError::MissingOutputAxis { .. } => ErrorKind::MissingOutputAxis,
            RearrangeError::AxisLengthMismatch { .. } => ErrorKind::AxisLengthMismatch,
            RearrangeError::ShapeConservation { .. } => ErrorKind::ShapeConservation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(RearrangeError::syntax("x").kind(), ErrorKind::Syntax);
        assert_eq!(RearrangeError::missing("c").kind(), ErrorKind::MissingOutputAxis);
        assert_eq!(
            RearrangeError::group_mismatch(&["h".to_string()], "bad").kind(),
            ErrorKind::GroupMismatch
        );
    }

    #[test]
    fn test_messages() {
        let err = RearrangeError::missing("c");
        assert_eq!(err.to_string(), "Output axis 'c' not in input and not specified");

        let err = RearrangeError::AmbiguousGroup {
            group: vec!["h".into(), "w".into(), "x".into()],
            unresolved: vec!["h".into(), "w".into(), "x".into()],
        };
        assert!(err.to_string().starts_with("Too many unspecified axes in group (h w x)"));
    }
}
