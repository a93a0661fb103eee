//! Parser for rearrangement patterns
//!
//! Parses patterns like:
//! - `b h w c -> b c h w`
//! - `(h w) c -> h w c`
//! - `... c -> c ...`
//! - `1 h 1 -> h`

use std::collections::{BTreeSet, HashSet};

use log::trace;

use crate::ast::{AxisSpec, AxisToken, Pattern};
use crate::error::{RearrangeError, RearrangeResult, Side};
use crate::lexer::{Lexeme, Lexer};

/// Parser for a full `input -> output` pattern
pub struct Parser<'source> {
    source: &'source str,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Self { source }
    }

    /// Parse and validate the pattern
    pub fn parse(&self) -> RearrangeResult<Pattern> {
        let parts: Vec<&str> = self.source.split("->").collect();
        if parts.len() != 2 {
            return Err(RearrangeError::syntax(format!(
                "Pattern must contain exactly one '->', found {}",
                parts.len() - 1
            )));
        }

        let input = tokenize(parts[0])?;
        let output = tokenize(parts[1])?;

        match (input.has_ellipsis(), output.has_ellipsis()) {
            (true, false) => return Err(RearrangeError::EllipsisMismatch { side: Side::Input }),
            (false, true) => return Err(RearrangeError::EllipsisMismatch { side: Side::Output }),
            _ => {}
        }

        check_unique(&input, &output, Side::Input)?;
        check_unique(&output, &output, Side::Output)?;

        let pattern = Pattern { input, output };
        trace!("parsed pattern '{}' as {:?}", self.source, pattern);
        Ok(pattern)
    }
}

/// Tokenize one side of a pattern
pub fn tokenize(half: &str) -> RearrangeResult<AxisSpec> {
    SpecParser::new(half).parse_spec()
}

/// Plain axis names referenced by a spec, group members included
pub fn axes_of(spec: &AxisSpec) -> BTreeSet<String> {
    let mut axes = BTreeSet::new();
    for token in spec.iter() {
        match token {
            AxisToken::Axis(name) => {
                axes.insert(name.clone());
            }
            AxisToken::Group(members) => {
                axes.extend(members.iter().cloned());
            }
            AxisToken::Ellipsis | AxisToken::Singleton | AxisToken::Literal(_) => {}
        }
    }
    axes
}

/// Reject names used twice on one side. Literals only count when they are
/// passed through to `output`, since repeated elided literals are harmless.
fn check_unique(spec: &AxisSpec, output: &AxisSpec, side: Side) -> RearrangeResult<()> {
    let mut seen = HashSet::new();
    let mut seen_literals = HashSet::new();
    let duplicate = |name: String| RearrangeError::DuplicateAxis { name, side };

    for token in spec.iter() {
        match token {
            AxisToken::Axis(name) => {
                if !seen.insert(name.as_str()) {
                    return Err(duplicate(name.clone()));
                }
            }
            AxisToken::Group(members) => {
                for name in members {
                    if !seen.insert(name.as_str()) {
                        return Err(duplicate(name.clone()));
                    }
                }
            }
            AxisToken::Literal(v) if output.contains_literal(*v) => {
                if !seen_literals.insert(*v) {
                    return Err(duplicate(v.to_string()));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Recursive-descent parser over the lexemes of one side
struct SpecParser<'source> {
    lexer: Lexer<'source>,
}

impl<'source> SpecParser<'source> {
    fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Pull the next lexeme, turning lex failures into syntax errors
    fn advance(&mut self) -> RearrangeResult<Option<Lexeme>> {
        match self.lexer.next() {
            None => Ok(None),
            Some(Ok(lexeme)) => Ok(Some(lexeme)),
            Some(Err(())) => Err(RearrangeError::syntax(format!(
                "Unexpected '{}' at position {}",
                self.lexer.slice(),
                self.lexer.span().start
            ))),
        }
    }

    fn parse_spec(&mut self) -> RearrangeResult<AxisSpec> {
        let mut tokens = Vec::new();

        while let Some(lexeme) = self.advance()? {
            let token = match lexeme {
                Lexeme::Ident(name) => AxisToken::Axis(name),
                Lexeme::Number(1) => AxisToken::Singleton,
                Lexeme::Number(v) => AxisToken::Literal(v),
                Lexeme::Ellipsis => {
                    if tokens.contains(&AxisToken::Ellipsis) {
                        return Err(RearrangeError::syntax("Multiple ellipses not supported"));
                    }
                    AxisToken::Ellipsis
                }
                Lexeme::LParen => self.parse_group()?,
                Lexeme::RParen => {
                    return Err(RearrangeError::syntax(format!(
                        "Unmatched closing parenthesis at position {}",
                        self.lexer.span().start
                    )));
                }
            };
            tokens.push(token);
        }

        Ok(AxisSpec::new(tokens))
    }

    /// Parse group members after an opening parenthesis
    fn parse_group(&mut self) -> RearrangeResult<AxisToken> {
        let mut members = Vec::new();

        loop {
            match self.advance()? {
                Some(Lexeme::Ident(name)) => members.push(name),
                Some(Lexeme::RParen) => break,
                Some(Lexeme::LParen) => {
                    return Err(RearrangeError::syntax("Nested parentheses not supported"));
                }
                Some(other) => {
                    return Err(RearrangeError::syntax(format!(
                        "Expected axis name inside group, got '{}'",
                        other
                    )));
                }
                None => return Err(RearrangeError::syntax("Unclosed parenthesis")),
            }
        }

        if members.is_empty() {
            return Err(RearrangeError::syntax("Empty group '()'"));
        }
        Ok(AxisToken::Group(members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn kind_of(pattern: &str) -> ErrorKind {
        Parser::new(pattern).parse().unwrap_err().kind()
    }

    #[test]
    fn test_tokenize_all_token_kinds() {
        let spec = tokenize(" ... (h w) 1 3 c ").unwrap();
        assert_eq!(spec.tokens, vec![
            AxisToken::Ellipsis,
            AxisToken::Group(vec!["h".to_string(), "w".to_string()]),
            AxisToken::Singleton,
            AxisToken::Literal(3),
            AxisToken::Axis("c".to_string()),
        ]);
    }

    #[test]
    fn test_tokenize_empty_side() {
        assert_eq!(tokenize("   ").unwrap(), AxisSpec::default());
    }

    #[test]
    fn test_parse_transpose() {
        let pattern = Parser::new("b h w c -> b c h w").parse().unwrap();
        assert_eq!(pattern.input.to_string(), "b h w c");
        assert_eq!(pattern.output.to_string(), "b c h w");
    }

    #[test]
    fn test_separator_count() {
        assert_eq!(kind_of("a b c"), ErrorKind::Syntax);
        assert_eq!(kind_of("a b c -> (a b) c -> a b c"), ErrorKind::Syntax);
    }

    #[test]
    fn test_group_errors() {
        assert_eq!(kind_of("(h w c -> h w c"), ErrorKind::Syntax);
        assert_eq!(kind_of("h w) c -> h w c"), ErrorKind::Syntax);
        assert_eq!(kind_of("((a b) c d) e -> a b c d e"), ErrorKind::Syntax);
        assert_eq!(kind_of("() c -> c"), ErrorKind::Syntax);
        assert_eq!(kind_of("(a 2) c -> a c"), ErrorKind::Syntax);
    }

    #[test]
    fn test_unlexable_text() {
        assert_eq!(kind_of("a.b -> a b"), ErrorKind::Syntax);
        assert_eq!(kind_of("2a -> a"), ErrorKind::Syntax);
        assert_eq!(kind_of("01 h -> h"), ErrorKind::Syntax);
        assert_eq!(kind_of("h 002 -> h"), ErrorKind::Syntax);
    }

    #[test]
    fn test_ellipsis_rules() {
        assert_eq!(kind_of("... c -> c"), ErrorKind::EllipsisMismatch);
        assert_eq!(kind_of("a (b c) -> ... a b c"), ErrorKind::EllipsisMismatch);
        assert_eq!(kind_of("... a ... -> a ..."), ErrorKind::Syntax);
        assert!(Parser::new("... c -> c ...").parse().is_ok());
    }

    #[test]
    fn test_duplicate_axes() {
        assert_eq!(kind_of("a a b -> b (a a)"), ErrorKind::DuplicateAxis);
        assert_eq!(kind_of("a b -> a (b a)"), ErrorKind::DuplicateAxis);
        assert_eq!(kind_of("(a b) (b c) -> a b c"), ErrorKind::DuplicateAxis);
        assert_eq!(kind_of("2 2 c -> 2 c"), ErrorKind::DuplicateAxis);
        assert!(Parser::new("2 2 c -> c").parse().is_ok());
        assert!(Parser::new("1 h 1 -> h").parse().is_ok());
    }

    #[test]
    fn test_axes_of() {
        let spec = tokenize("... (h w) 1 2 c").unwrap();
        let axes: Vec<_> = axes_of(&spec).into_iter().collect();
        assert_eq!(axes, vec!["c", "h", "w"]);
    }
}
