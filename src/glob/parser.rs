//! Glob Parser
//!
//! Parses Graphite-style metric globs into a [`Glob`].
//!
//! # Supported Syntax
//!
//! ```text
//! *          zero or more characters (crosses dots)
//! ?          exactly one character
//! [abc]      one character from the class; ranges like [0-9]
//! [!abc]     one character not in the class ([^abc] also accepted)
//! {a,b,c}    alternation; branches may contain any of the above
//! \x         literal x
//! ```
//!
//! # Examples
//!
//! ```text
//! one.two.three00.fourA.five1
//! one.two.*.fourA.five2
//! one.two.three0[0-9].fourA.five0
//! a.{b,c}.d[0-2].e
//! ```

use nom::{
    branch::alt,
    character::complete::{anychar, char, one_of, satisfy},
    combinator::{map, opt, value},
    multi::{many1, separated_list1},
    sequence::{delimited, preceded},
    IResult,
};

use crate::glob::ast::{ClassItem, Glob, GlobToken};
use crate::glob::error::{GlobError, GlobResult};

const SPECIAL: &str = "*?[]{}\\";

/// Parse a glob pattern
pub fn parse_glob(pattern: &str) -> GlobResult<Glob> {
    if pattern.trim().is_empty() {
        return Err(GlobError::Empty);
    }

    // Structural problems get precise errors before nom sees the input
    check_balance(pattern)?;

    match sequence(pattern, false) {
        Ok((remaining, tokens)) => {
            if !remaining.is_empty() {
                return Err(GlobError::Syntax {
                    pattern: pattern.to_string(),
                    position: offset(pattern, remaining),
                });
            }
            validate_ranges(pattern, &tokens)?;
            Ok(Glob::new(pattern, tokens))
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(GlobError::Syntax {
            pattern: pattern.to_string(),
            position: offset(pattern, e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(GlobError::Syntax {
            pattern: pattern.to_string(),
            position: pattern.chars().count(),
        }),
    }
}

/// Character offset of `rest` within `pattern`
fn offset(pattern: &str, rest: &str) -> usize {
    pattern.chars().count() - rest.chars().count()
}

/// Parse tokens until one fails to match. Never errors itself; the caller
/// decides whether leftover input is acceptable.
fn sequence(mut input: &str, in_braces: bool) -> IResult<&str, Vec<GlobToken>> {
    let mut tokens = Vec::new();
    loop {
        match token(input, in_braces) {
            Ok((rest, tok)) => {
                tokens.push(tok);
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, tokens)),
            Err(e) => return Err(e),
        }
    }
}

fn token(input: &str, in_braces: bool) -> IResult<&str, GlobToken> {
    alt((
        value(GlobToken::AnyString, char('*')),
        value(GlobToken::AnyChar, char('?')),
        map(preceded(char('\\'), anychar), GlobToken::Literal),
        class,
        alternation,
        map(
            satisfy(move |c| !SPECIAL.contains(c) && !(in_braces && c == ',')),
            GlobToken::Literal,
        ),
    ))(input)
}

/// `{a,b,c}`
fn alternation(input: &str) -> IResult<&str, GlobToken> {
    map(
        delimited(
            char('{'),
            separated_list1(char(','), |i| sequence(i, true)),
            char('}'),
        ),
        GlobToken::Alternation,
    )(input)
}

/// `[...]`
fn class(input: &str) -> IResult<&str, GlobToken> {
    let (input, _) = char('[')(input)?;
    let (input, negated) = opt(one_of("!^"))(input)?;
    let (input, items) = many1(class_item)(input)?;
    let (input, _) = char(']')(input)?;

    Ok((
        input,
        GlobToken::Class {
            negated: negated.is_some(),
            items,
        },
    ))
}

fn class_item(input: &str) -> IResult<&str, ClassItem> {
    let (input, lo) = class_char(input)?;
    let (input, hi) = opt(preceded(char('-'), class_char))(input)?;

    Ok((
        input,
        match hi {
            Some(hi) => ClassItem::Range(lo, hi),
            None => ClassItem::Char(lo),
        },
    ))
}

fn class_char(input: &str) -> IResult<&str, char> {
    alt((
        preceded(char('\\'), anychar),
        satisfy(|c| c != ']' && c != '\\'),
    ))(input)
}

/// Scan for unbalanced braces/brackets and dangling escapes
fn check_balance(pattern: &str) -> GlobResult<()> {
    let mut braces: Vec<usize> = Vec::new();
    // (start position, members seen, negation seen)
    let mut class: Option<(usize, usize, bool)> = None;
    let mut chars = pattern.chars().enumerate();

    while let Some((pos, c)) = chars.next() {
        if c == '\\' {
            if chars.next().is_none() {
                return Err(GlobError::TrailingEscape(pattern.to_string()));
            }
            if let Some((_, members, _)) = class.as_mut() {
                *members += 1;
            }
            continue;
        }

        if let Some((start, members, negated)) = class.as_mut() {
            match c {
                ']' if *members == 0 => {
                    return Err(GlobError::EmptyClass {
                        pattern: pattern.to_string(),
                        position: *start,
                    });
                }
                ']' => class = None,
                '!' | '^' if *members == 0 && !*negated => *negated = true,
                _ => *members += 1,
            }
            continue;
        }

        match c {
            '[' => class = Some((pos, 0, false)),
            '{' => braces.push(pos),
            '}' => {
                if braces.pop().is_none() {
                    return Err(GlobError::UnexpectedCloser {
                        pattern: pattern.to_string(),
                        found: '}',
                        position: pos,
                    });
                }
            }
            ']' => {
                return Err(GlobError::UnexpectedCloser {
                    pattern: pattern.to_string(),
                    found: ']',
                    position: pos,
                });
            }
            _ => {}
        }
    }

    if let Some((position, _, _)) = class {
        return Err(GlobError::UnclosedBracket {
            pattern: pattern.to_string(),
            position,
        });
    }
    if let Some(&position) = braces.last() {
        return Err(GlobError::UnclosedBrace {
            pattern: pattern.to_string(),
            position,
        });
    }
    Ok(())
}

fn validate_ranges(pattern: &str, tokens: &[GlobToken]) -> GlobResult<()> {
    for token in tokens {
        match token {
            GlobToken::Class { items, .. } => {
                for item in items {
                    if let ClassItem::Range(start, end) = *item {
                        if start > end {
                            return Err(GlobError::InvalidRange {
                                pattern: pattern.to_string(),
                                start,
                                end,
                            });
                        }
                    }
                }
            }
            GlobToken::Alternation(branches) => {
                for branch in branches {
                    validate_ranges(pattern, branch)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(s: &str) -> Vec<GlobToken> {
        s.chars().map(GlobToken::Literal).collect()
    }

    #[test]
    fn test_parse_literal() {
        let glob = parse_glob("one.two.three").unwrap();
        assert!(glob.literal().is_some());
        assert_eq!(glob.tokens(), lits("one.two.three").as_slice());
    }

    #[test]
    fn test_parse_wildcards() {
        let glob = parse_glob("a.*.b?").unwrap();
        assert_eq!(
            glob.tokens(),
            &[
                GlobToken::Literal('a'),
                GlobToken::Literal('.'),
                GlobToken::AnyString,
                GlobToken::Literal('.'),
                GlobToken::Literal('b'),
                GlobToken::AnyChar,
            ]
        );
        assert!(!glob.needs_regex());
    }

    #[test]
    fn test_parse_class() {
        let glob = parse_glob("x[0-2a]").unwrap();
        assert_eq!(
            glob.tokens()[1],
            GlobToken::Class {
                negated: false,
                items: vec![ClassItem::Range('0', '2'), ClassItem::Char('a')],
            }
        );

        let glob = parse_glob("[!ab]").unwrap();
        assert!(matches!(glob.tokens()[0], GlobToken::Class { negated: true, .. }));
    }

    #[test]
    fn test_class_trailing_dash_is_literal() {
        let glob = parse_glob("[a-]").unwrap();
        assert_eq!(
            glob.tokens()[0],
            GlobToken::Class {
                negated: false,
                items: vec![ClassItem::Char('a'), ClassItem::Char('-')],
            }
        );
    }

    #[test]
    fn test_parse_nested_alternation_and_class() {
        let glob = parse_glob("a.{b,c[0-1]}.d").unwrap();
        let GlobToken::Alternation(branches) = &glob.tokens()[2] else {
            panic!("expected alternation");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0], lits("b"));
        assert_eq!(branches[1].len(), 2);

        let glob = parse_glob("a{b,{c,d}}").unwrap();
        assert!(glob.needs_regex());
    }

    #[test]
    fn test_empty_branch_allowed() {
        let glob = parse_glob("a{,b}").unwrap();
        let GlobToken::Alternation(branches) = &glob.tokens()[1] else {
            panic!("expected alternation");
        };
        assert!(branches[0].is_empty());
    }

    #[test]
    fn test_top_level_comma_is_literal() {
        let glob = parse_glob("a,b").unwrap();
        assert!(glob.literal().is_some());
    }

    #[test]
    fn test_escapes() {
        let glob = parse_glob(r"a\*b\{").unwrap();
        assert!(glob.literal().is_some());
        assert_eq!(glob.literal().as_deref(), Some("a*b{"));
    }

    #[test]
    fn test_malformed_patterns_rejected() {
        assert_eq!(parse_glob(""), Err(GlobError::Empty));
        assert!(matches!(
            parse_glob("a.{b,c"),
            Err(GlobError::UnclosedBrace { position: 2, .. })
        ));
        assert!(matches!(
            parse_glob("a.[0-2"),
            Err(GlobError::UnclosedBracket { position: 2, .. })
        ));
        assert!(matches!(
            parse_glob("a}"),
            Err(GlobError::UnexpectedCloser { found: '}', .. })
        ));
        assert!(matches!(
            parse_glob("a]"),
            Err(GlobError::UnexpectedCloser { found: ']', .. })
        ));
        assert!(matches!(parse_glob("a[]"), Err(GlobError::EmptyClass { .. })));
        assert!(matches!(parse_glob("a[!]"), Err(GlobError::EmptyClass { .. })));
        assert!(matches!(
            parse_glob("a[9-0]"),
            Err(GlobError::InvalidRange { start: '9', end: '0', .. })
        ));
        assert!(matches!(parse_glob("a\\"), Err(GlobError::TrailingEscape(_))));
    }
}
