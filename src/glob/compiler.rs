//! Glob Compiler
//!
//! Turns a parsed [`Glob`] into a [`QueryFragment`] on the metric-name
//! field, and builds the "one more level" regex used for tree browsing.
//!
//! # Translation
//!
//! ```text
//! one.two.three           → term      one.two.three
//! one.two.*               → wildcard  one.two.*
//! one.two.three0?         → wildcard  one.two.three0?
//! one.{a,b}.c[0-2]        → regexp    one\.(a|b)\.c[0-2]
//! ```
//!
//! Emitted regexes stay inside the syntax shared by Lucene regexps and
//! the `regex` crate: escaped literals, `.`, `.*`, classes, groups and
//! `|`. Lucene-only operator characters are wrapped in a one-character
//! class instead of being backslash-escaped.

use regex::Regex;

use crate::glob::ast::{ClassItem, Glob, GlobToken};
use crate::glob::error::{GlobError, GlobResult};
use crate::glob::parser::parse_glob;
use crate::query::{fields, QueryFragment};

/// How far a `*` / `?` may reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Across dots, as in a plain search
    Unbounded,
    /// Within one dot segment, as in next-level enumeration
    Segment,
}

/// Translate a glob pattern into a metric-name query fragment.
///
/// Literal patterns become an exact term, `*`/`?`-only patterns a
/// wildcard, and anything with a bracket class or brace alternation a
/// single regexp equivalent to the union of its branches.
pub fn translate_query(pattern: &str) -> GlobResult<QueryFragment> {
    let glob = parse_glob(pattern)?;
    Ok(compile(&glob))
}

/// Compile an already parsed glob
pub fn compile(glob: &Glob) -> QueryFragment {
    if let Some(literal) = glob.literal() {
        return QueryFragment::term(fields::METRIC_NAME, literal);
    }

    if glob.needs_regex() {
        let mut body = String::new();
        write_regex(glob.tokens(), Scope::Unbounded, &mut body);
        return QueryFragment::regexp(fields::METRIC_NAME, body);
    }

    QueryFragment::wildcard(fields::METRIC_NAME, wildcard_value(glob.tokens()))
}

/// Regex matching names with exactly one more dot segment than `prefix`.
///
/// A prefix of N segments (a trailing `*` counts as one segment) yields
/// a regex accepting exactly N+1 segments whose first N satisfy the
/// prefix. Wildcards in the prefix never cross a dot.
///
/// ```text
/// "*"          → accepts foo.bar            rejects foo, foo.bar.baz
/// "foo.bar.*"  → accepts foo.bar.baz.qux    rejects foo.bar.baz, foo.bar.baz.qux.quux
/// ```
///
/// The result is anchored (`^...$`) for use with the `regex` crate.
pub fn enumerate_next_level(prefix: &str) -> GlobResult<String> {
    Ok(format!("^(?:{})$", next_level_body(prefix)?))
}

/// Compiled form of [`enumerate_next_level`]
pub fn next_level_matcher(prefix: &str) -> GlobResult<Regex> {
    let anchored = enumerate_next_level(prefix)?;
    Regex::new(&anchored).map_err(|_| GlobError::Syntax {
        pattern: prefix.to_string(),
        position: 0,
    })
}

/// Next-level enumeration as a regexp fragment on the metric-name field
pub fn next_level_fragment(prefix: &str) -> GlobResult<QueryFragment> {
    Ok(QueryFragment::regexp(
        fields::METRIC_NAME,
        next_level_body(prefix)?,
    ))
}

/// Unanchored enumeration regex; backend regexps anchor implicitly
fn next_level_body(prefix: &str) -> GlobResult<String> {
    let glob = parse_glob(prefix)?;
    let segments = glob.segments();

    if segments.iter().any(|s| s.is_empty()) {
        return Err(GlobError::EmptySegment(prefix.to_string()));
    }

    let mut body = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            body.push_str("\\.");
        }
        write_regex(segment, Scope::Segment, &mut body);
    }
    body.push_str("\\.[^.]+");

    Ok(body)
}

/// Wildcard syntax for a `*`/`?`-only pattern
fn wildcard_value(tokens: &[GlobToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            GlobToken::Literal(c) => {
                if matches!(c, '*' | '?' | '\\') {
                    out.push('\\');
                }
                out.push(*c);
            }
            GlobToken::AnyString => out.push('*'),
            GlobToken::AnyChar => out.push('?'),
            GlobToken::Class { .. } | GlobToken::Alternation(_) => {}
        }
    }
    out
}

fn write_regex(tokens: &[GlobToken], scope: Scope, out: &mut String) {
    for token in tokens {
        match token {
            GlobToken::Literal(c) => push_literal(*c, out),
            GlobToken::AnyString => out.push_str(match scope {
                Scope::Unbounded => ".*",
                Scope::Segment => "[^.]*",
            }),
            GlobToken::AnyChar => out.push_str(match scope {
                Scope::Unbounded => ".",
                Scope::Segment => "[^.]",
            }),
            GlobToken::Class { negated, items } => {
                out.push('[');
                if *negated {
                    out.push('^');
                    if scope == Scope::Segment {
                        out.push_str("\\.");
                    }
                }
                for item in items {
                    match *item {
                        ClassItem::Char(c) => push_class_char(c, out),
                        ClassItem::Range(lo, hi) => {
                            push_class_char(lo, out);
                            out.push('-');
                            push_class_char(hi, out);
                        }
                    }
                }
                out.push(']');
            }
            GlobToken::Alternation(branches) => {
                out.push('(');
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    if branch.is_empty() {
                        out.push_str("()");
                    } else {
                        write_regex(branch, scope, out);
                    }
                }
                out.push(')');
            }
        }
    }
}

fn push_literal(c: char, out: &mut String) {
    match c {
        '.' | '?' | '+' | '*' | '|' | '{' | '}' | '[' | ']' | '(' | ')' | '\\' | '^' | '$' => {
            out.push('\\');
            out.push(c);
        }
        '"' | '#' | '@' | '&' | '<' | '>' | '~' => {
            out.push('[');
            out.push(c);
            out.push(']');
        }
        _ => out.push(c),
    }
}

fn push_class_char(c: char, out: &mut String) {
    if matches!(c, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching<'a>(prefix: &str, terms: &[&'a str]) -> Vec<&'a str> {
        let re = next_level_matcher(prefix).unwrap();
        terms.iter().copied().filter(|t| re.is_match(t)).collect()
    }

    /// Evaluate a regexp fragment the way the backend does (whole value)
    fn regexp_matches(fragment: &QueryFragment, name: &str) -> bool {
        let QueryFragment::Regexp { value, .. } = fragment else {
            panic!("expected regexp, got {:?}", fragment);
        };
        Regex::new(&format!("^(?:{})$", value)).unwrap().is_match(name)
    }

    #[test]
    fn test_literal_becomes_term() {
        assert_eq!(
            translate_query("one.two.three00.fourA.five1").unwrap(),
            QueryFragment::term("metric_name", "one.two.three00.fourA.five1")
        );
        assert_eq!(
            translate_query(r"a\*b").unwrap(),
            QueryFragment::term("metric_name", "a*b")
        );
    }

    #[test]
    fn test_star_and_question_become_wildcard() {
        assert_eq!(
            translate_query("one.two.*").unwrap(),
            QueryFragment::wildcard("metric_name", "one.two.*")
        );
        assert_eq!(
            translate_query("one.two.three0?.fourA.five0").unwrap(),
            QueryFragment::wildcard("metric_name", "one.two.three0?.fourA.five0")
        );
    }

    #[test]
    fn test_escaped_metachar_stays_escaped_in_wildcard() {
        assert_eq!(
            translate_query(r"a\?.*").unwrap(),
            QueryFragment::wildcard("metric_name", r"a\?.*")
        );
    }

    #[test]
    fn test_alternation_becomes_regexp() {
        let q = translate_query("one.two.{three00,three01}.fourA.five0").unwrap();
        assert_eq!(
            q,
            QueryFragment::regexp("metric_name", r"one\.two\.(three00|three01)\.fourA\.five0")
        );
        assert!(regexp_matches(&q, "one.two.three00.fourA.five0"));
        assert!(regexp_matches(&q, "one.two.three01.fourA.five0"));
        assert!(!regexp_matches(&q, "one.two.three02.fourA.five0"));
    }

    #[test]
    fn test_class_becomes_regexp() {
        let q = translate_query("a.[0-2].b").unwrap();
        assert_eq!(q, QueryFragment::regexp("metric_name", r"a\.[0-2]\.b"));
        for ok in ["a.0.b", "a.1.b", "a.2.b"] {
            assert!(regexp_matches(&q, ok), "{}", ok);
        }
        assert!(!regexp_matches(&q, "a.3.b"));
        assert!(!regexp_matches(&q, "a.10.b"));
    }

    #[test]
    fn test_nested_brace_and_class() {
        let q = translate_query("a.{b,c}.d[0-2].e").unwrap();
        assert!(regexp_matches(&q, "a.b.d0.e"));
        assert!(regexp_matches(&q, "a.c.d2.e"));
        assert!(!regexp_matches(&q, "a.c.d3.e"));
        assert!(!regexp_matches(&q, "a.x.d1.e"));

        let q = translate_query("x.{y[0-1],z*}").unwrap();
        assert!(regexp_matches(&q, "x.y1"));
        assert!(regexp_matches(&q, "x.z.deeper"));
        assert!(!regexp_matches(&q, "x.y2"));
    }

    #[test]
    fn test_star_crosses_dots_in_regexp() {
        let q = translate_query("{a,b}.*").unwrap();
        assert!(regexp_matches(&q, "a.x.y.z"));
    }

    #[test]
    fn test_negated_class() {
        let q = translate_query("a[!0-2]").unwrap();
        assert!(regexp_matches(&q, "a3"));
        assert!(!regexp_matches(&q, "a1"));
    }

    #[test]
    fn test_empty_branch() {
        let q = translate_query("cpu{,_total}").unwrap();
        assert!(regexp_matches(&q, "cpu"));
        assert!(regexp_matches(&q, "cpu_total"));
    }

    #[test]
    fn test_regex_literal_escaping() {
        let q = translate_query("a+b(c)|$.{x,y}").unwrap();
        assert!(regexp_matches(&q, "a+b(c)|$.x"));
        assert!(!regexp_matches(&q, "aab(c)|$.x"));

        let q = translate_query("a<b>#@~&\"{1,2}").unwrap();
        assert!(regexp_matches(&q, "a<b>#@~&\"1"));
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(translate_query("a.{b,c").is_err());
        assert!(translate_query("a.[0-2.b").is_err());
        assert!(translate_query("").is_err());
    }

    #[test]
    fn test_next_level_root() {
        let terms = ["foo", "bar", "baz", "foo.bar", "foo.bar.baz", "foo.bar.baz.aux"];
        assert_eq!(matching("*", &terms), vec!["foo.bar"]);
    }

    #[test]
    fn test_next_level_one() {
        let terms = ["foo", "bar", "baz", "foo.bar", "foo.bar.baz", "foo.bar.baz.aux"];
        assert_eq!(matching("foo.*", &terms), vec!["foo.bar.baz"]);
    }

    #[test]
    fn test_next_level_two() {
        let terms = [
            "foo",
            "bar",
            "baz",
            "foo.bar",
            "foo.bar.baz",
            "foo.bar.baz.qux",
            "foo.bar.baz.qux.quux",
        ];
        assert_eq!(matching("foo.bar.*", &terms), vec!["foo.bar.baz.qux"]);
    }

    #[test]
    fn test_next_level_three() {
        let terms = [
            "foo.bar.baz",
            "foo.bar.baz.qux",
            "foo.bar.baz.qux.quux",
            "foo.bar.baz.qux.quux.corge",
        ];
        assert_eq!(matching("foo.bar.baz.*", &terms), vec!["foo.bar.baz.qux.quux"]);
    }

    #[test]
    fn test_next_level_literal_prefix() {
        let terms = ["foo", "foo.bar", "foo.bar.baz", "other.bar"];
        assert_eq!(matching("foo", &terms), vec!["foo.bar"]);
    }

    #[test]
    fn test_next_level_wildcards_stay_in_segment() {
        let terms = ["fooX.bar", "foo.x.bar", "foo.bar"];
        assert_eq!(matching("foo*", &terms), vec!["fooX.bar", "foo.bar"]);

        let terms = ["a.b.c", "a.x.c", "a.b.c.d"];
        assert_eq!(matching("a.{b,x}", &terms), vec!["a.b.c", "a.x.c"]);
    }

    #[test]
    fn test_next_level_is_anchored() {
        let pattern = enumerate_next_level("*").unwrap();
        assert!(pattern.starts_with('^') && pattern.ends_with('$'));
        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("foo.bar"));
        assert!(!re.is_match("foo.bar.baz"));
    }

    #[test]
    fn test_next_level_fragment_is_unanchored() {
        let q = next_level_fragment("foo.*").unwrap();
        assert_eq!(q, QueryFragment::regexp("metric_name", r"foo\.[^.]*\.[^.]+"));
    }

    #[test]
    fn test_next_level_empty_segment() {
        assert!(matches!(
            enumerate_next_level("foo..*"),
            Err(GlobError::EmptySegment(_))
        ));
        assert!(matches!(
            enumerate_next_level("foo."),
            Err(GlobError::EmptySegment(_))
        ));
    }
}
