//! Glob AST
//!
//! Parsed form of a Graphite-style metric glob. A pattern is a flat
//! sequence of tokens; alternation branches are themselves sequences, so
//! braces and bracket classes nest freely.

/// A single element of a glob pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobToken {
    /// A literal character (escapes already resolved)
    Literal(char),
    /// `*` - zero or more characters, dots included
    AnyString,
    /// `?` - exactly one character
    AnyChar,
    /// `[...]` / `[!...]` - single character class
    Class { negated: bool, items: Vec<ClassItem> },
    /// `{a,b,c}` - union of the branches
    Alternation(Vec<Vec<GlobToken>>),
}

/// Member of a bracket class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem {
    Char(char),
    Range(char, char),
}

impl ClassItem {
    /// Whether `c` falls inside this item
    pub fn contains(&self, c: char) -> bool {
        match *self {
            ClassItem::Char(x) => x == c,
            ClassItem::Range(lo, hi) => lo <= c && c <= hi,
        }
    }
}

/// A parsed glob pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    source: String,
    tokens: Vec<GlobToken>,
}

impl Glob {
    pub(crate) fn new(source: &str, tokens: Vec<GlobToken>) -> Self {
        Self {
            source: source.to_string(),
            tokens,
        }
    }

    /// The pattern text this glob was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed tokens
    pub fn tokens(&self) -> &[GlobToken] {
        &self.tokens
    }

    /// The literal value of the pattern, with escapes resolved.
    /// `None` if the pattern has any wildcard.
    pub fn literal(&self) -> Option<String> {
        self.tokens
            .iter()
            .map(|t| match t {
                GlobToken::Literal(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// True if the pattern needs more than `*` and `?` to express,
    /// i.e. it has a bracket class or a brace alternation.
    pub fn needs_regex(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, GlobToken::Class { .. } | GlobToken::Alternation(_)))
    }

    /// Whether `word` can be read off the pattern's literals, classes and
    /// alternation branches, ignoring ASCII case. Escapes are already
    /// resolved, so `tenant\Id` and `tenant{I}d` both spell `tenantid`.
    /// `*`, `?` and negated classes break a spelling.
    pub fn spells(&self, word: &str) -> bool {
        let word: Vec<char> = word.chars().map(|c| c.to_ascii_lowercase()).collect();
        if word.is_empty() {
            return true;
        }
        let mut found = false;
        walk_spelling(&self.tokens, &word, vec![0], &mut found);
        found
    }

    /// Split on top-level dots. Dots inside braces or classes do not
    /// count as separators.
    pub fn segments(&self) -> Vec<&[GlobToken]> {
        self.tokens
            .split(|t| matches!(t, GlobToken::Literal('.')))
            .collect()
    }
}

/// Advance the partial matches of `word` (counts of leading chars matched
/// so far, always including 0) across `tokens`
fn walk_spelling(
    tokens: &[GlobToken],
    word: &[char],
    mut states: Vec<usize>,
    found: &mut bool,
) -> Vec<usize> {
    for token in tokens {
        if *found {
            break;
        }
        states = match token {
            GlobToken::Literal(c) => advance(&states, word, |w| c.to_ascii_lowercase() == w),
            GlobToken::Class {
                negated: false,
                items,
            } => advance(&states, word, |w| {
                items
                    .iter()
                    .any(|i| i.contains(w) || i.contains(w.to_ascii_uppercase()))
            }),
            GlobToken::AnyString | GlobToken::AnyChar | GlobToken::Class { .. } => vec![0],
            GlobToken::Alternation(branches) => {
                let mut next = Vec::new();
                for branch in branches {
                    for s in walk_spelling(branch, word, states.clone(), found) {
                        if !next.contains(&s) {
                            next.push(s);
                        }
                    }
                }
                next
            }
        };
        if states.contains(&word.len()) {
            *found = true;
        }
    }
    states
}

fn advance(states: &[usize], word: &[char], accepts: impl Fn(char) -> bool) -> Vec<usize> {
    let mut next = vec![0];
    for &s in states {
        if s < word.len() && accepts(word[s]) && !next.contains(&(s + 1)) {
            next.push(s + 1);
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_item_contains() {
        assert!(ClassItem::Char('a').contains('a'));
        assert!(!ClassItem::Char('a').contains('b'));
        assert!(ClassItem::Range('0', '2').contains('1'));
        assert!(!ClassItem::Range('0', '2').contains('3'));
    }

    #[test]
    fn test_literal_detection() {
        let glob = Glob::new(
            "a.b",
            vec![
                GlobToken::Literal('a'),
                GlobToken::Literal('.'),
                GlobToken::Literal('b'),
            ],
        );
        assert_eq!(glob.literal().as_deref(), Some("a.b"));
        assert!(!glob.needs_regex());

        let glob = Glob::new("a*", vec![GlobToken::Literal('a'), GlobToken::AnyString]);
        assert_eq!(glob.literal(), None);
    }

    #[test]
    fn test_segments_ignore_nested_dots() {
        let glob = Glob::new(
            "a.{b.c,d}",
            vec![
                GlobToken::Literal('a'),
                GlobToken::Literal('.'),
                GlobToken::Alternation(vec![
                    vec![
                        GlobToken::Literal('b'),
                        GlobToken::Literal('.'),
                        GlobToken::Literal('c'),
                    ],
                    vec![GlobToken::Literal('d')],
                ]),
            ],
        );
        assert_eq!(glob.segments().len(), 2);
        assert!(glob.needs_regex());
    }

    #[test]
    fn test_spells_through_glob_syntax() {
        let lit = |s: &str| s.chars().map(GlobToken::Literal).collect::<Vec<_>>();

        let glob = Glob::new("a.TenantId", lit("a.TenantId"));
        assert!(glob.spells("tenantid"));

        let mut tokens = lit("tenant");
        tokens.push(GlobToken::Class {
            negated: false,
            items: vec![ClassItem::Range('H', 'J')],
        });
        tokens.extend(lit("d"));
        assert!(Glob::new("tenant[H-J]d", tokens).spells("tenantid"));

        let mut tokens = vec![GlobToken::Alternation(vec![lit("x"), lit("tenant")])];
        tokens.extend(lit("Id"));
        assert!(Glob::new("{x,tenant}Id", tokens).spells("tenantid"));

        let mut tokens = lit("tenant");
        tokens.push(GlobToken::AnyChar);
        tokens.extend(lit("d"));
        assert!(!Glob::new("tenant?d", tokens).spells("tenantid"));

        let mut tokens = lit("tenant");
        tokens.push(GlobToken::Class {
            negated: true,
            items: vec![ClassItem::Char('x')],
        });
        tokens.extend(lit("d"));
        assert!(!Glob::new("tenant[!x]d", tokens).spells("tenantid"));
    }
}
