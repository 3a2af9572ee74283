//! Template tokenizer.
//!
//! ```text
//!  Syntax        Token
//!  c             Char         any character not listed below
//!  \c            Char         escaped metacharacter
//!  [...]         Class        raw regex character class
//!  (...)         Group        grouping, usually followed by `?` or `+`
//!  :name         Param        narrowest non-empty run of non-`/` characters
//!  :name(re)     Param        constrained by `re`
//!  *             Wildcard     see `compile`
//!  ?  +          modifier on the previous token
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::PatternError;

/// One unit of a template, before modifiers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Atom {
    Char(char),
    /// A character class, brackets included: `[\$]`.
    Class(String),
    Group(Vec<Token>),
    Param {
        name: String,
        constraint: Option<String>,
    },
    Wildcard,
}

/// How many times a token may occur.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Repeat {
    Once,
    /// `?`
    Optional,
    /// `+`
    OneOrMore,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub atom: Atom,
    pub repeat: Repeat,
}

impl Token {
    fn once(atom: Atom) -> Self {
        Self { atom, repeat: Repeat::Once }
    }

    pub(crate) fn param_name(&self) -> Option<&str> {
        match &self.atom {
            Atom::Param { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Splits `source` into tokens and checks the result for duplicate and
/// ambiguous parameters.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, PatternError> {
    let mut lexer = Lexer { chars: source.char_indices().peekable() };
    let tokens = lexer.sequence(None)?;

    let mut names = Vec::new();
    validate(&tokens, &mut names)?;
    Ok(tokens)
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl Lexer<'_> {
    /// Reads tokens up to the `)` closing the group opened at `open`, or to
    /// the end of input at top level.
    fn sequence(&mut self, open: Option<usize>) -> Result<Vec<Token>, PatternError> {
        let mut tokens: Vec<Token> = Vec::new();

        while let Some((pos, c)) = self.chars.next() {
            let atom = match c {
                ':' => self.param(pos)?,
                '(' => Atom::Group(self.sequence(Some(pos))?),
                ')' if open.is_some() => return Ok(tokens),
                ')' => return Err(PatternError::UnexpectedClose { pos }),
                '[' => Atom::Class(self.class(pos)?),
                '*' => Atom::Wildcard,
                '?' | '+' => {
                    apply_modifier(tokens.last_mut(), c, pos)?;
                    continue;
                }
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => Atom::Char(escaped),
                    None => return Err(PatternError::TrailingEscape { pos }),
                },
                c => Atom::Char(c),
            };
            tokens.push(Token::once(atom));
        }

        match open {
            Some(pos) => Err(PatternError::Unclosed { open: '(', pos }),
            None => Ok(tokens),
        }
    }

    fn param(&mut self, pos: usize) -> Result<Atom, PatternError> {
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            name.push(c);
            self.chars.next();
        }
        if name.is_empty() {
            return Err(PatternError::MissingName { pos });
        }

        let constraint = match self.chars.peek() {
            Some(&(open, '(')) => {
                self.chars.next();
                Some(self.constraint(open)?)
            }
            _ => None,
        };
        Ok(Atom::Param { name, constraint })
    }

    /// Raw regex up to the matching `)`. Escapes and character classes are
    /// copied through untouched; parentheses inside them do not count.
    fn constraint(&mut self, open: usize) -> Result<String, PatternError> {
        let mut raw = String::new();
        let mut depth = 0usize;
        let mut in_class = false;

        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => {
                    raw.push(c);
                    if let Some((_, escaped)) = self.chars.next() {
                        raw.push(escaped);
                    }
                    continue;
                }
                '[' if !in_class => in_class = true,
                ']' if in_class => in_class = false,
                '(' if !in_class => depth += 1,
                ')' if !in_class => {
                    if depth == 0 {
                        return Ok(raw);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            raw.push(c);
        }
        Err(PatternError::Unclosed { open: '(', pos: open })
    }

    fn class(&mut self, open: usize) -> Result<String, PatternError> {
        let mut raw = String::from('[');
        while let Some((_, c)) = self.chars.next() {
            raw.push(c);
            match c {
                '\\' => {
                    if let Some((_, escaped)) = self.chars.next() {
                        raw.push(escaped);
                    }
                }
                // `[]...]`: a leading `]` is a member, not the end
                ']' if raw.len() > 2 => return Ok(raw),
                _ => {}
            }
        }
        Err(PatternError::Unclosed { open: '[', pos: open })
    }
}

fn apply_modifier(last: Option<&mut Token>, modifier: char, pos: usize) -> Result<(), PatternError> {
    match last {
        Some(token) if token.repeat == Repeat::Once && token.atom != Atom::Wildcard => {
            token.repeat = if modifier == '?' { Repeat::Optional } else { Repeat::OneOrMore };
            Ok(())
        }
        _ => Err(PatternError::DanglingModifier { modifier, pos }),
    }
}

fn validate(tokens: &[Token], names: &mut Vec<String>) -> Result<(), PatternError> {
    for (i, token) in tokens.iter().enumerate() {
        match &token.atom {
            Atom::Param { name, constraint } => {
                if names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateParam(name.clone()));
                }
                names.push(name.clone());

                if constraint.is_none() {
                    if let Some(next) = tokens.get(i + 1) {
                        let second = match &next.atom {
                            Atom::Param { name, .. } => Some(format!(":{name}")),
                            Atom::Wildcard => Some("*".to_owned()),
                            _ => None,
                        };
                        if let Some(second) = second {
                            return Err(PatternError::AmbiguousParams {
                                first: format!(":{name}"),
                                second,
                            });
                        }
                    }
                }
            }
            Atom::Group(inner) => validate(inner, names)?,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<Token> {
        s.chars().map(|c| Token::once(Atom::Char(c))).collect()
    }

    #[test]
    fn plain_characters() {
        assert_eq!(tokenize("/about").unwrap(), chars("/about"));
    }

    #[test]
    fn modifiers_bind_to_previous_token() {
        let tokens = tokenize("/ab?cd").unwrap();
        assert_eq!(tokens[2], Token { atom: Atom::Char('b'), repeat: Repeat::Optional });

        let tokens = tokenize("/ab+cd").unwrap();
        assert_eq!(tokens[2], Token { atom: Atom::Char('b'), repeat: Repeat::OneOrMore });
    }

    #[test]
    fn optional_group() {
        let tokens = tokenize("/ab(cd)?e").unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3], Token { atom: Atom::Group(chars("cd")), repeat: Repeat::Optional });
    }

    #[test]
    fn params_with_and_without_constraint() {
        let tokens = tokenize("/user/:userId(\\d+)").unwrap();
        assert_eq!(
            tokens.last().unwrap().atom,
            Atom::Param { name: "userId".into(), constraint: Some("\\d+".into()) },
        );

        let tokens = tokenize("/flights/:from-:to").unwrap();
        let names: Vec<_> = tokens.iter().filter_map(Token::param_name).collect();
        assert_eq!(names, ["from", "to"]);
    }

    #[test]
    fn constraint_keeps_nested_groups_and_classes() {
        let tokens = tokenize("/:v((?:a|b)[)]+)").unwrap();
        assert_eq!(
            tokens[1].atom,
            Atom::Param { name: "v".into(), constraint: Some("(?:a|b)[)]+".into()) },
        );
    }

    #[test]
    fn class_is_raw() {
        let tokens = tokenize("/data/([\\$])book").unwrap();
        assert_eq!(
            tokens[6].atom,
            Atom::Group(vec![Token::once(Atom::Class("[\\$]".into()))]),
        );
    }

    #[test]
    fn escape_makes_metacharacter_literal() {
        assert_eq!(tokenize("/a\\*b").unwrap(), chars("/a*b"));
    }

    #[test]
    fn rejects_malformed_templates() {
        assert!(matches!(tokenize("/:"), Err(PatternError::MissingName { pos: 1 })));
        assert!(matches!(tokenize("/:a/:a"), Err(PatternError::DuplicateParam(n)) if n == "a"));
        assert!(matches!(tokenize("/(:a)/:a"), Err(PatternError::DuplicateParam(_))));
        assert!(matches!(tokenize("/:a:b"), Err(PatternError::AmbiguousParams { .. })));
        assert!(matches!(tokenize("/:a*"), Err(PatternError::AmbiguousParams { .. })));
        assert!(matches!(tokenize("/ab(cd"), Err(PatternError::Unclosed { open: '(', pos: 3 })));
        assert!(matches!(tokenize("/ab)"), Err(PatternError::UnexpectedClose { pos: 3 })));
        assert!(matches!(tokenize("/[ab"), Err(PatternError::Unclosed { open: '[', .. })));
        assert!(matches!(tokenize("?a"), Err(PatternError::DanglingModifier { modifier: '?', pos: 0 })));
        assert!(matches!(tokenize("/a+?"), Err(PatternError::DanglingModifier { .. })));
        assert!(matches!(tokenize("/*?"), Err(PatternError::DanglingModifier { .. })));
        assert!(matches!(tokenize("/a\\"), Err(PatternError::TrailingEscape { .. })));
    }

    #[test]
    fn constrained_param_may_touch_the_next_one() {
        assert!(tokenize("/:a(\\d+):b").is_ok());
    }

    #[test]
    fn optional_slash() {
        let tokens = tokenize("/foo/?").unwrap();
        assert_eq!(tokens[4], Token { atom: Atom::Char('/'), repeat: Repeat::Optional });
    }
}
