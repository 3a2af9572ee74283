//! Template → regex.
//!
//! Every capture is a named group `p0`, `p1`, ... so that capture groups
//! inside user constraints (`:id((\d)+)`) never shift parameter positions.
//! `groups[i]` maps `p{i}` to the parameter key.
//!
//! Wildcards: a `*` that is a whole segment (`/files/*`) matches the rest of
//! the path across `/`; a `*` inside a segment (`/ab*cd`) stays inside it.

use std::fmt::Write;

use regex::{Regex, RegexBuilder};

use super::token::{Atom, Repeat, Token};
use crate::error::PatternError;
use crate::options::RouterOptions;

/// What an unconstrained `:param` captures.
const SEGMENT: &str = "[^/]+?";

/// Group wrapping the consumed prefix in mount patterns.
pub(crate) const BASE_GROUP: &str = "base";

/// Where a compiled template must stop matching.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Anchor {
    /// The whole path (routes).
    End,
    /// A leading run of whole segments (mounts).
    Prefix,
}

pub(crate) struct Compiled {
    pub(crate) regex: Regex,
    /// `(group name, param key)`
    pub(crate) groups: Vec<(String, String)>,
}

pub(crate) fn compile(
    tokens: &[Token],
    options: &RouterOptions,
    anchor: Anchor,
) -> Result<Compiled, PatternError> {
    let mut tokens = tokens;
    // `/about/` is `/about` unless strict; a prefix always ends at a boundary
    if (!options.strict || anchor == Anchor::Prefix) && ends_with_slash(tokens) {
        tokens = &tokens[..tokens.len() - 1];
    }

    let mut emitter = Emitter::default();
    emitter.sequence(tokens);

    let source = match anchor {
        Anchor::End if options.strict => format!("^{}$", emitter.out),
        Anchor::End => format!("^{}/?$", emitter.out),
        Anchor::Prefix => format!("^(?P<{BASE_GROUP}>{})(?:/|$)", emitter.out),
    };

    let regex = RegexBuilder::new(&source)
        .case_insensitive(!options.case_sensitive)
        .size_limit(options.regex_size_limit)
        .build()?;

    Ok(Compiled { regex, groups: emitter.groups })
}

fn ends_with_slash(tokens: &[Token]) -> bool {
    matches!(
        tokens.last(),
        Some(Token { atom: Atom::Char('/'), repeat: Repeat::Once })
    )
}

fn is_delimiter(token: &Token) -> bool {
    matches!(token.atom, Atom::Char('/' | '.' | '-')) && token.repeat == Repeat::Once
}

fn suffix(repeat: Repeat) -> &'static str {
    match repeat {
        Repeat::Once => "",
        Repeat::Optional => "?",
        Repeat::OneOrMore => "+",
    }
}

#[derive(Default)]
struct Emitter {
    out: String,
    groups: Vec<(String, String)>,
    wildcards: usize,
}

impl Emitter {
    fn group(&mut self, key: String) -> String {
        let name = format!("p{}", self.groups.len());
        self.groups.push((name.clone(), key));
        name
    }

    fn sequence(&mut self, tokens: &[Token]) {
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];

            // `/:id?` also matches without the `/`
            if is_delimiter(token) {
                let optional_param = tokens.get(i + 1).filter(|t| {
                    matches!(t.atom, Atom::Param { .. }) && t.repeat == Repeat::Optional
                });
                if let Some(next) = optional_param {
                    self.out.push_str("(?:");
                    self.char(token);
                    self.param(next, Repeat::Once);
                    self.out.push_str(")?");
                    i += 2;
                    continue;
                }
            }

            match &token.atom {
                Atom::Char(_) => self.char(token),
                Atom::Class(raw) => {
                    self.out.push_str(raw);
                    self.out.push_str(suffix(token.repeat));
                }
                Atom::Group(inner) => {
                    self.out.push_str("(?:");
                    self.sequence(inner);
                    self.out.push(')');
                    self.out.push_str(suffix(token.repeat));
                }
                Atom::Param { .. } => self.param(token, token.repeat),
                Atom::Wildcard => {
                    let whole_segment = (i == 0 || matches!(tokens[i - 1].atom, Atom::Char('/')))
                        && tokens.get(i + 1).is_none_or(|t| matches!(t.atom, Atom::Char('/')));
                    let key = self.wildcards.to_string();
                    self.wildcards += 1;
                    let name = self.group(key);
                    let body = if whole_segment { ".*" } else { "[^/]*" };
                    let _ = write!(self.out, "(?P<{name}>{body})");
                }
            }
            i += 1;
        }
    }

    fn char(&mut self, token: &Token) {
        if let Atom::Char(c) = token.atom {
            let mut buf = [0u8; 4];
            self.out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            self.out.push_str(suffix(token.repeat));
        }
    }

    fn param(&mut self, token: &Token, repeat: Repeat) {
        let Atom::Param { name, constraint } = &token.atom else {
            return;
        };
        let inner = constraint.as_deref().unwrap_or(SEGMENT);
        let group = self.group(name.clone());
        let _ = match repeat {
            Repeat::Once => write!(self.out, "(?P<{group}>{inner})"),
            Repeat::Optional => write!(self.out, "(?P<{group}>{inner})?"),
            Repeat::OneOrMore => write!(self.out, "(?P<{group}>(?:{inner})(?:/(?:{inner}))*)"),
        };
    }
}
