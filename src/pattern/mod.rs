//! Route paths: literal strings, templates and regular expressions.
//!
//! ```text
//!  Path                      Kind       Matches
//!  /about                    Literal    /about
//!  /random.text              Literal    /random.text
//!  /ab?cd                    Template   /acd /abcd
//!  /ab+cd                    Template   /abcd /abbcd /abbbcd ...
//!  /ab*cd                    Template   /abcd /abxcd /abRANDOMcd ...
//!  /ab(cd)?e                 Template   /abe /abcde
//!  /users/:userId            Template   /users/34           userId=34
//!  /flights/:from-:to        Template   /flights/LAX-SFO    from=LAX to=SFO
//!  /user/:userId(\d+)        Template   /user/42            userId=42
//!  Regex::new(".*fly$")      Regex      /butterfly /dragonfly
//! ```
//!
//! A pattern is compiled once, when its route is registered. Matching is a
//! read-only operation on the compiled form.

mod compile;
mod token;

use std::collections::HashMap;

use regex::Regex;

use crate::error::PatternError;
use crate::options::RouterOptions;

use compile::{Anchor, BASE_GROUP, Compiled};

pub use token::{Atom, Repeat, Token};

/// Characters that turn a path into a template.
const METACHARACTERS: &[char] = &[':', '?', '+', '*', '(', ')', '[', ']', '\\'];

/// Something a route can be registered under: a path string or a [`Regex`].
pub enum PatternSource {
    Path(String),
    Regex(Regex),
}

impl From<&str> for PatternSource {
    fn from(s: &str) -> Self { Self::Path(s.to_owned()) }
}

impl From<String> for PatternSource {
    fn from(s: String) -> Self { Self::Path(s) }
}

impl From<Regex> for PatternSource {
    fn from(r: Regex) -> Self { Self::Regex(r) }
}

/// The parsed shape of a pattern.
#[derive(Clone, Debug)]
pub enum PatternSpec {
    Literal(String),
    Template(Vec<Token>),
    Regex(String),
}

/// A compiled route path.
pub struct Pattern {
    source: String,
    spec: PatternSpec,
    anchor: Anchor,
    matcher: Matcher,
}

enum Matcher {
    Literal {
        /// Without the trailing `/` unless it is significant.
        text: String,
        trailing_slash: bool,
    },
    Template(Compiled),
    Regex {
        regex: Regex,
        /// `(capture index, param key)`
        groups: Vec<(usize, String)>,
    },
}

/// A successful match: how much of the path was consumed, and the params.
pub(crate) struct Captured {
    pub(crate) len: usize,
    pub(crate) params: HashMap<String, String>,
}

impl Pattern {
    /// Compiles a route pattern matched against the whole path.
    pub fn new(source: impl Into<PatternSource>, options: &RouterOptions) -> Result<Self, PatternError> {
        Self::build(source.into(), options, Anchor::End)
    }

    /// Compiles a mount prefix: matches leading whole segments of a path.
    pub fn prefix(source: impl Into<PatternSource>, options: &RouterOptions) -> Result<Self, PatternError> {
        Self::build(source.into(), options, Anchor::Prefix)
    }

    fn build(source: PatternSource, options: &RouterOptions, anchor: Anchor) -> Result<Self, PatternError> {
        let path = match source {
            PatternSource::Regex(regex) => return Ok(Self::regex(regex, anchor)),
            PatternSource::Path(path) => path,
        };
        if !path.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(path));
        }

        if !path.contains(METACHARACTERS) {
            let spec = PatternSpec::Literal(path.clone());
            if !options.case_sensitive {
                // fold case the way templates do, through the regex engine
                let compiled = compile::compile(&token::tokenize(&path)?, options, anchor)?;
                return Ok(Self { source: path, spec, anchor, matcher: Matcher::Template(compiled) });
            }
            let significant = options.strict && anchor == Anchor::End;
            let text = match path.strip_suffix('/') {
                Some(trimmed) if !significant => trimmed.to_owned(),
                _ => path.clone(),
            };
            return Ok(Self {
                matcher: Matcher::Literal {
                    text,
                    trailing_slash: !significant && anchor == Anchor::End,
                },
                spec,
                source: path,
                anchor,
            });
        }

        let tokens = token::tokenize(&path)?;
        let compiled = compile::compile(&tokens, options, anchor)?;
        Ok(Self {
            source: path,
            spec: PatternSpec::Template(tokens),
            anchor,
            matcher: Matcher::Template(compiled),
        })
    }

    fn regex(regex: Regex, anchor: Anchor) -> Self {
        let mut unnamed = 0;
        let groups = regex
            .capture_names()
            .enumerate()
            .skip(1)
            .map(|(i, name)| match name {
                Some(name) => (i, name.to_owned()),
                None => {
                    unnamed += 1;
                    (i, (unnamed - 1).to_string())
                }
            })
            .collect();
        Self {
            source: regex.as_str().to_owned(),
            spec: PatternSpec::Regex(regex.as_str().to_owned()),
            anchor,
            matcher: Matcher::Regex { regex, groups },
        }
    }

    /// The text the pattern was registered with.
    pub fn as_str(&self) -> &str { &self.source }

    pub fn spec(&self) -> &PatternSpec { &self.spec }

    /// Names of the template's parameters, in order of appearance.
    pub fn param_names(&self) -> Vec<&str> {
        fn walk<'a>(tokens: &'a [Token], out: &mut Vec<&'a str>) {
            for token in tokens {
                match &token.atom {
                    Atom::Group(inner) => walk(inner, out),
                    _ => out.extend(token.param_name()),
                }
            }
        }
        let mut names = Vec::new();
        if let PatternSpec::Template(tokens) = &self.spec {
            walk(tokens, &mut names);
        }
        names
    }

    /// Matches `path` and returns the bound parameters.
    ///
    /// For a prefix pattern this succeeds when the pattern matches the
    /// leading segments of `path`.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        self.capture(path).map(|c| c.params)
    }

    pub(crate) fn capture(&self, path: &str) -> Option<Captured> {
        let prefix = self.anchor == Anchor::Prefix;
        match &self.matcher {
            Matcher::Literal { text, trailing_slash } => {
                let len = path.starts_with(text.as_str()).then_some(text.len())?;
                let rest = &path[len..];
                let matched = rest.is_empty()
                    || (prefix && rest.starts_with('/'))
                    || (*trailing_slash && rest == "/");
                let len = if prefix { len } else { path.len() };
                matched.then(|| Captured { len, params: HashMap::new() })
            }
            Matcher::Template(Compiled { regex, groups }) => {
                let caps = regex.captures(path)?;
                let len = caps.name(BASE_GROUP).map_or(path.len(), |m| m.end());
                let params = groups
                    .iter()
                    .filter_map(|(group, key)| Some((key.clone(), decode(caps.name(group)?.as_str()))))
                    .collect();
                Some(Captured { len, params })
            }
            Matcher::Regex { regex, groups } => {
                let caps = regex.captures(path)?;
                let whole = caps.get(0)?;
                let len = if prefix {
                    // a mount regex must match from the start of the path
                    if whole.start() != 0 {
                        return None;
                    }
                    let end = whole.end();
                    if end > 0 && path[..end].ends_with('/') { end - 1 } else { end }
                } else {
                    path.len()
                };
                let params = groups
                    .iter()
                    .filter_map(|(i, key)| Some((key.clone(), decode(caps.get(*i)?.as_str()))))
                    .collect();
                Some(Captured { len, params })
            }
        }
    }
}

/// Percent-decodes a captured value, keeping it raw if it is not valid UTF-8
/// once decoded.
fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), |s| s.into_owned())
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(source: &str) -> Pattern {
        Pattern::new(source, &RouterOptions::new()).unwrap()
    }

    fn params(pattern: &Pattern, path: &str) -> Vec<(String, String)> {
        let mut params: Vec<_> = pattern.matches(path).unwrap().into_iter().collect();
        params.sort();
        params
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn classifies_sources() {
        assert!(matches!(route("/about").spec(), PatternSpec::Literal(_)));
        assert!(matches!(route("/random.text").spec(), PatternSpec::Literal(_)));
        assert!(matches!(route("/ab?cd").spec(), PatternSpec::Template(_)));
        let re = Pattern::new(Regex::new("a").unwrap(), &RouterOptions::new()).unwrap();
        assert!(matches!(re.spec(), PatternSpec::Regex(s) if s == "a"));
    }

    #[test]
    fn literal_is_exact() {
        let p = route("/about");
        assert!(p.matches("/about").is_some());
        assert!(p.matches("/about/").is_some());
        assert!(p.matches("/abou").is_none());
        assert!(p.matches("/about/us").is_none());
        assert!(p.matches("/About").is_none());

        let p = route("/random.text");
        assert!(p.matches("/random.text").is_some());
        assert!(p.matches("/randomXtext").is_none());
    }

    #[test]
    fn root_literal() {
        let p = route("/");
        assert!(p.matches("/").is_some());
        assert!(p.matches("/a").is_none());
    }

    #[test]
    fn strict_literal_keeps_trailing_slash() {
        let strict = RouterOptions::new().strict(true);
        let p = Pattern::new("/about", &strict).unwrap();
        assert!(p.matches("/about").is_some());
        assert!(p.matches("/about/").is_none());

        let p = Pattern::new("/about/", &strict).unwrap();
        assert!(p.matches("/about/").is_some());
        assert!(p.matches("/about").is_none());
    }

    #[test]
    fn case_insensitive_option() {
        let loose = RouterOptions::new().case_sensitive(false);
        assert!(Pattern::new("/about", &loose).unwrap().matches("/ABOUT").is_some());
        assert!(Pattern::new("/ab+cd", &loose).unwrap().matches("/ABBCD").is_some());
    }

    #[test]
    fn case_folding_agrees_for_literals_and_templates() {
        let loose = RouterOptions::new().case_sensitive(false);
        let literal = Pattern::new("/é", &loose).unwrap();
        assert!(matches!(literal.spec(), PatternSpec::Literal(_)));
        assert!(literal.matches("/É").is_some());
        assert!(Pattern::new("/é+", &loose).unwrap().matches("/ÉÉ").is_some());

        let prefix = Pattern::prefix("/Birds", &loose).unwrap();
        assert_eq!(prefix.capture("/birds/about").unwrap().len, 6);
        assert!(prefix.matches("/birdsong").is_none());

        assert!(route("/é").matches("/É").is_none());
    }

    #[test]
    fn strict_template_keeps_trailing_slash() {
        let strict = RouterOptions::new().strict(true);
        let p = Pattern::new("/ab?cd/", &strict).unwrap();
        assert!(p.matches("/acd/").is_some());
        assert!(p.matches("/abcd/").is_some());
        assert!(p.matches("/acd").is_none());

        let p = Pattern::new("/users/:id", &strict).unwrap();
        assert!(p.matches("/users/7").is_some());
        assert!(p.matches("/users/7/").is_none());

        let loose = route("/users/:id/");
        assert_eq!(params(&loose, "/users/7"), pairs(&[("id", "7")]));
    }

    #[test]
    fn optional_character() {
        let p = route("/ab?cd");
        assert!(p.matches("/acd").is_some());
        assert!(p.matches("/abcd").is_some());
        assert!(p.matches("/abbcd").is_none());
    }

    #[test]
    fn repeated_character() {
        let p = route("/ab+cd");
        assert!(p.matches("/abcd").is_some());
        assert!(p.matches("/abbcd").is_some());
        assert!(p.matches("/abbbcd").is_some());
        assert!(p.matches("/acd").is_none());
    }

    #[test]
    fn wildcard_inside_segment() {
        let p = route("/ab*cd");
        assert!(p.matches("/abcd").is_some());
        assert!(p.matches("/abxcd").is_some());
        assert_eq!(params(&p, "/abRANDOMcd"), pairs(&[("0", "RANDOM")]));
        assert!(p.matches("/ab/cd").is_none());
    }

    #[test]
    fn wildcard_segment_crosses_slashes() {
        let p = route("/files/*");
        assert_eq!(params(&p, "/files/a/b.txt"), pairs(&[("0", "a/b.txt")]));
        assert!(p.matches("/other/a").is_none());
    }

    #[test]
    fn optional_group() {
        let p = route("/ab(cd)?e");
        assert!(p.matches("/abe").is_some());
        assert!(p.matches("/abcde").is_some());
        assert!(p.matches("/abxe").is_none());
    }

    #[test]
    fn named_params() {
        let p = route("/users/:userId/books/:bookId");
        assert_eq!(
            params(&p, "/users/34/books/8989"),
            pairs(&[("bookId", "8989"), ("userId", "34")]),
        );
        assert!(p.matches("/users/34/books").is_none());
        assert!(p.matches("/users/34/books/8989/extra").is_none());
        assert_eq!(p.param_names(), ["userId", "bookId"]);
    }

    #[test]
    fn compound_params_split_on_delimiters() {
        let p = route("/flights/:from-:to");
        assert_eq!(params(&p, "/flights/LAX-SFO"), pairs(&[("from", "LAX"), ("to", "SFO")]));

        let p = route("/plantae/:genus.:species");
        assert_eq!(
            params(&p, "/plantae/Prunus.persica"),
            pairs(&[("genus", "Prunus"), ("species", "persica")]),
        );
    }

    #[test]
    fn constrained_param() {
        let p = route("/user/:userId(\\d+)");
        assert_eq!(params(&p, "/user/42"), pairs(&[("userId", "42")]));
        assert!(p.matches("/user/abc").is_none());
    }

    #[test]
    fn constraint_groups_do_not_shift_params() {
        let p = route("/:a((x|y)+)/:b");
        assert_eq!(params(&p, "/xyx/rest"), pairs(&[("a", "xyx"), ("b", "rest")]));
    }

    #[test]
    fn optional_param_takes_its_slash() {
        let p = route("/users/:id?");
        assert!(p.matches("/users").is_some());
        assert!(p.matches("/users/").is_some());
        assert_eq!(params(&p, "/users/7"), pairs(&[("id", "7")]));
        assert!(p.matches("/users/7/8").is_none());
    }

    #[test]
    fn repeated_param_spans_segments() {
        let p = route("/docs/:path+");
        assert_eq!(params(&p, "/docs/a/b/c"), pairs(&[("path", "a/b/c")]));
        assert!(p.matches("/docs").is_none());
    }

    #[test]
    fn escaped_dollar() {
        let p = route("/data/([\\$])book");
        assert!(p.matches("/data/$book").is_some());
        assert!(p.matches("/data/book").is_none());
    }

    #[test]
    fn params_are_percent_decoded() {
        let p = route("/tag/:name");
        assert_eq!(params(&p, "/tag/caf%C3%A9"), pairs(&[("name", "café")]));
    }

    #[test]
    fn regex_matches_anywhere() {
        let p = Pattern::new(Regex::new("a").unwrap(), &RouterOptions::new()).unwrap();
        assert!(p.matches("/cat").is_some());
        assert!(p.matches("/dog").is_none());

        let p = Pattern::new(Regex::new(".*fly$").unwrap(), &RouterOptions::new()).unwrap();
        assert!(p.matches("/butterfly").is_some());
        assert!(p.matches("/dragonfly").is_some());
        assert!(p.matches("/butterflyman").is_none());
    }

    #[test]
    fn regex_captures_by_name_and_position() {
        let p = Pattern::new(Regex::new(r"^/(\d+)/(?P<slug>[a-z]+)$").unwrap(), &RouterOptions::new()).unwrap();
        assert_eq!(params(&p, "/12/intro"), pairs(&[("0", "12"), ("slug", "intro")]));
    }

    #[test]
    fn prefix_consumes_whole_segments() {
        let options = RouterOptions::new();
        let p = Pattern::prefix("/birds", &options).unwrap();
        assert_eq!(p.capture("/birds/about").unwrap().len, 6);
        assert_eq!(p.capture("/birds").unwrap().len, 6);
        assert!(p.capture("/birdsong").is_none());

        let p = Pattern::prefix("/users/:id", &options).unwrap();
        let captured = p.capture("/users/42/books").unwrap();
        assert_eq!(captured.len, 9);
        assert_eq!(captured.params["id"], "42");

        let p = Pattern::prefix("/", &options).unwrap();
        assert_eq!(p.capture("/anything").unwrap().len, 0);
    }

    #[test]
    fn regex_prefix_must_start_at_root() {
        let p = Pattern::prefix(Regex::new("/v[0-9]+/").unwrap(), &RouterOptions::new()).unwrap();
        assert_eq!(p.capture("/v2/users").unwrap().len, 3);
        assert!(p.capture("/api/v2/users").is_none());
    }

    #[test]
    fn registration_errors() {
        let options = RouterOptions::new();
        assert!(matches!(Pattern::new("about", &options), Err(PatternError::MissingLeadingSlash(_))));
        assert!(matches!(Pattern::new("/:a/:a", &options), Err(PatternError::DuplicateParam(_))));
        assert!(matches!(Pattern::new("/:id(\\d+", &options), Err(PatternError::Unclosed { .. })));
        assert!(matches!(Pattern::new("/:id([)", &options), Err(PatternError::Unclosed { .. })));
        assert!(matches!(Pattern::new("/:id(a{2,1})", &options), Err(PatternError::Regex(_))));

        let tiny = RouterOptions::new().regex_size_limit(16);
        assert!(matches!(Pattern::new("/:a/:b/:c/:d", &tiny), Err(PatternError::Regex(_))));
    }

    #[test]
    fn matching_is_repeatable() {
        let p = route("/flights/:from-:to");
        assert_eq!(p.matches("/flights/LAX-SFO"), p.matches("/flights/LAX-SFO"));
    }
}
