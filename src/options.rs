//! Router configuration.

/// Matching policy for one [`Router`](crate::Router).
///
/// Patterns are compiled with the options of the router they are registered
/// on, so set options before adding routes:
///
/// ```rust
/// use senda::{Router, RouterOptions};
///
/// let api = Router::with_options(RouterOptions::new().strict(true).merge_params(true));
/// ```
#[derive(Clone, Debug)]
pub struct RouterOptions {
    pub(crate) case_sensitive: bool,
    pub(crate) strict: bool,
    pub(crate) merge_params: bool,
    pub(crate) regex_size_limit: usize,
}

impl RouterOptions {
    /// Case-sensitive, non-strict, unmerged params, 1 MiB regex limit.
    pub fn new() -> Self {
        Self {
            case_sensitive: true,
            strict: false,
            merge_params: false,
            regex_size_limit: 1 << 20,
        }
    }

    /// `false` makes `/About` match `/about`. Regex patterns are unaffected.
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// `true` makes `/about` and `/about/` distinct paths.
    pub fn strict(mut self, yes: bool) -> Self {
        self.strict = yes;
        self
    }

    /// `true` lets this router see parameters captured by the prefix it is
    /// mounted under (and by its ancestors, if they merge too).
    pub fn merge_params(mut self, yes: bool) -> Self {
        self.merge_params = yes;
        self
    }

    /// Upper bound, in bytes, on a compiled pattern. Patterns over the limit
    /// fail registration with [`PatternError::Regex`](crate::PatternError::Regex).
    pub fn regex_size_limit(mut self, bytes: usize) -> Self {
        self.regex_size_limit = bytes;
        self
    }
}

impl Default for RouterOptions {
    fn default() -> Self { Self::new() }
}
