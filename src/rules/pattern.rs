// src/rules/pattern.rs

use std::fmt;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::config::PatternSpec;
use crate::errors::{Result, RulewatchError};

/// A compiled path pattern.
///
/// Every variant answers the same question through [`Pattern::full_match`]:
/// does this relative path match *in its entirety*, and if so what is the
/// capture?
#[derive(Clone)]
pub enum Pattern {
    /// Path equals the string. No capture.
    Exact(String),
    /// Path starts with the prefix and has something after it. Captures the
    /// remainder.
    Prefix(String),
    /// Path ends with the suffix and has something before it. Captures the
    /// part before the suffix.
    Suffix(String),
    /// Whole-path glob (`globset` semantics). No capture.
    Glob { source: String, matcher: GlobMatcher },
    /// Regular expression whose leftmost match must span the whole path.
    /// Captures group 1 if the expression has one.
    Regex(Regex),
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "Exact({s:?})"),
            Pattern::Prefix(s) => write!(f, "Prefix({s:?})"),
            Pattern::Suffix(s) => write!(f, "Suffix({s:?})"),
            Pattern::Glob { source, .. } => write!(f, "Glob({source:?})"),
            Pattern::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
        }
    }
}

/// Result of a successful full-path match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub capture: Option<String>,
}

impl Pattern {
    pub fn exact(s: impl Into<String>) -> Self {
        Pattern::Exact(s.into())
    }

    pub fn prefix(s: impl Into<String>) -> Self {
        Pattern::Prefix(s.into())
    }

    pub fn suffix(s: impl Into<String>) -> Self {
        Pattern::Suffix(s.into())
    }

    pub fn glob(pat: &str) -> Result<Self> {
        let glob = Glob::new(pat)
            .map_err(|e| RulewatchError::PatternError(format!("invalid glob '{pat}': {e}")))?;
        Ok(Pattern::Glob {
            source: pat.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn regex(pat: &str) -> Result<Self> {
        let re = Regex::new(pat)
            .map_err(|e| RulewatchError::PatternError(format!("invalid regex '{pat}': {e}")))?;
        Ok(Pattern::Regex(re))
    }

    /// Compile a pattern as written in the project file.
    pub fn compile(spec: &PatternSpec) -> Result<Self> {
        match spec {
            PatternSpec::Exact(s) => Ok(Pattern::exact(s.as_str())),
            PatternSpec::Prefix(s) => Ok(Pattern::prefix(s.as_str())),
            PatternSpec::Suffix(s) => Ok(Pattern::suffix(s.as_str())),
            PatternSpec::Glob(s) => Pattern::glob(s),
            PatternSpec::Regex(s) => Pattern::regex(s),
        }
    }

    /// Number of explicit capture groups this pattern can produce.
    pub fn capture_groups(&self) -> usize {
        match self {
            Pattern::Prefix(_) | Pattern::Suffix(_) => 1,
            Pattern::Exact(_) | Pattern::Glob { .. } => 0,
            // `captures_len` counts the implicit whole-match group.
            Pattern::Regex(re) => re.captures_len() - 1,
        }
    }

    /// Match `rel_path` as a whole.
    ///
    /// A regex that only matches a prefix, suffix or interior substring of
    /// the path does not match.
    pub fn full_match(&self, rel_path: &str) -> Option<PathMatch> {
        match self {
            Pattern::Exact(s) => (rel_path == s).then_some(PathMatch { capture: None }),
            Pattern::Prefix(p) => rel_path
                .strip_prefix(p.as_str())
                .filter(|rest| !rest.is_empty())
                .map(|rest| PathMatch {
                    capture: Some(rest.to_string()),
                }),
            Pattern::Suffix(s) => rel_path
                .strip_suffix(s.as_str())
                .filter(|head| !head.is_empty())
                .map(|head| PathMatch {
                    capture: Some(head.to_string()),
                }),
            Pattern::Glob { matcher, .. } => {
                matcher.is_match(rel_path).then_some(PathMatch { capture: None })
            }
            Pattern::Regex(re) => {
                let caps = re.captures(rel_path)?;
                let whole = caps.get(0)?;
                if whole.start() != 0 || whole.len() != rel_path.len() {
                    return None;
                }
                Some(PathMatch {
                    capture: caps.get(1).map(|m| m.as_str().to_string()),
                })
            }
        }
    }

    /// Convenience: `full_match(..).is_some()`.
    pub fn is_match(&self, rel_path: &str) -> bool {
        self.full_match(rel_path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_must_span_whole_path() {
        let p = Pattern::regex(r"assets/(.*\.png)").unwrap();
        assert_eq!(
            p.full_match("assets/logo.png"),
            Some(PathMatch {
                capture: Some("logo.png".to_string())
            })
        );
        // Pattern matches a substring only.
        assert!(p.full_match("vendor/assets/logo.png").is_none());
        assert!(p.full_match("assets/logo.png.bak").is_none());
    }

    #[test]
    fn regex_without_group_has_no_capture() {
        let p = Pattern::regex(r"src/.*\.css").unwrap();
        assert_eq!(p.full_match("src/app.css"), Some(PathMatch { capture: None }));
        assert_eq!(p.capture_groups(), 0);
    }

    #[test]
    fn leftmost_short_alternative_is_rejected() {
        // The leftmost-first match is "a", which does not cover "ab".
        let p = Pattern::regex("a|ab").unwrap();
        assert!(p.full_match("ab").is_none());
        assert!(p.full_match("a").is_some());
    }

    #[test]
    fn prefix_and_suffix_capture() {
        let p = Pattern::prefix("static/");
        assert_eq!(
            p.full_match("static/img/a.svg").and_then(|m| m.capture),
            Some("img/a.svg".to_string())
        );
        assert!(p.full_match("static/").is_none());

        let s = Pattern::suffix(".proto");
        assert_eq!(
            s.full_match("schemas/user.proto").and_then(|m| m.capture),
            Some("schemas/user".to_string())
        );
        assert!(s.full_match(".proto").is_none());
    }

    #[test]
    fn glob_is_whole_path() {
        let g = Pattern::glob("templates/**/*.html").unwrap();
        assert!(g.is_match("templates/index.html"));
        assert!(g.is_match("templates/a/b.html"));
        assert!(!g.is_match("templates/index.html.orig"));
    }

    #[test]
    fn bad_regex_is_a_pattern_error() {
        match Pattern::regex("(unclosed") {
            Err(RulewatchError::PatternError(msg)) => assert!(msg.contains("(unclosed")),
            other => panic!("expected PatternError, got {other:?}"),
        }
    }
}
