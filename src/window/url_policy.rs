//! Which saved urls may be reopened, and what some of them become.
//!
//! Hosts refuse to open privileged pages (`chrome://`, `file://`, internal
//! `about:` pages) from an extension, so restoring them is skipped. The
//! table is consulted top to bottom and the first matching rule wins; urls
//! no rule matches are opened unchanged.

use serde::{Deserialize, Serialize};

/// What a rule compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Text before the first `:` of the url.
    Scheme,
    /// The whole url.
    Url,
}

/// What happens to a url a rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlAction {
    Skip,
    /// Open this url instead. An empty string means the host's default page.
    Remap(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRule {
    pub kind: MatchKind,
    pub pattern: String,
    pub action: UrlAction,
}

impl UrlRule {
    pub fn skip_scheme(scheme: &str) -> Self {
        Self {
            kind: MatchKind::Scheme,
            pattern: scheme.to_string(),
            action: UrlAction::Skip,
        }
    }

    pub fn skip_url(url: &str) -> Self {
        Self {
            kind: MatchKind::Url,
            pattern: url.to_string(),
            action: UrlAction::Skip,
        }
    }

    pub fn remap_url(url: &str, to: &str) -> Self {
        Self {
            kind: MatchKind::Url,
            pattern: url.to_string(),
            action: UrlAction::Remap(to.to_string()),
        }
    }

    fn matches(&self, url: &str) -> bool {
        match self.kind {
            MatchKind::Scheme => scheme(url) == self.pattern,
            MatchKind::Url => url == self.pattern,
        }
    }
}

/// Text before the first `:`, or the whole url when there is none.
fn scheme(url: &str) -> &str {
    url.split(':').next().unwrap_or(url)
}

/// Ordered rule table applied when reopening a saved window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    rules: Vec<UrlRule>,
}

impl UrlPolicy {
    pub fn new(rules: Vec<UrlRule>) -> Self {
        Self { rules }
    }

    pub fn default_rules() -> Vec<UrlRule> {
        vec![
            UrlRule::skip_scheme("chrome"),
            UrlRule::skip_scheme("javascript"),
            UrlRule::skip_scheme("data"),
            UrlRule::skip_scheme("file"),
            UrlRule::skip_url("about:config"),
            UrlRule::skip_url("about:addons"),
            UrlRule::skip_url("about:debugging"),
            UrlRule::remap_url("about:newtab", ""),
        ]
    }

    /// The url to open for a saved url, or `None` when it must be skipped.
    ///
    /// An empty returned string asks the host for its default page.
    pub fn resolve<'a>(&'a self, url: &'a str) -> Option<&'a str> {
        match self.rules.iter().find(|rule| rule.matches(url)) {
            None => Some(url),
            Some(rule) => match &rule.action {
                UrlAction::Skip => None,
                UrlAction::Remap(to) => Some(to.as_str()),
            },
        }
    }

    pub fn rules(&self) -> &[UrlRule] {
        &self.rules
    }
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}
