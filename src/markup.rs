//! Defines [`Markup`], the trusted-HTML string type, along with the text
//! helpers the renderers use to turn post content into previews: stripping
//! tags ([`strip_tags`]) and truncating to a character budget
//! ([`truncate`]).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// An HTML fragment that is trusted and injected into pages verbatim. Post
/// content is stored this way, and the renderers build card and meta-line
/// fragments as [`Markup`] too. Anything that is *not* [`Markup`] (e.g., a
/// plain [`String`] assigned as element text) is escaped on output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    /// Wraps `html` without escaping it. The caller vouches for the contents.
    pub fn trusted<S: Into<String>>(html: S) -> Markup {
        Markup(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The text of the fragment with every tag removed. See [`strip_tags`].
    pub fn text(&self) -> String {
        strip_tags(&self.0)
    }

    /// The tag-stripped text truncated to `budget` characters.
    pub fn preview(&self, budget: usize) -> String {
        truncate(&self.text(), budget).to_owned()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Markup> for String {
    fn from(markup: Markup) -> String {
        markup.0
    }
}

/// Removes anything that looks like a tag: a `<` up to and including the next
/// `>`, or up to the end of the input when the tag is never closed. Entities
/// are left alone.
pub fn strip_tags(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>?").unwrap())
        .replace_all(html, "")
        .into_owned()
}

/// Returns the first `budget` characters of `s` (counted as `char`s, so a
/// multi-byte character is never split).
pub fn truncate(s: &str, budget: usize) -> &str {
    match s.char_indices().nth(budget) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
