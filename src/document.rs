//! Defines [`Document`], the in-memory page the renderers write into. A
//! document has a title, a list of `<meta>` tags, a set of elements addressed
//! by ID, and a [`Location`]. Pages are written to disk from documents by
//! [`crate::write`].

use crate::markup::Markup;
use std::collections::BTreeMap;
use url::Url;

/// The content of an [`Element`].
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Empty,

    /// Plain text, escaped when the page is written.
    Text(String),

    /// Trusted HTML, written verbatim.
    Markup(Markup),
}

impl Default for Content {
    fn default() -> Self {
        Content::Empty
    }
}

/// An element of a [`Document`], e.g., the feed container or the post
/// banner image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub content: Content,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.content = Content::Text(text.into());
    }

    pub fn set_markup(&mut self, markup: Markup) {
        self.content = Content::Markup(markup);
    }

    pub fn set_attribute<S: Into<String>>(&mut self, name: &str, value: S) {
        self.attributes.insert(name.to_owned(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A `<meta name="..." content="...">` tag.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// The address of a [`Document`] along with its session history. Only
/// in-place replacement is supported, so the history never grows.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    url: Url,
    history_length: usize,
}

impl Location {
    /// A location at `url` with a single history entry.
    pub fn new(url: Url) -> Location {
        Location {
            url,
            history_length: 1,
        }
    }

    /// Resolves `address` (e.g., `post.html?id=42`) against `site_root`.
    pub fn parse(site_root: &Url, address: &str) -> Result<Location, url::ParseError> {
        Ok(Location::new(site_root.join(address)?))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The first value of the query parameter `name`, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Replaces the current history entry with `url`. Nothing is loaded and
    /// the history length is unchanged.
    pub fn replace(&mut self, url: Url) {
        self.url = url;
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }
}

/// A page under construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub title: String,
    pub location: Location,
    meta: Vec<MetaTag>,
    elements: BTreeMap<String, Element>,
}

impl Document {
    /// An empty document at `location`: no title, no meta tags and no
    /// elements.
    pub fn new(location: Location) -> Document {
        Document {
            title: String::new(),
            location,
            meta: Vec::new(),
            elements: BTreeMap::new(),
        }
    }

    /// Adds an empty element for each of `ids`.
    pub fn with_elements<I, S>(mut self, ids: I) -> Document
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.elements.insert(id.into(), Element::default());
        }
        self
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// The element with `id`, or `None` if the page doesn't have one.
    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn elements(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.elements.iter().map(|(id, e)| (id.as_str(), e))
    }

    pub fn meta_tags(&self) -> &[MetaTag] {
        &self.meta
    }

    /// The content of the meta tag called `name`.
    pub fn meta(&self, name: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.content.as_str())
    }

    /// Sets the content of the meta tag called `name`, appending the tag if
    /// the document doesn't have one yet. Does nothing at all if `content` is
    /// empty.
    pub fn upsert_meta(&mut self, name: &str, content: &str) {
        if content.is_empty() {
            return;
        }
        match self.meta.iter_mut().find(|tag| tag.name == name) {
            Some(tag) => tag.content = content.to_owned(),
            None => self.meta.push(MetaTag {
                name: name.to_owned(),
                content: content.to_owned(),
            }),
        }
    }
}
