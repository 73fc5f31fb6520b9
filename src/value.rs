//! Converts [`Document`]s into [`Value`]s for templating. The resulting
//! object has the fields:
//!
//! * `title`: the document title
//! * `url`: the document's current address
//! * `meta`: a list of `{name, content}` objects
//! * `elements`: an object keyed by element ID (with `-` replaced by `_` so
//!   templates can write e.g. `.elements.post_title`), each element being an
//!   object with `html` and one field per attribute
//!
//! Everything but [`Content::Markup`] is HTML-escaped here, so templates can
//! drop the values in as-is.

use crate::document::{Content, Document, Element, MetaTag};
use gtmpl_value::Value;
use pulldown_cmark::escape::escape_html;
use std::collections::HashMap;

fn escaped(s: &str) -> Value {
    let mut out = String::with_capacity(s.len());
    // writing into a `String` can't fail
    let _ = escape_html(&mut out, s);
    Value::String(out)
}

impl From<&Element> for Value {
    fn from(element: &Element) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        for (name, value) in &element.attributes {
            m.insert(name.clone(), escaped(value));
        }
        m.insert(
            "html".to_owned(),
            match &element.content {
                Content::Empty => Value::String(String::new()),
                Content::Text(text) => escaped(text),
                Content::Markup(markup) => Value::String(markup.to_string()),
            },
        );
        Value::Object(m)
    }
}

impl From<&MetaTag> for Value {
    fn from(tag: &MetaTag) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), escaped(&tag.name));
        m.insert("content".to_owned(), escaped(&tag.content));
        Value::Object(m)
    }
}

impl From<&Document> for Value {
    fn from(document: &Document) -> Value {
        let mut elements: HashMap<String, Value> = HashMap::new();
        for (id, element) in document.elements() {
            elements.insert(id.replace('-', "_"), element.into());
        }

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), escaped(&document.title));
        m.insert("url".to_owned(), escaped(document.location.url().as_str()));
        m.insert(
            "meta".to_owned(),
            Value::Array(document.meta_tags().iter().map(Value::from).collect()),
        );
        m.insert("elements".to_owned(), Value::Object(elements));
        Value::Object(m)
    }
}
