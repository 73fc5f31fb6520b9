//! Maps a [`Post`] and its optional [`crate::post::SeoInfo`] onto document
//! metadata: the title, the `description` and `keywords` meta tags, and a
//! cosmetic slug in the address.

use crate::document::Document;
use crate::post::{present, Post, PostId};

/// The metadata derived for a single post page. See [`SeoTags::for_post`].
#[derive(Clone, Debug, PartialEq)]
pub struct SeoTags {
    pub title: String,
    pub description: String,

    /// The joined keywords; empty when the post has none.
    pub keywords: String,

    pub slug: Option<String>,
}

impl SeoTags {
    /// Derives the tags for `post`:
    ///
    /// * `title` is `seo.metaTitle`, or `"{title} | {site_name}"`
    /// * `description` is `seo.description`, or the first
    ///   `description_length` characters of the tag-stripped content
    /// * `keywords` is the primary and secondary keywords joined with `", "`,
    ///   leaving out whichever are missing
    /// * `slug` is `seo.slug`
    ///
    /// Empty strings count as missing.
    pub fn for_post(post: &Post, site_name: &str, description_length: usize) -> SeoTags {
        let seo = post.seo.clone().unwrap_or_default();
        SeoTags {
            title: match present(&seo.meta_title) {
                Some(title) => title.to_owned(),
                None => format!("{} | {}", post.title, site_name),
            },
            description: match present(&seo.description) {
                Some(description) => description.to_owned(),
                None => post.preview(description_length),
            },
            keywords: [present(&seo.primary_keyword), present(&seo.secondary_keywords)]
                .iter()
                .flatten()
                .copied()
                .collect::<Vec<&str>>()
                .join(", "),
            slug: present(&seo.slug).map(str::to_owned),
        }
    }

    /// Writes the tags into `document`. The title is always set; the meta
    /// tags are upserted (and skipped when empty); a slug replaces the
    /// current address with `{path}?id={id}&slug={slug}` without adding a
    /// history entry.
    pub fn apply(&self, document: &mut Document, id: PostId) {
        document.title = self.title.clone();
        document.upsert_meta("description", &self.description);
        document.upsert_meta("keywords", &self.keywords);
        if let Some(slug) = &self.slug {
            let mut url = document.location.url().clone();
            url.set_query(Some(&format!("id={}&slug={}", id, slug)));
            url.set_fragment(None);
            document.location.replace(url);
        }
    }
}
