//! Renders the collection of [`Post`]s into [`Document`]s: the feed listing
//! ([`Renderer::render_feed`]) and the single-post view
//! ([`Renderer::render_post`]).
//!
//! Both renderers only ever touch elements the page actually has. A page
//! without the feed container simply gets no feed; a post page without a
//! banner gets no banner. Neither case is an error.

use crate::document::Document;
use crate::markup::Markup;
use crate::post::{Post, PostId};
use crate::seo::SeoTags;
use tracing::debug;

/// The ID of the feed container element.
pub const FEED_CONTAINER: &str = "blog-feed";

pub const POST_BANNER: &str = "post-banner";
pub const POST_TITLE: &str = "post-title";
pub const POST_META: &str = "post-meta";
pub const POST_BODY: &str = "post-body";

/// The element that receives the not-found message.
pub const POST_CONTENT: &str = "post-content";

/// The default number of characters in a feed card's snippet.
pub const DEFAULT_SNIPPET_LENGTH: usize = 120;

/// The default number of characters in a fallback description.
pub const DEFAULT_DESCRIPTION_LENGTH: usize = 150;

pub const DEFAULT_CARD_PLACEHOLDER: &str =
    "https://via.placeholder.com/800x400/2D3748/EDF2F7?text=Chiari+Voices";

pub const DEFAULT_BANNER_PLACEHOLDER: &str =
    "https://via.placeholder.com/1200x600/2D3748/EDF2F7?text=Chiari+Voices";

/// The outcome of [`Renderer::render_post`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found(PostId),
    NotFound,
}

/// Renders feed and post pages.
pub struct Renderer<'a> {
    /// The site name. Used in the fallback document title.
    pub site_name: &'a str,

    /// The number of characters of tag-stripped content in a feed card.
    pub snippet_length: usize,

    /// The number of characters of tag-stripped content in a fallback
    /// description.
    pub description_length: usize,

    /// The image URL for feed cards of posts without an image.
    pub card_placeholder: &'a str,

    /// The banner image URL for posts without an image.
    pub banner_placeholder: &'a str,
}

impl<'a> Renderer<'a> {
    /// A renderer with the default lengths and placeholders.
    pub fn new(site_name: &'a str) -> Renderer<'a> {
        Renderer {
            site_name,
            snippet_length: DEFAULT_SNIPPET_LENGTH,
            description_length: DEFAULT_DESCRIPTION_LENGTH,
            card_placeholder: DEFAULT_CARD_PLACEHOLDER,
            banner_placeholder: DEFAULT_BANNER_PLACEHOLDER,
        }
    }

    /// Renders `posts` newest-first (by ID, never by display date) into the
    /// feed container with a single write. Does nothing if `document` has no
    /// feed container.
    pub fn render_feed(&self, document: &mut Document, posts: &[Post]) {
        let container = match document.element_mut(FEED_CONTAINER) {
            Some(container) => container,
            None => return,
        };

        if posts.is_empty() {
            container.set_markup(Markup::trusted(
                r#"<div class="feed-empty"><p>No posts published yet.</p></div>"#,
            ));
            return;
        }

        let mut sorted: Vec<&Post> = posts.iter().collect();
        sorted.sort_by(|a, b| b.id.cmp(&a.id));

        let mut html = String::new();
        for post in sorted {
            html.push_str(&self.card(post));
        }
        container.set_markup(Markup::trusted(html));
    }

    /// Renders a single feed card. The title, date and author are trusted
    /// like the content and are not escaped.
    fn card(&self, post: &Post) -> String {
        format!(
            r#"<article class="post-card">
    <div class="post-card-image"><img src="{image}" alt="{title}"></div>
    <div class="post-card-body">
        <div class="post-card-meta"><span>{date}</span><span class="separator">•</span><span>{author}</span></div>
        <h2>{title}</h2>
        <p>{snippet}...</p>
        <a href="post.html?id={id}">Read Full Article</a>
    </div>
</article>
"#,
            image = post.image_or(self.card_placeholder),
            title = post.title,
            date = post.date,
            author = post.author,
            snippet = post.preview(self.snippet_length),
            id = post.id,
        )
    }

    /// Renders the post whose ID is the `id` query parameter of the
    /// document's address. On a match, each post element the page has is
    /// filled in and the SEO metadata is applied (see [`SeoTags`]). Otherwise
    /// (no parameter, a parameter that isn't an integer, or no such post) a
    /// not-found message is written into the content element and nothing else
    /// is touched.
    pub fn render_post(&self, document: &mut Document, posts: &[Post]) -> Lookup {
        let requested = document.location.query_param("id");
        let post = requested
            .as_deref()
            .and_then(|id| id.parse::<PostId>().ok())
            .and_then(|id| posts.iter().find(|post| post.id == id));

        let post = match post {
            Some(post) => post,
            None => {
                debug!(id = ?requested, "post not found");
                if let Some(content) = document.element_mut(POST_CONTENT) {
                    content.set_markup(Markup::trusted(
                        r#"<div class="post-not-found"><h2>Post not found</h2><a href="index.html">Return to Blog Home</a></div>"#,
                    ));
                }
                return Lookup::NotFound;
            }
        };

        if let Some(banner) = document.element_mut(POST_BANNER) {
            banner.set_attribute("src", post.image_or(self.banner_placeholder));
            banner.set_attribute("alt", post.title.as_str());
        }
        if let Some(title) = document.element_mut(POST_TITLE) {
            title.set_text(post.title.as_str());
        }
        if let Some(meta) = document.element_mut(POST_META) {
            meta.set_markup(Markup::trusted(format!(
                r#"<span class="post-date">{}</span> <span class="separator">|</span> {}"#,
                post.date, post.author
            )));
        }
        if let Some(body) = document.element_mut(POST_BODY) {
            body.set_markup(post.content.clone());
        }

        SeoTags::for_post(post, self.site_name, self.description_length)
            .apply(document, post.id);
        Lookup::Found(post.id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{Content, Location};
    use crate::post::SeoInfo;
    use url::Url;

    const POST_ELEMENTS: [&str; 5] = [POST_BANNER, POST_TITLE, POST_META, POST_BODY, POST_CONTENT];

    fn post(id: i64, date: &str) -> Post {
        Post {
            id: PostId(id),
            title: format!("Post {}", id),
            date: date.to_owned(),
            author: String::from("Admin"),
            image: None,
            content: Markup::trusted(format!("<p>Body of <b>post</b> {}</p>", id)),
            seo: None,
        }
    }

    fn document(address: &str, elements: &[&str]) -> Document {
        let root = Url::parse("https://example.org/").unwrap();
        Document::new(Location::parse(&root, address).unwrap())
            .with_elements(elements.iter().copied())
    }

    fn html(document: &Document, id: &str) -> String {
        match &document.element(id).unwrap().content {
            Content::Markup(markup) => markup.to_string(),
            Content::Text(text) => text.clone(),
            Content::Empty => String::new(),
        }
    }

    #[test]
    fn test_feed_orders_by_id_not_date() {
        let renderer = Renderer::new("Site");
        let mut document = document("index.html", &[FEED_CONTAINER]);
        let posts = vec![post(2, "1/1/2030"), post(30, "1/1/2000"), post(7, "1/1/2020")];
        renderer.render_feed(&mut document, &posts);

        let html = html(&document, FEED_CONTAINER);
        let positions: Vec<usize> = ["post.html?id=30", "post.html?id=7", "post.html?id=2"]
            .iter()
            .map(|link| html.find(link).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", html);
        assert_eq!(3, html.matches("<article").count());
    }

    // The post IDs linked from the feed, in page order.
    fn feed_ids(document: &Document) -> Vec<i64> {
        html(document, FEED_CONTAINER)
            .split(r#"href="post.html?id="#)
            .skip(1)
            .map(|rest| rest[..rest.find('"').unwrap()].parse().unwrap())
            .collect()
    }

    #[test]
    fn test_feed_ids_never_increase() {
        let renderer = Renderer::new("Site");
        // 37 is coprime with 101, so this visits every residue exactly once.
        let ids: Vec<i64> = (0..101).map(|i| (i * 37 + 11) % 101 * 1000 + 7).collect();
        let posts: Vec<Post> = ids.iter().map(|id| post(*id, "")).collect();
        let mut document = document("index.html", &[FEED_CONTAINER]);
        renderer.render_feed(&mut document, &posts);

        let rendered = feed_ids(&document);
        assert_eq!(ids.len(), rendered.len());
        assert!(rendered.windows(2).all(|w| w[0] >= w[1]), "{:?}", rendered);
        let mut expected = ids;
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(expected, rendered);
    }

    #[test]
    fn test_feed_single_post() {
        let renderer = Renderer::new("Site");
        let mut document = document("index.html", &[FEED_CONTAINER]);
        renderer.render_feed(&mut document, &[post(5, "")]);
        assert_eq!(vec![5], feed_ids(&document));
        assert_eq!(1, html(&document, FEED_CONTAINER).matches("<article").count());
    }

    #[test]
    fn test_feed_does_not_reorder_input() {
        let renderer = Renderer::new("Site");
        let mut document = document("index.html", &[FEED_CONTAINER]);
        let posts = vec![post(1, ""), post(2, "")];
        renderer.render_feed(&mut document, &posts);
        assert_eq!(PostId(1), posts[0].id);
    }

    #[test]
    fn test_feed_empty() {
        let renderer = Renderer::new("Site");
        let mut document = document("index.html", &[FEED_CONTAINER]);
        renderer.render_feed(&mut document, &[]);
        let html = html(&document, FEED_CONTAINER);
        assert!(html.contains("No posts published yet."));
        assert!(!html.contains("<article"));
    }

    #[test]
    fn test_feed_without_container() {
        let renderer = Renderer::new("Site");
        let mut document = document("index.html", &["something-else"]);
        let before = document.clone();
        renderer.render_feed(&mut document, &[post(1, "")]);
        assert_eq!(before, document);
    }

    #[test]
    fn test_feed_card() {
        let mut renderer = Renderer::new("Site");
        renderer.snippet_length = 10;
        renderer.card_placeholder = "placeholder.png";
        let mut with_image = post(2, "2/2/2022");
        with_image.image = Some(String::from("a.webp"));
        let mut document = document("index.html", &[FEED_CONTAINER]);
        renderer.render_feed(&mut document, &[post(1, "1/1/2021"), with_image]);

        let html = html(&document, FEED_CONTAINER);
        assert!(html.contains(r#"<img src="a.webp" alt="Post 2">"#), "{}", html);
        assert!(html.contains(r#"<img src="placeholder.png" alt="Post 1">"#), "{}", html);
        assert!(html.contains("<span>1/1/2021</span>"));
        assert!(html.contains("<span>Admin</span>"));
        assert!(html.contains("<h2>Post 1</h2>"));
        assert!(html.contains("<p>Body of po...</p>"), "{}", html);
    }

    #[test]
    fn test_render_post() {
        let renderer = Renderer::new("Site");
        let mut document = document("post.html?id=7", &POST_ELEMENTS);
        let lookup = renderer.render_post(&mut document, &[post(3, ""), post(7, "7/7/2007")]);
        assert_eq!(Lookup::Found(PostId(7)), lookup);

        let banner = document.element(POST_BANNER).unwrap();
        assert_eq!(Some(DEFAULT_BANNER_PLACEHOLDER), banner.attribute("src"));
        assert_eq!(Some("Post 7"), banner.attribute("alt"));
        assert_eq!(
            Content::Text(String::from("Post 7")),
            document.element(POST_TITLE).unwrap().content
        );
        assert!(html(&document, POST_META).contains("7/7/2007"));
        assert!(html(&document, POST_META).contains("Admin"));
        assert_eq!("<p>Body of <b>post</b> 7</p>", html(&document, POST_BODY));
        assert_eq!("", html(&document, POST_CONTENT));

        assert_eq!("Post 7 | Site", document.title);
        assert_eq!(Some("Body of post 7"), document.meta("description"));
        assert_eq!(None, document.meta("keywords"));
        assert_eq!(
            "https://example.org/post.html?id=7",
            document.location.url().as_str()
        );
    }

    #[test]
    fn test_render_post_tolerates_whitespace_in_id() {
        let renderer = Renderer::new("Site");
        let mut document = document("post.html?id=%207", &POST_ELEMENTS);
        assert_eq!(
            Lookup::Found(PostId(7)),
            renderer.render_post(&mut document, &[post(7, "")])
        );
    }

    #[test]
    fn test_render_post_with_slug() {
        let renderer = Renderer::new("Site");
        let mut post = post(42, "");
        post.seo = Some(SeoInfo {
            slug: Some(String::from("hello")),
            primary_keyword: Some(String::from("one")),
            ..SeoInfo::default()
        });
        let mut document = document("blog/post.html?id=42", &POST_ELEMENTS);
        renderer.render_post(&mut document, &[post]);
        assert!(document
            .location
            .url()
            .as_str()
            .ends_with("/blog/post.html?id=42&slug=hello"));
        assert_eq!(1, document.location.history_length());
        assert_eq!(Some("one"), document.meta("keywords"));
    }

    #[test]
    fn test_render_post_missing_elements() {
        let renderer = Renderer::new("Site");
        let mut document = document("post.html?id=7", &[POST_TITLE]);
        let lookup = renderer.render_post(&mut document, &[post(7, "")]);
        assert_eq!(Lookup::Found(PostId(7)), lookup);
        assert_eq!(1, document.elements().count());
        assert_eq!("Post 7 | Site", document.title);
    }

    #[test]
    fn test_render_post_not_found() {
        let renderer = Renderer::new("Site");
        for address in &["post.html?id=99", "post.html", "post.html?id=abc", "post.html?id="] {
            let mut document = document(address, &POST_ELEMENTS);
            document.title = String::from("Original");
            document.upsert_meta("description", "original");
            assert_eq!(
                Lookup::NotFound,
                renderer.render_post(&mut document, &[post(7, "")])
            );
            assert!(html(&document, POST_CONTENT).contains("Post not found"));
            assert!(html(&document, POST_CONTENT).contains(r#"href="index.html""#));
            assert_eq!("Original", document.title);
            assert_eq!(Some("original"), document.meta("description"));
            assert_eq!(Content::Empty, document.element(POST_TITLE).unwrap().content);
        }
    }

    #[test]
    fn test_render_post_not_found_without_content_element() {
        let renderer = Renderer::new("Site");
        let mut document = document("post.html?id=1", &[]);
        assert_eq!(Lookup::NotFound, renderer.render_post(&mut document, &[]));
        assert_eq!(0, document.elements().count());
    }
}
