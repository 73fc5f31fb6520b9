//! The library code for the `voices` blog engine. All of the posts live in a
//! single JSON array stored under one key of a key-value store, and two page
//! renderers turn that collection into pages:
//!
//! 1. The feed, which lists every post newest-first as a card
//!    ([`render::Renderer::render_feed`])
//! 2. The single-post view, which shows the post named by the `id` query
//!    parameter and fills in the page's SEO metadata
//!    ([`render::Renderer::render_post`], [`seo`])
//!
//! The key-value store is abstracted behind [`storage::Storage`] and the page
//! behind [`document::Document`], so rendering never needs a browser. The
//! [`store::PostStore`] handles the collection itself: seeding it with a
//! welcome post on first use, reading it back, and the authoring operations.
//!
//! Once rendered, a document is written to disk through the theme's page
//! template ([`write`]). Posts can also be exported as an Atom feed
//! ([`feed`]) and authored as Markdown with YAML frontmatter ([`post`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod config;
pub mod document;
pub mod feed;
pub mod markup;
pub mod post;
pub mod render;
pub mod seo;
pub mod storage;
pub mod store;
pub mod util;
mod value;
pub mod write;
