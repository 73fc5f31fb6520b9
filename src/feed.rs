//! Support for creating Atom feeds from the collection of posts.

use crate::config::Author;
use crate::post::{Post, PostId};
use atom_syndication::{Entry, Error as AtomError, Feed, FixedDateTime, Link, Person, Text};
use chrono::{FixedOffset, TimeZone, Utc};
use std::fmt;
use std::io::Write;
use url::{ParseError as UrlParseError, Url};

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Option<Author>,

    /// The site root. Post links are `{site_root}post.html?id={id}`, the
    /// same address the feed cards link to.
    pub site_root: Url,

    /// The number of characters of tag-stripped content in entry summaries.
    pub summary_length: usize,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s and writes the result to a [`std::io::Write`]. Entries are
/// ordered newest-first by ID.
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(&config, posts)?.write_to(w)?;
    Ok(())
}

fn feed(config: &FeedConfig, posts: &[Post]) -> Result<Feed> {
    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| b.id.cmp(&a.id));

    let mut feed = Feed::default();
    feed.set_title(Text::plain(config.title.as_str()));
    feed.set_id(config.id.as_str());
    feed.set_updated(match sorted.first() {
        Some(newest) => timestamp(newest.id)?,
        None => utc(Utc::now().timestamp_millis())?,
    });
    feed.set_authors(author_to_people(&config.author));
    feed.set_links(vec![link(config.site_root.as_str())]);
    feed.set_entries(
        sorted
            .into_iter()
            .map(|post| entry(config, post))
            .collect::<Result<Vec<Entry>>>()?,
    );
    Ok(feed)
}

fn entry(config: &FeedConfig, post: &Post) -> Result<Entry> {
    let url = config.site_root.join(&format!("post.html?id={}", post.id))?;
    let date = timestamp(post.id)?;

    let mut entry = Entry::default();
    entry.set_id(url.as_str());
    entry.set_title(Text::plain(post.title.as_str()));
    entry.set_updated(date);
    entry.set_published(Some(date));
    entry.set_authors(vec![Person {
        name: post.author.clone(),
        email: None,
        uri: None,
    }]);
    entry.set_links(vec![link(url.as_str())]);
    entry.set_summary(Some(Text::plain(post.preview(config.summary_length))));
    Ok(entry)
}

// Post IDs are millisecond timestamps, so they double as the entry dates.
// The display date is free-form text and can't be relied upon.
fn timestamp(id: PostId) -> Result<FixedDateTime> {
    utc(id.0)
}

fn utc(millis: i64) -> Result<FixedDateTime> {
    let offset = FixedOffset::east_opt(0).ok_or(Error::Timestamp(millis))?;
    offset
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(Error::Timestamp(millis))
}

fn link(href: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn author_to_people(author: &Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![Person {
            name: author.name.clone(),
            email: author.email.clone(),
            uri: None,
        }],
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants include I/O, Atom, URL and
/// timestamp issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),

    /// Returned when a post URL can't be built from the site root.
    UrlParse(UrlParseError),

    /// Returned when a post ID is out of range for a timestamp.
    Timestamp(i64),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Timestamp(millis) => {
                write!(f, "Post id {} is not a valid timestamp", millis)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Timestamp(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

impl From<UrlParseError> for Error {
    /// Converts [`UrlParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator for URL joining.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}
