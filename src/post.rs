//! Defines the [`Post`], [`SeoInfo`], [`PostId`], [`Parser`], and [`Error`]
//! types. [`Post`] is the record persisted by [`crate::store::PostStore`];
//! [`Parser`] turns Markdown source files with YAML frontmatter into posts so
//! they can be published into the store.

use std::{
    fmt,
    fs::File,
    num::ParseIntError,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, TimeZone};
use pulldown_cmark::{html, Options, Parser as MarkdownParser};
use serde::{Deserialize, Serialize};

use crate::markup::Markup;

/// Identifies a [`Post`]. IDs are millisecond creation timestamps, so
/// ordering by ID orders posts by creation time regardless of the (free-form)
/// display date.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl PostId {
    /// The ID for a post created at `time`.
    pub fn at<Tz: TimeZone>(time: &DateTime<Tz>) -> PostId {
        PostId(time.timestamp_millis())
    }
}

impl FromStr for PostId {
    type Err = ParseIntError;

    /// Parses the text of an `id` query parameter. Surrounding whitespace is
    /// ignored; anything else that isn't an integer is an error.
    fn from_str(s: &str) -> std::result::Result<PostId, ParseIntError> {
        s.trim().parse().map(PostId)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Represents a blog post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// The unique ID of the post. See [`PostId`].
    pub id: PostId,

    /// The title of the post.
    pub title: String,

    /// The date of the post as it should be displayed. This is never parsed.
    pub date: String,

    /// The author of the post.
    pub author: String,

    /// The URL of the post's image. Use [`Post::image_or`] to apply a
    /// placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// The body of the post as trusted HTML.
    pub content: Markup,

    /// Search-engine metadata for the post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoInfo>,
}

/// Search-engine metadata for a [`Post`]. Every field is optional; see
/// [`crate::seo::SeoTags`] for the fallbacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_keyword: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_keywords: Option<String>,

    /// A cosmetic slug appended to the post's address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Treats empty strings the same as missing values.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Post {
    /// The post's image URL, or `placeholder` if the image is missing or
    /// empty.
    pub fn image_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        present(&self.image).unwrap_or(placeholder)
    }

    /// The tag-stripped content truncated to `budget` characters. This is used
    /// for feed snippets and default descriptions.
    pub fn preview(&self, budget: usize) -> String {
        self.content.preview(budget)
    }
}

const WELCOME_IMAGE: &str = "assets/hope-resilience.webp";

/// The post every new store is seeded with.
pub fn welcome_post<Tz>(site_name: &str, now: &DateTime<Tz>) -> Post
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    Post {
        id: PostId::at(now),
        title: format!("Welcome to {}", site_name),
        date: now.format("%-m/%-d/%Y").to_string(),
        author: String::from("Admin"),
        image: Some(String::from(WELCOME_IMAGE)),
        content: Markup::trusted(
            "<p>Welcome to our new foundation blog. Here we will share stories \
             of strength, medical updates, and community news.</p>",
        ),
        seo: Some(SeoInfo {
            meta_title: Some(format!("Welcome to {} Blog", site_name)),
            description: Some(format!(
                "The official blog for the {} Foundation.",
                site_name
            )),
            primary_keyword: Some(String::from("Chiari Malformation")),
            secondary_keywords: Some(String::from("Support, Non-profit")),
            slug: None,
        }),
    }
}

/// Parses [`Post`] objects from Markdown source files.
pub struct Parser<'a, Tz: TimeZone> {
    /// The time of publication. The display date defaults to this and the ID
    /// is derived from it by the store.
    now: &'a DateTime<Tz>,
}

impl<'a, Tz> Parser<'a, Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn new(now: &'a DateTime<Tz>) -> Parser<'a, Tz> {
        Parser { now }
    }

    /// Parses a single post source. Each source must be structured as
    /// follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `Title`, `Author`, and optionally
    ///    `Date`, `Image`, and `Seo`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body as Markdown
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Author: Admin
    /// Seo:
    ///   Slug: hello
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// The returned post's ID is [`PostId::at`] the parser's time; the store
    /// may bump it when it collides (see
    /// [`crate::store::PostStore::next_id`]).
    pub fn parse_post(&self, input: &str) -> Result<Post> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            match input[FENCE.len()..].find(FENCE) {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                        // yaml_start
                    FENCE.len() + offset,               // yaml_stop
                    FENCE.len() + offset + FENCE.len(), // body_start
                )),
            }
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter =
            serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let mut options = Options::empty();
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        let mut content = String::new();
        html::push_html(
            &mut content,
            MarkdownParser::new_ext(&input[body_start..], options),
        );

        Ok(Post {
            id: PostId::at(self.now),
            title: frontmatter.title,
            date: frontmatter
                .date
                .unwrap_or_else(|| self.now.format("%-m/%-d/%Y").to_string()),
            author: frontmatter.author,
            image: frontmatter.image,
            content: Markup::trusted(content),
            seo: frontmatter.seo.map(|seo| SeoInfo {
                meta_title: seo.meta_title,
                description: seo.description,
                primary_keyword: seo.primary_keyword,
                secondary_keywords: seo.secondary_keywords,
                slug: seo.slug.map(slug::slugify),
            }),
        })
    }

    /// Parses the post source file at `path`, annotating any error with the
    /// path.
    pub fn parse_file(&self, path: &Path) -> Result<Post> {
        use std::io::Read;
        let parse = || -> Result<Post> {
            let mut contents = String::new();
            File::open(path)?.read_to_string(&mut contents)?;
            self.parse_post(&contents)
        };
        parse().map_err(|e| {
            Error::Annotated(format!("parsing post `{}`", path.display()), Box::new(e))
        })
    }
}

/// Returns the Markdown (`.md`) source files at `path`: the file itself
/// when `path` is a file, or every `.md` file beneath it (sorted by path)
/// when it's a directory.
pub fn source_files(path: &Path) -> Result<Vec<PathBuf>> {
    const MARKDOWN_EXTENSION: &str = "md";

    if path.is_file() {
        return Ok(vec![path.to_owned()]);
    }

    use walkdir::WalkDir;
    let mut files = Vec::new();
    for result in WalkDir::new(path).sort_by(|a, b| a.path().cmp(b.path())) {
        let entry = result?;
        if entry.file_type().is_file()
            && entry.path().extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
        {
            files.push(entry.path().to_owned());
        }
    }
    Ok(files)
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(rename = "Title")]
    title: String,

    #[serde(rename = "Author")]
    author: String,

    #[serde(default, rename = "Date")]
    date: Option<String>,

    #[serde(default, rename = "Image")]
    image: Option<String>,

    #[serde(default, rename = "Seo")]
    seo: Option<SeoFrontmatter>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SeoFrontmatter {
    #[serde(default)]
    meta_title: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    primary_keyword: Option<String>,

    #[serde(default)]
    secondary_keywords: Option<String>,

    #[serde(default)]
    slug: Option<String>,
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for I/O errors reading source files.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 4, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_deserialize_stored_post() -> std::result::Result<(), serde_json::Error> {
        let post: Post = serde_json::from_str(
            r#"{
                "id": 1700000000000,
                "title": "Welcome",
                "date": "11/14/2023",
                "author": "Admin",
                "image": "assets/hope-resilience.webp",
                "content": "<p>Hi</p>",
                "seo": {
                    "metaTitle": "Welcome Blog",
                    "description": "The blog.",
                    "primaryKeyword": "Chiari Malformation",
                    "secondaryKeywords": "Support, Non-profit"
                }
            }"#,
        )?;
        assert_eq!(PostId(1_700_000_000_000), post.id);
        assert_eq!("<p>Hi</p>", post.content.as_str());
        let seo = post.seo.unwrap();
        assert_eq!(Some("Welcome Blog"), seo.meta_title.as_deref());
        assert_eq!(Some("Support, Non-profit"), seo.secondary_keywords.as_deref());
        assert_eq!(None, seo.slug);
        Ok(())
    }

    #[test]
    fn test_serialize_omits_missing_optionals() -> std::result::Result<(), serde_json::Error> {
        let post = Post {
            id: PostId(42),
            title: String::from("T"),
            date: String::from("D"),
            author: String::from("A"),
            image: None,
            content: Markup::trusted("<p>c</p>"),
            seo: Some(SeoInfo {
                slug: Some(String::from("hello")),
                ..SeoInfo::default()
            }),
        };
        assert_eq!(
            r#"{"id":42,"title":"T","date":"D","author":"A","content":"<p>c</p>","seo":{"slug":"hello"}}"#,
            serde_json::to_string(&post)?
        );
        Ok(())
    }

    #[test]
    fn test_image_or_placeholder() {
        let mut post = welcome_post("Site", &now());
        assert_eq!("placeholder", post.image_or("placeholder"));
        post.image = Some(String::new());
        assert_eq!("placeholder", post.image_or("placeholder"));
        post.image = Some(String::from("a.webp"));
        assert_eq!("a.webp", post.image_or("placeholder"));
    }

    #[test]
    fn test_parse_post_id() {
        assert_eq!(Ok(PostId(42)), "42".parse::<PostId>());
        assert_eq!(Ok(PostId(42)), " 42 ".parse::<PostId>());
        assert!("".parse::<PostId>().is_err());
        assert!("abc".parse::<PostId>().is_err());
        assert_eq!(Ok(PostId(42)), "+42".parse::<PostId>());
        assert_eq!(Ok(PostId(42)), "042".parse::<PostId>());
        assert!("99999999999999999999".parse::<PostId>().is_err());
    }

    #[test]
    fn test_welcome_post() {
        let post = welcome_post("Chiari Voices", &now());
        assert_eq!(PostId(now().timestamp_millis()), post.id);
        assert_eq!("Welcome to Chiari Voices", post.title);
        assert_eq!("4/16/2021", post.date);
        assert_eq!("Admin", post.author);
        assert_eq!(Some("assets/hope-resilience.webp"), post.image.as_deref());
        assert_eq!(
            "<p>Welcome to our new foundation blog. Here we will share stories of \
             strength, medical updates, and community news.</p>",
            post.content.as_str()
        );
        assert_eq!(
            Some(SeoInfo {
                meta_title: Some(String::from("Welcome to Chiari Voices Blog")),
                description: Some(String::from(
                    "The official blog for the Chiari Voices Foundation."
                )),
                primary_keyword: Some(String::from("Chiari Malformation")),
                secondary_keywords: Some(String::from("Support, Non-profit")),
                slug: None,
            }),
            post.seo
        );
    }

    #[test]
    fn test_welcome_post_names_configured_site() {
        let post = welcome_post("Other Site", &now());
        assert_eq!("Welcome to Other Site", post.title);
        let seo = post.seo.unwrap();
        assert_eq!(Some("Welcome to Other Site Blog"), seo.meta_title.as_deref());
        assert_eq!(
            Some("The official blog for the Other Site Foundation."),
            seo.description.as_deref()
        );
        assert_eq!(Some("Chiari Malformation"), seo.primary_keyword.as_deref());
    }

    #[test]
    fn test_parse_post() -> Result<()> {
        let now = now();
        let post = Parser::new(&now).parse_post(
            "---\nTitle: Hello, world!\nAuthor: Admin\nSeo:\n  Slug: Hello World\n  PrimaryKeyword: greeting\n---\n# Hello\n\nWorld\n",
        )?;
        assert_eq!(PostId::at(&now), post.id);
        assert_eq!("Hello, world!", post.title);
        assert_eq!("4/16/2021", post.date);
        assert_eq!("<h1>Hello</h1>\n<p>World</p>\n", post.content.as_str());
        let seo = post.seo.unwrap();
        assert_eq!(Some("hello-world"), seo.slug.as_deref());
        assert_eq!(Some("greeting"), seo.primary_keyword.as_deref());
        Ok(())
    }

    #[test]
    fn test_parse_post_explicit_date() -> Result<()> {
        let now = now();
        let post = Parser::new(&now)
            .parse_post("---\nTitle: T\nAuthor: A\nDate: March 1st\n---\nbody")?;
        assert_eq!("March 1st", post.date);
        assert_eq!(None, post.seo);
        Ok(())
    }

    #[test]
    fn test_parse_post_missing_fences() {
        let now = now();
        let parser = Parser::new(&now);
        assert!(matches!(
            parser.parse_post("Title: T\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            parser.parse_post("---\nTitle: T\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_source_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("nested"))?;
        std::fs::write(dir.path().join("b.md"), "")?;
        std::fs::write(dir.path().join("nested/a.md"), "")?;
        std::fs::write(dir.path().join("notes.txt"), "")?;

        let files = source_files(dir.path())?;
        assert_eq!(
            vec![dir.path().join("b.md"), dir.path().join("nested/a.md")],
            files
        );
        assert_eq!(
            vec![dir.path().join("b.md")],
            source_files(&dir.path().join("b.md"))?
        );
        Ok(())
    }
}
