//! Loads the site configuration from `voices.yaml` and the theme description
//! from `theme/theme.yaml`.

use crate::render::{
    Renderer, DEFAULT_BANNER_PLACEHOLDER, DEFAULT_CARD_PLACEHOLDER, DEFAULT_DESCRIPTION_LENGTH,
    DEFAULT_SNIPPET_LENGTH, FEED_CONTAINER, POST_BANNER, POST_BODY, POST_CONTENT, POST_META,
    POST_TITLE,
};
use crate::store::DEFAULT_KEY;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

const PROJECT_FILE: &str = "voices.yaml";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct SnippetLength(usize);
impl Default for SnippetLength {
    fn default() -> Self {
        SnippetLength(DEFAULT_SNIPPET_LENGTH)
    }
}

#[derive(Deserialize)]
struct DescriptionLength(usize);
impl Default for DescriptionLength {
    fn default() -> Self {
        DescriptionLength(DEFAULT_DESCRIPTION_LENGTH)
    }
}

#[derive(Deserialize)]
struct Storage {
    #[serde(default = "default_key")]
    key: String,

    #[serde(default = "default_storage_file")]
    file: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Storage {
            key: default_key(),
            file: default_storage_file(),
        }
    }
}

fn default_key() -> String {
    DEFAULT_KEY.to_owned()
}

fn default_storage_file() -> PathBuf {
    PathBuf::from(".voices/storage.json")
}

fn default_site_name() -> String {
    String::from("Chiari Voices")
}

fn default_card_placeholder() -> String {
    DEFAULT_CARD_PLACEHOLDER.to_owned()
}

fn default_banner_placeholder() -> String {
    DEFAULT_BANNER_PLACEHOLDER.to_owned()
}

#[derive(Deserialize)]
struct Project {
    #[serde(default = "default_site_name")]
    site_name: String,

    site_root: Url,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    storage: Storage,

    #[serde(default)]
    snippet_length: SnippetLength,

    #[serde(default)]
    description_length: DescriptionLength,

    #[serde(default = "default_card_placeholder")]
    card_placeholder: String,

    #[serde(default = "default_banner_placeholder")]
    banner_placeholder: String,
}

fn default_index_elements() -> Vec<String> {
    vec![FEED_CONTAINER.to_owned()]
}

fn default_posts_elements() -> Vec<String> {
    [POST_BANNER, POST_TITLE, POST_META, POST_BODY, POST_CONTENT]
        .iter()
        .map(|id| (*id).to_owned())
        .collect()
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,

    /// The IDs of the elements the feed page has.
    #[serde(default = "default_index_elements")]
    index_elements: Vec<String>,

    /// The IDs of the elements the post page has.
    #[serde(default = "default_posts_elements")]
    posts_elements: Vec<String>,
}

pub struct Config {
    pub site_name: String,
    pub site_root: Url,
    pub author: Option<Author>,
    pub storage_key: String,
    pub storage_file: PathBuf,
    pub snippet_length: usize,
    pub description_length: usize,
    pub card_placeholder: String,
    pub banner_placeholder: String,
    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,
    pub index_elements: Vec<String>,
    pub posts_elements: Vec<String>,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for `voices.yaml` and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            match Config::from_project_file(&path) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads the project file at `path` and the theme next to it. Relative
    /// paths in either are resolved against their own directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                let theme_dir = project_root.join("theme");
                let theme_file = open(&theme_dir.join("theme.yaml"), "theme")?;
                let theme: Theme = serde_yaml::from_reader(theme_file)?;
                Ok(Config {
                    site_name: project.site_name,
                    site_root: project.site_root,
                    author: project.author,
                    storage_key: project.storage.key,
                    storage_file: project_root.join(project.storage.file),
                    snippet_length: project.snippet_length.0,
                    description_length: project.description_length.0,
                    card_placeholder: project.card_placeholder,
                    banner_placeholder: project.banner_placeholder,
                    index_template: theme
                        .index_template
                        .iter()
                        .map(|relpath| theme_dir.join(relpath))
                        .collect(),
                    posts_template: theme
                        .posts_template
                        .iter()
                        .map(|relpath| theme_dir.join(relpath))
                        .collect(),
                    index_elements: theme.index_elements,
                    posts_elements: theme.posts_elements,
                })
            }
        }
    }

    /// A [`Renderer`] configured with this site's name, lengths and
    /// placeholders.
    pub fn renderer(&self) -> Renderer<'_> {
        Renderer {
            site_name: &self.site_name,
            snippet_length: self.snippet_length,
            description_length: self.description_length,
            card_placeholder: &self.card_placeholder,
            banner_placeholder: &self.banner_placeholder,
        }
    }
}
