//! Defines [`PostStore`], which persists the whole collection of [`Post`]s as
//! a single JSON array under one key of a [`Storage`].

use crate::post::{Post, PostId};
use crate::storage::{Error as StorageError, Storage};
use std::fmt;
use tracing::{debug, info};

/// The key the collection is stored under unless configured otherwise.
pub const DEFAULT_KEY: &str = "chiari_blog_posts";

/// The collection of [`Post`]s. Posts have no life of their own outside the
/// collection: they are created by inserting into it, changed by overwriting
/// it, and destroyed by removing them from it or clearing it.
pub struct PostStore<S> {
    storage: S,
    key: String,
}

impl<S: Storage> PostStore<S> {
    pub fn new<K: Into<String>>(storage: S, key: K) -> PostStore<S> {
        PostStore {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn stored(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get_item(&self.key)?
            .filter(|value| !value.is_empty()))
    }

    /// Seeds the collection with `seed` if nothing (or an empty value) is
    /// stored under the key. An existing collection is never overwritten,
    /// even an empty one, so calling this repeatedly is harmless.
    pub fn initialize(&mut self, seed: Post) -> Result<()> {
        if self.stored()?.is_some() {
            debug!(key = %self.key, "collection already exists");
            return Ok(());
        }
        info!(key = %self.key, id = %seed.id, "seeding collection");
        self.save_all(&[seed])
    }

    /// Returns every stored post in storage order. A missing collection is
    /// empty; a collection that can't be deserialized is an error.
    pub fn get_all(&self) -> Result<Vec<Post>> {
        match self.stored()? {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_str(&json).map_err(Error::Deserialize),
        }
    }

    /// Overwrites the whole collection.
    pub fn save_all(&mut self, posts: &[Post]) -> Result<()> {
        let json = serde_json::to_string(posts).map_err(Error::Serialize)?;
        self.storage.set_item(&self.key, &json)?;
        Ok(())
    }

    /// Appends `post` to the collection. Fails without writing anything if
    /// a post with the same ID already exists.
    pub fn insert(&mut self, post: Post) -> Result<()> {
        let mut posts = self.get_all()?;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(Error::DuplicateId(post.id));
        }
        info!(id = %post.id, title = %post.title, "inserting post");
        posts.push(post);
        self.save_all(&posts)
    }

    /// Removes the post with `id`, returning whether it existed.
    pub fn remove(&mut self, id: PostId) -> Result<bool> {
        let mut posts = self.get_all()?;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Ok(false);
        }
        info!(id = %id, "removing post");
        self.save_all(&posts)?;
        Ok(true)
    }

    /// Removes the collection entirely. The next [`PostStore::initialize`]
    /// will seed it again.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove_item(&self.key)?;
        Ok(())
    }

    /// The ID to give a post created at `timestamp`: the timestamp itself,
    /// or one past the largest stored ID if that would not be unique and
    /// newest.
    pub fn next_id(&self, timestamp: PostId) -> Result<PostId> {
        let max = self.get_all()?.iter().map(|p| p.id).max();
        Ok(match max {
            Some(max) if max >= timestamp => PostId(max.0 + 1),
            _ => timestamp,
        })
    }
}

/// The result of a fallible [`PostStore`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading or writing the post collection.
#[derive(Debug)]
pub enum Error {
    /// Returned when the underlying [`Storage`] fails.
    Storage(StorageError),

    /// Returned when the stored collection isn't a valid JSON array of posts.
    /// There is no recovery from this; the stored value must be fixed or
    /// cleared by hand.
    Deserialize(serde_json::Error),

    /// Returned when the collection can't be serialized.
    Serialize(serde_json::Error),

    /// Returned when inserting a post whose ID is already taken.
    DuplicateId(PostId),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Storage(err) => err.fmt(f),
            Error::Deserialize(err) => {
                write!(f, "Reading stored posts: {}", err)
            }
            Error::Serialize(err) => {
                write!(f, "Writing posts: {}", err)
            }
            Error::DuplicateId(id) => {
                write!(f, "A post with id {} already exists", id)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Storage(err) => Some(err),
            Error::Deserialize(err) => Some(err),
            Error::Serialize(err) => Some(err),
            Error::DuplicateId(_) => None,
        }
    }
}

impl From<StorageError> for Error {
    /// Converts [`StorageError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: StorageError) -> Error {
        Error::Storage(err)
    }
}
