use super::{error::PostsError, types::Post};
use std::path::{Path, PathBuf};
use tokio::{io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

/// The post collection, persisted as one JSON array in a single file.
///
/// Every read-modify-write goes through `write_lock`, so two requests in the
/// same process cannot interleave their cycles and drop each other's update.
/// Writes land in a sibling temp file that is renamed over the store, which
/// means readers never see a half-written document. Several processes
/// sharing one file are not coordinated.
pub struct PostStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PostStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every post. A missing, empty or unparsable file reads as an
    /// empty collection; other I/O failures are returned.
    pub async fn read_all(&self) -> Result<Vec<Post>, PostsError> {
        match self.load().await {
            Err(PostsError::UndecodableStore(reason)) => {
                warn!(
                    "Post store {:?} could not be decoded, treating it as empty: {}",
                    self.path, reason
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Like [`read_all`](Self::read_all), except that a document which is
    /// valid JSON but not a list of post records is reported as
    /// [`PostsError::UndecodableStore`]. Writers use this so that such a file
    /// is never replaced by an empty collection.
    async fn load(&self) -> Result<Vec<Post>, PostsError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Post store {:?} not found, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("Post store {:?} is empty", self.path);
            return Ok(Vec::new());
        }

        match serde_json::from_slice::<Vec<Post>>(&bytes) {
            Ok(posts) => Ok(posts),
            Err(e) if e.is_data() => Err(PostsError::UndecodableStore(e.to_string())),
            Err(e) => {
                warn!(
                    "Post store {:?} could not be parsed, treating it as empty: {}",
                    self.path, e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the whole store with `posts`.
    pub async fn write_all(&self, posts: &[Post]) -> Result<(), PostsError> {
        let _guard = self.write_lock.lock().await;
        self.persist(posts).await
    }

    pub async fn append(&self, post: Post) -> Result<(), PostsError> {
        self.update(|posts| {
            posts.push(post);
            Ok(())
        })
        .await
    }

    /// Runs one read-modify-write cycle under the store lock. When `f`
    /// returns an error, or the current file cannot be decoded, nothing is
    /// written.
    pub async fn update<F, T>(&self, f: F) -> Result<T, PostsError>
    where
        F: FnOnce(&mut Vec<Post>) -> Result<T, PostsError>,
    {
        let _guard = self.write_lock.lock().await;

        let mut posts = self.load().await?;
        let result = f(&mut posts)?;
        self.persist(&posts).await?;

        Ok(result)
    }

    async fn persist(&self, posts: &[Post]) -> Result<(), PostsError> {
        let json = serde_json::to_vec_pretty(posts)?;
        let tmp_path = self.tmp_path();

        {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!("Wrote {} posts to {:?}", posts.len(), self.path);

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "posts.json".into());
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}
