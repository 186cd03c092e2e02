use super::{error::PostsError, store::PostStore, types::*};
use std::cmp::Reverse;
use tracing::{debug, info};

pub struct ForumManager {
    config: PostsConfig,
    store: PostStore,
}

impl ForumManager {
    pub fn new(config: PostsConfig) -> Self {
        let store = PostStore::new(config.store_path.clone());
        Self { config, store }
    }

    pub fn get_config(&self) -> &PostsConfig {
        &self.config
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    pub async fn create_post(&self, new_post: NewPost) -> Result<Post, PostsError> {
        let post = Post::new(new_post);
        self.store.append(post.clone()).await?;

        info!("Created post {} by {:?}", post.id, post.author);
        Ok(post)
    }

    /// All posts, newest first. A single unparsable timestamp fails the
    /// whole listing.
    pub async fn list_posts(&self) -> Result<Vec<PostSummary>, PostsError> {
        let posts = self.store.read_all().await?;

        let mut dated = posts
            .iter()
            .map(|post| post.parsed_timestamp().map(|date| (date, post)))
            .collect::<Result<Vec<_>, _>>()?;
        dated.sort_by_key(|(date, _)| Reverse(*date));

        debug!("Listing {} posts", dated.len());

        Ok(dated
            .into_iter()
            .map(|(_, post)| PostSummary::from_post(post))
            .collect())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, PostsError> {
        let posts = self.store.read_all().await?;
        Ok(posts.into_iter().find(|post| post.id == id))
    }

    /// Applies `action` to the post with `id` and rewrites the store.
    ///
    /// The store is rewritten even for [`PostAction::NoChange`]; an unknown
    /// id leaves the file untouched and yields [`PostsError::PostNotFound`].
    pub async fn apply_action(&self, id: &str, action: PostAction) -> Result<Post, PostsError> {
        self.store
            .update(|posts| {
                let post = posts
                    .iter_mut()
                    .find(|post| post.id == id)
                    .ok_or_else(|| PostsError::PostNotFound(id.to_string()))?;

                match action {
                    PostAction::Comment { text, author } => {
                        let comment = Comment::new(text, author);
                        debug!("Adding comment by {:?} to post {}", comment.author, id);
                        post.add_comment(comment);
                    }
                    PostAction::Like => {
                        post.like();
                        debug!("Post {} now has {} likes", id, post.likes);
                    }
                    PostAction::NoChange => {
                        debug!("No action for post {}", id);
                    }
                }

                Ok(post.clone())
            })
            .await
    }

    pub async fn add_comment(
        &self,
        id: &str,
        text: String,
        author: Option<String>,
    ) -> Result<Post, PostsError> {
        self.apply_action(id, PostAction::Comment { text, author })
            .await
    }

    pub async fn like_post(&self, id: &str) -> Result<Post, PostsError> {
        self.apply_action(id, PostAction::Like).await
    }
}
