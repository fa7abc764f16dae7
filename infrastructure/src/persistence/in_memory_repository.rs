// ./infrastructure/src/persistence/in_memory_repository.rs
use application::{ApplicationError, PostRepository};
use async_trait::async_trait;
use domain::{NewPost, Post, PostId, PostPatch};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, trace};

/// Ordered, in-process post collection.
///
/// A single mutex guards the whole vector, so id derivation and the append
/// that follows it can never interleave with another writer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostRepository {
    posts: Arc<Mutex<Vec<Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing collection, kept in the given order.
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Arc::new(Mutex::new(posts)),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Post>, ApplicationError> {
        let posts = self.posts.lock().await;
        trace!(count = posts.len(), "Snapshotting post collection");
        Ok(posts.clone())
    }

    #[instrument(skip(self, draft))]
    async fn insert(&self, draft: NewPost) -> Result<Post, ApplicationError> {
        let mut posts = self.posts.lock().await;
        let id = PostId::next_after(&posts);
        let post = Post::new(id, draft);
        posts.push(post.clone());
        debug!(post_id = %id, count = posts.len(), "Appended post to in-memory store");
        Ok(post)
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: PostId,
        patch: &PostPatch,
    ) -> Result<Option<Post>, ApplicationError> {
        let mut posts = self.posts.lock().await;
        let updated = posts.iter_mut().find(|post| post.id == id).map(|post| {
            post.apply(patch);
            post.clone()
        });
        debug!(post_id = %id, found = updated.is_some(), "Updated post in in-memory store");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: PostId) -> Result<bool, ApplicationError> {
        let mut posts = self.posts.lock().await;
        match posts.iter().position(|post| post.id == id) {
            Some(index) => {
                posts.remove(index);
                debug!(post_id = %id, "Removed post from in-memory store");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
