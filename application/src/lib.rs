use async_trait::async_trait;
use domain::{
    DomainError, NewPost, Post, PostId, PostPatch, SearchCriteria, SortDirection, SortField,
    SortSpec,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Message returned when a request carries no usable JSON body.
pub const NO_POST_SUBMITTED: &str = "no post submitted";

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("post with id {0} not found")]
    PostNotFound(PostId),
    #[error(transparent)]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

// --- Infrastructure Interfaces (Traits) ---

/// Ordered storage for posts. Each method is atomic with respect to the others.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Snapshot of every post in insertion order.
    async fn list(&self) -> Result<Vec<Post>, ApplicationError>;
    /// Assigns the next id and appends the post at the end.
    async fn insert(&self, draft: NewPost) -> Result<Post, ApplicationError>;
    /// Applies the patch in place. Returns `None` if no post has this id.
    async fn update(&self, id: PostId, patch: &PostPatch)
    -> Result<Option<Post>, ApplicationError>;
    /// Removes the post. Returns true if it existed.
    async fn delete(&self, id: PostId) -> Result<bool, ApplicationError>;
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

#[derive(Deserialize, Debug, Default)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Query string of `GET /api/posts`.
#[derive(Deserialize, Debug, Default)]
pub struct ListPostsQuery {
    pub sort: Option<String>,
    pub direction: Option<String>,
}

impl ListPostsQuery {
    fn sort_spec(&self) -> Option<SortSpec> {
        let field = SortField::parse(self.sort.as_deref()?)?;
        Some(SortSpec {
            field,
            direction: SortDirection::parse(self.direction.as_deref()),
        })
    }
}

/// Query string of `GET /api/posts/search`.
#[derive(Deserialize, Debug, Default)]
pub struct SearchPostsQuery {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct DeletePostResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Application Services (Use Cases) ---

/// Use cases over the post collection.
pub struct PostService {
    repository: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repository: Arc<dyn PostRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, query), fields(sort = ?query.sort, direction = ?query.direction))]
    pub async fn list_posts(&self, query: ListPostsQuery) -> Result<Vec<Post>, ApplicationError> {
        let mut posts = self.repository.list().await?;
        match query.sort_spec() {
            Some(spec) => {
                debug!(?spec, "Sorting posts");
                spec.apply(&mut posts);
            }
            None => debug!("No valid sort requested, keeping insertion order"),
        }
        info!(count = posts.len(), "Listed posts");
        Ok(posts)
    }

    #[instrument(skip(self, request))]
    pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post, ApplicationError> {
        let draft = NewPost::new(request.title, request.content).map_err(|e| {
            warn!("Post creation rejected: {}", e);
            e
        })?;
        let post = self.repository.insert(draft).await?;
        info!(post_id = %post.id, "Post created");
        Ok(post)
    }

    #[instrument(skip(self, request), fields(post_id = %id))]
    pub async fn update_post(
        &self,
        id: PostId,
        request: UpdatePostRequest,
    ) -> Result<Post, ApplicationError> {
        let patch = PostPatch::new(request.title, request.content);
        if patch.is_empty() {
            debug!("Update carries no fields, post stays unchanged");
        }
        match self.repository.update(id, &patch).await? {
            Some(post) => {
                info!("Post updated");
                Ok(post)
            }
            None => {
                warn!("Update failed: post not found");
                Err(ApplicationError::PostNotFound(id))
            }
        }
    }

    #[instrument(skip(self), fields(post_id = %id))]
    pub async fn delete_post(&self, id: PostId) -> Result<DeletePostResponse, ApplicationError> {
        if !self.repository.delete(id).await? {
            warn!("Deletion failed: post not found");
            return Err(ApplicationError::PostNotFound(id));
        }
        info!("Post deleted");
        Ok(DeletePostResponse {
            message: format!("post with id {} has been deleted successfully", id),
        })
    }

    #[instrument(skip(self, query), fields(title = ?query.title, content = ?query.content))]
    pub async fn search_posts(&self, query: SearchPostsQuery) -> Result<Vec<Post>, ApplicationError> {
        let criteria = SearchCriteria::new(query.title, query.content);
        if criteria.is_empty() {
            debug!("Search without criteria matches nothing");
            return Ok(Vec::new());
        }
        let hits: Vec<Post> = self
            .repository
            .list()
            .await?
            .into_iter()
            .filter(|post| criteria.matches(post))
            .collect();
        info!(hits = hits.len(), "Search finished");
        Ok(hits)
    }
}
