use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentRecord, Location, Post, PostRecord, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their (unique) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Which posts a listing query starts from, before visibility filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    ByAuthor(Uuid),
    InCategory(Uuid),
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Load posts in `scope` with their relations and comment counts resolved.
    async fn find_records(&self, scope: PostScope) -> Result<Vec<PostRecord>, RepoError>;

    /// Load a single post with its relations resolved.
    async fn find_record(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    /// Whether another post (not `exclude`) already has exactly this title and text.
    async fn exists_with_title_text(
        &self,
        title: &str,
        text: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, oldest first, with author names resolved.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

/// Location repository.
pub trait LocationRepository: BaseRepository<Location, Uuid> {}
