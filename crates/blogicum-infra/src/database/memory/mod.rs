//! In-memory store - used when no database is configured, and in tests.
//!
//! All repositories created from one [`InMemoryStore`] share the same tables,
//! so the store can enforce what the database schema enforces: unique
//! usernames and slugs, foreign keys, and the delete cascades
//! (post -> comments, user -> posts and comments, category/location -> null).
//! Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{
    Category, Comment, CommentRecord, Location, Post, PostRecord, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    PostScope, UserRepository,
};
use blogicum_core::service::Repositories;


#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
}

impl Tables {
    fn post_record(&self, post: &Post) -> PostRecord {
        PostRecord {
            post: post.clone(),
            author_username: self
                .users
                .get(&post.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            category: post
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id).cloned()),
            comment_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as u64,
        }
    }

    fn remove_post(&mut self, post_id: Uuid) -> bool {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != post_id);
        }
        removed
    }
}

/// Shared in-memory tables with async `RwLock` access.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository(self.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository(self.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository(self.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository(self.clone())
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryLocationRepository(self.clone())
    }

    /// Every repository port, backed by this store.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.users()),
            posts: Arc::new(self.posts()),
            comments: Arc::new(self.comments()),
            categories: Arc::new(self.categories()),
            locations: Arc::new(self.locations()),
        }
    }
}

fn missing_reference(what: &str) -> RepoError {
    RepoError::Constraint(format!("referenced {what} does not exist"))
}

pub struct InMemoryUserRepository(InMemoryStore);

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.0.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.0.tables.write().await;

        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(RepoError::Constraint("username already exists".to_string()));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }
}

pub struct InMemoryPostRepository(InMemoryStore);

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.0.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.tables.write().await;

        if !tables.users.contains_key(&post.author_id) {
            return Err(missing_reference("author"));
        }
        if post
            .category_id
            .is_some_and(|id| !tables.categories.contains_key(&id))
        {
            return Err(missing_reference("category"));
        }
        if post
            .location_id
            .is_some_and(|id| !tables.locations.contains_key(&id))
        {
            return Err(missing_reference("location"));
        }

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_records(&self, scope: PostScope) -> Result<Vec<PostRecord>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|p| match scope {
                PostScope::All => true,
                PostScope::ByAuthor(author_id) => p.author_id == author_id,
                PostScope::InCategory(category_id) => p.category_id == Some(category_id),
            })
            .map(|p| tables.post_record(p))
            .collect())
    }

    async fn find_record(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.posts.get(&id).map(|p| tables.post_record(p)))
    }

    async fn exists_with_title_text(
        &self,
        title: &str,
        text: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .posts
            .values()
            .any(|p| p.title == title && p.text == text && Some(p.id) != exclude))
    }
}

pub struct InMemoryCommentRepository(InMemoryStore);

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.0.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.0.tables.write().await;

        if !tables.posts.contains_key(&comment.post_id) {
            return Err(missing_reference("post"));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(missing_reference("author"));
        }

        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        match tables.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let tables = self.0.tables.read().await;
        let mut comments: Vec<CommentRecord> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentRecord {
                comment: c.clone(),
                author_username: tables
                    .users
                    .get(&c.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect();
        comments.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then_with(|| a.comment.id.cmp(&b.comment.id))
        });
        Ok(comments)
    }
}

pub struct InMemoryCategoryRepository(InMemoryStore);

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.0.tables.read().await.categories.get(&id).cloned())
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.0.tables.write().await;

        let taken = tables
            .categories
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id);
        if taken {
            return Err(RepoError::Constraint("slug already exists".to_string()));
        }

        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }
}

pub struct InMemoryLocationRepository(InMemoryStore);

#[async_trait]
impl BaseRepository<Location, Uuid> for InMemoryLocationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepoError> {
        Ok(self.0.tables.read().await.locations.get(&id).cloned())
    }

    async fn save(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.locations.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

impl LocationRepository for InMemoryLocationRepository {}
