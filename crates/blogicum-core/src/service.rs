//! Blog use cases.
//!
//! [`BlogService`] composes the repositories with the visibility, pagination
//! and authorization rules. Every operation takes the acting user explicitly;
//! nothing is read from ambient request state.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::authorization::{Actor, ensure_author};
use crate::domain::{Category, Comment, CommentRecord, Post, PostRecord, User};
use crate::error::{DomainError, FieldErrors};
use crate::forms::{CommentForm, PostForm, ProfileForm, RegistrationForm, is_valid_slug};
use crate::pagination::{DEFAULT_PER_PAGE, Page, paginate};
use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, MediaStorage, MediaUpload,
    POST_IMAGES_DIR, PasswordService, PostRepository, PostScope, UserRepository,
};
use crate::urls;
use crate::visibility::{FeedItem, FeedOptions, can_view, filter_annotate};

/// Tunables of the blog behaviour.
#[derive(Debug, Clone)]
pub struct BlogSettings {
    /// Posts per feed page.
    pub per_page: usize,
    /// Reject a post whose `(title, text)` pair already exists on another post.
    pub unique_title_text: bool,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            unique_title_text: false,
        }
    }
}

/// The repositories the blog works on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
}

/// Result of a successful mutation: the affected value and the canonical URL
/// the client should be sent to next.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub redirect_to: String,
}

impl<T> Outcome<T> {
    fn new(value: T, redirect_to: String) -> Self {
        Self { value, redirect_to }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryFeed {
    pub category: Category,
    pub page: Page<FeedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub profile: User,
    pub page: Page<FeedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub record: PostRecord,
    pub comments: Vec<CommentRecord>,
}

#[derive(Clone)]
pub struct BlogService {
    repos: Repositories,
    media: Arc<dyn MediaStorage>,
    passwords: Arc<dyn PasswordService>,
    settings: BlogSettings,
}

impl BlogService {
    pub fn new(
        repos: Repositories,
        media: Arc<dyn MediaStorage>,
        passwords: Arc<dyn PasswordService>,
        settings: BlogSettings,
    ) -> Self {
        Self {
            repos,
            media,
            passwords,
            settings,
        }
    }

    // ---------------------------------------------------------------------
    // Feeds
    // ---------------------------------------------------------------------

    /// Index feed: every publicly visible post.
    ///
    /// Public listings ignore the viewer, so authors do not see their own
    /// drafts here.
    pub async fn index(&self, page: usize) -> Result<Page<FeedItem>, DomainError> {
        let records = self.repos.posts.find_records(PostScope::All).await?;
        let items = filter_annotate(records, FeedOptions::PUBLIC, None, Utc::now());
        paginate(items, page, self.settings.per_page)
    }

    /// Publicly visible posts of a published category.
    pub async fn category_posts(&self, slug: &str, page: usize) -> Result<CategoryFeed, DomainError> {
        if !is_valid_slug(slug) {
            return Err(DomainError::not_found("category", slug));
        }
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let records = self
            .repos
            .posts
            .find_records(PostScope::InCategory(category.id))
            .await?;
        let items = filter_annotate(records, FeedOptions::PUBLIC, None, Utc::now());

        Ok(CategoryFeed {
            category,
            page: paginate(items, page, self.settings.per_page)?,
        })
    }

    /// A user's posts. The owner sees all of them; anyone else only the
    /// publicly visible ones.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<&Actor>,
        page: usize,
    ) -> Result<ProfileFeed, DomainError> {
        let profile = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let records = self
            .repos
            .posts
            .find_records(PostScope::ByAuthor(profile.id))
            .await?;

        let options = if viewer.is_some_and(|v| v.id == profile.id) {
            FeedOptions::OWNER
        } else {
            FeedOptions::PUBLIC
        };
        let items = filter_annotate(records, options, viewer.map(|v| v.id), Utc::now());

        Ok(ProfileFeed {
            profile,
            page: paginate(items, page, self.settings.per_page)?,
        })
    }

    /// A single post with its comments, if the viewer may see it.
    pub async fn post_detail(
        &self,
        post_id: Uuid,
        viewer: Option<&Actor>,
    ) -> Result<PostDetail, DomainError> {
        let record = self.viewable_record(post_id, viewer).await?;
        let comments = self.repos.comments.find_by_post(post_id).await?;
        Ok(PostDetail { record, comments })
    }

    async fn viewable_record(
        &self,
        post_id: Uuid,
        viewer: Option<&Actor>,
    ) -> Result<PostRecord, DomainError> {
        self.repos
            .posts
            .find_record(post_id)
            .await?
            .filter(|r| can_view(r, viewer.map(|v| v.id), Utc::now()))
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    // ---------------------------------------------------------------------
    // Posts
    // ---------------------------------------------------------------------

    /// Load a post for mutation by `actor`.
    async fn authored_post(&self, actor: &Actor, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        ensure_author(actor, post.author_id, urls::post_detail(post_id))?;
        Ok(post)
    }

    /// The GET side of the edit and delete routes.
    pub async fn post_for_edit(&self, actor: &Actor, post_id: Uuid) -> Result<PostRecord, DomainError> {
        self.authored_post(actor, post_id).await?;
        self.repos
            .posts
            .find_record(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    pub async fn create_post(
        &self,
        actor: &Actor,
        mut form: PostForm,
    ) -> Result<Outcome<Post>, DomainError> {
        form.validate(Utc::now())?;
        self.check_references(&form).await?;
        self.check_unique_title_text(&form, None).await?;

        let mut post = Post::new(actor.id, form.title, form.text, form.pub_date);
        post.is_published = form.is_published;
        post.category_id = form.category_id;
        post.location_id = form.location_id;

        let saved = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %saved.id, author = %actor.username, "Post created");

        Ok(Outcome::new(saved, urls::profile(&actor.username)))
    }

    pub async fn update_post(
        &self,
        actor: &Actor,
        post_id: Uuid,
        mut form: PostForm,
    ) -> Result<Outcome<Post>, DomainError> {
        let mut post = self.authored_post(actor, post_id).await?;

        form.validate(Utc::now())?;
        self.check_references(&form).await?;
        self.check_unique_title_text(&form, Some(post_id)).await?;

        post.title = form.title;
        post.text = form.text;
        post.pub_date = form.pub_date;
        post.is_published = form.is_published;
        post.category_id = form.category_id;
        post.location_id = form.location_id;
        post.updated_at = Utc::now();

        let saved = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %saved.id, "Post updated");

        Ok(Outcome::new(saved, urls::post_detail(post_id)))
    }

    /// Delete a post; its comments go with it.
    pub async fn delete_post(&self, actor: &Actor, post_id: Uuid) -> Result<Outcome<Uuid>, DomainError> {
        let post = self.authored_post(actor, post_id).await?;

        self.repos.posts.delete(post_id).await?;
        tracing::info!(post_id = %post_id, "Post deleted");

        if let Some(image) = post.image {
            self.remove_media(&image).await;
        }

        Ok(Outcome::new(post_id, urls::profile(&actor.username)))
    }

    /// Store `upload` as the post's image, replacing any previous one.
    pub async fn attach_image(
        &self,
        actor: &Actor,
        post_id: Uuid,
        upload: MediaUpload,
    ) -> Result<Outcome<Post>, DomainError> {
        let mut post = self.authored_post(actor, post_id).await?;

        let path = self.media.store(POST_IMAGES_DIR, upload).await?;
        let previous = post.image.replace(path);
        post.updated_at = Utc::now();

        let stored = post.image.clone();
        let saved = match self.repos.posts.save(post).await {
            Ok(saved) => saved,
            Err(e) => {
                if let Some(stored) = stored {
                    self.remove_media(&stored).await;
                }
                return Err(e.into());
            }
        };
        if let Some(previous) = previous {
            self.remove_media(&previous).await;
        }

        Ok(Outcome::new(saved, urls::post_detail(post_id)))
    }

    async fn remove_media(&self, path: &str) {
        if let Err(e) = self.media.remove(path).await {
            tracing::warn!(path = %path, error = %e, "Failed to remove media file");
        }
    }

    async fn check_references(&self, form: &PostForm) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();

        if let Some(id) = form.category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                errors.add("category", "Select a valid choice.");
            }
        }
        if let Some(id) = form.location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                errors.add("location", "Select a valid choice.");
            }
        }

        errors.into_result()
    }

    async fn check_unique_title_text(
        &self,
        form: &PostForm,
        exclude: Option<Uuid>,
    ) -> Result<(), DomainError> {
        if !self.settings.unique_title_text {
            return Ok(());
        }

        let taken = self
            .repos
            .posts
            .exists_with_title_text(&form.title, &form.text, exclude)
            .await?;
        if taken {
            return Err(DomainError::Duplicate(
                "A post with this title and text already exists".to_string(),
            ));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Comments
    // ---------------------------------------------------------------------

    /// Comment on a post the actor can see.
    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        mut form: CommentForm,
    ) -> Result<Outcome<Comment>, DomainError> {
        self.viewable_record(post_id, Some(actor)).await?;
        form.validate()?;

        let comment = Comment::new(post_id, actor.id, form.text);
        let saved = self.repos.comments.save(comment).await?;
        tracing::info!(comment_id = %saved.id, post_id = %post_id, "Comment added");

        Ok(Outcome::new(saved, urls::post_detail(post_id)))
    }

    /// Load a comment of `post_id` for mutation by `actor`.
    pub async fn comment_for_edit(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;
        ensure_author(actor, comment.author_id, urls::post_detail(post_id))?;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
        mut form: CommentForm,
    ) -> Result<Outcome<Comment>, DomainError> {
        let mut comment = self.comment_for_edit(actor, post_id, comment_id).await?;
        form.validate()?;

        comment.text = form.text;
        let saved = self.repos.comments.save(comment).await?;

        Ok(Outcome::new(saved, urls::post_detail(post_id)))
    }

    pub async fn delete_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Outcome<Uuid>, DomainError> {
        self.comment_for_edit(actor, post_id, comment_id).await?;
        self.repos.comments.delete(comment_id).await?;
        tracing::info!(comment_id = %comment_id, post_id = %post_id, "Comment deleted");

        Ok(Outcome::new(comment_id, urls::post_detail(post_id)))
    }

    // ---------------------------------------------------------------------
    // Accounts
    // ---------------------------------------------------------------------

    pub async fn current_user(&self, actor: &Actor) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(actor.id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        mut form: ProfileForm,
    ) -> Result<Outcome<User>, DomainError> {
        let mut user = self.current_user(actor).await?;
        form.validate()?;

        if form.username != user.username {
            self.ensure_username_free(&form.username).await?;
        }
        if form.email != user.email {
            self.ensure_email_free(&form.email, Some(user.id)).await?;
        }

        user.username = form.username;
        user.email = form.email;
        user.first_name = form.first_name;
        user.last_name = form.last_name;
        user.updated_at = Utc::now();

        let saved = self.repos.users.save(user).await?;
        let redirect_to = urls::profile(&saved.username);
        Ok(Outcome::new(saved, redirect_to))
    }

    pub async fn register(&self, mut form: RegistrationForm) -> Result<User, DomainError> {
        form.validate()?;
        self.ensure_username_free(&form.username).await?;
        self.ensure_email_free(&form.email, None).await?;

        let password_hash = self
            .passwords
            .hash(&form.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = User::new(form.username, form.email, password_hash);
        let saved = self.repos.users.save(user).await?;
        tracing::info!(user_id = %saved.id, "User registered");
        Ok(saved)
    }

    /// Check a username/password pair.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let user = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }
        Ok(user)
    }

    async fn ensure_username_free(&self, username: &str) -> Result<(), DomainError> {
        if self.repos.users.find_by_username(username).await?.is_some() {
            return Err(DomainError::Duplicate(
                "A user with that username already exists".to_string(),
            ));
        }
        Ok(())
    }

    /// A blank email is never taken. `owner` may keep their own address.
    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        if email.is_empty() {
            return Ok(());
        }
        match self.repos.users.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => Err(DomainError::Duplicate(
                "Email already registered".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
