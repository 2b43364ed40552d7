//! PostgreSQL repository implementations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use blogicum_core::domain::{Category, CommentRecord, Location, Post, PostRecord, User};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, PostScope,
    UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***"),
            _ => "***".to_string(),
        };
        format!("{}{}", masked_local, domain)
    } else {
        "***".to_string()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

impl PostgresPostRepository {
    /// Resolve authors, categories, locations and comment counts for `posts`
    /// with one query per relation.
    async fn load_records(&self, posts: Vec<post::Model>) -> Result<Vec<PostRecord>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let author_ids: HashSet<Uuid> = posts.iter().map(|p| p.author_id).collect();
        let category_ids: HashSet<Uuid> = posts.iter().filter_map(|p| p.category_id).collect();
        let location_ids: HashSet<Uuid> = posts.iter().filter_map(|p| p.location_id).collect();

        let authors: HashMap<Uuid, String> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            CategoryEntity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(self.db.as_ref())
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|c| (c.id, Category::from(c)))
                .collect()
        };

        let locations: HashMap<Uuid, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            LocationEntity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(self.db.as_ref())
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|l| (l.id, Location::from(l)))
                .collect()
        };

        let comment_counts: HashMap<Uuid, i64> = CommentEntity::find()
            .select_only()
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .column(comment::Column::PostId)
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_tuple::<(i64, Uuid)>()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|(count, post_id)| (post_id, count))
            .collect();

        Ok(posts
            .into_iter()
            .map(|model| {
                let post = Post::from(model);
                PostRecord {
                    author_username: authors.get(&post.author_id).cloned().unwrap_or_default(),
                    category: post.category_id.and_then(|id| categories.get(&id).cloned()),
                    location: post.location_id.and_then(|id| locations.get(&id).cloned()),
                    comment_count: comment_counts
                        .get(&post.id)
                        .map(|&n| n.max(0) as u64)
                        .unwrap_or(0),
                    post,
                }
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_records(&self, scope: PostScope) -> Result<Vec<PostRecord>, RepoError> {
        let query = match scope {
            PostScope::All => PostEntity::find(),
            PostScope::ByAuthor(author_id) => {
                PostEntity::find().filter(post::Column::AuthorId.eq(author_id))
            }
            PostScope::InCategory(category_id) => {
                PostEntity::find().filter(post::Column::CategoryId.eq(category_id))
            }
        };

        let posts = query
            .order_by_desc(post::Column::PubDate)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        self.load_records(posts).await
    }

    async fn find_record(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        Ok(self.load_records(vec![model]).await?.pop())
    }

    async fn exists_with_title_text(
        &self,
        title: &str,
        text: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let mut query = PostEntity::find()
            .filter(post::Column::Title.eq(title))
            .filter(post::Column::Text.eq(text));
        if let Some(id) = exclude {
            query = query.filter(post::Column::Id.ne(id));
        }

        let count = query.count(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(count > 0)
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| CommentRecord {
                comment: comment.into(),
                author_username: author.map(|a| a.username).unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

impl LocationRepository for PostgresLocationRepository {}
