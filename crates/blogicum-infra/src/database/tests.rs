#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::database::entity::{category, comment, location, post, user};
    use crate::database::postgres_repo::{
        PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
    };
    use blogicum_core::domain::{Category, Post};
    use blogicum_core::error::RepoError;
    use blogicum_core::ports::{
        BaseRepository, CategoryRepository, CommentRepository, PostRepository, PostScope,
    };
    use sea_orm::{DatabaseBackend, DbConn, MockDatabase, MockExecResult, Value};

    fn post_model(id: uuid::Uuid, title: &str) -> post::Model {
        let now = chrono::Utc::now();
        post::Model {
            id,
            author_id: uuid::Uuid::new_v4(),
            title: title.to_owned(),
            text: "Text".to_owned(),
            pub_date: now.into(),
            is_published: true,
            category_id: None,
            location_id: None,
            image: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn user_model(id: uuid::Uuid, username: &str) -> user::Model {
        let now = chrono::Utc::now();
        user::Model {
            id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn comment_model(post_id: uuid::Uuid, author_id: uuid::Uuid, text: &str) -> comment::Model {
        comment::Model {
            id: uuid::Uuid::new_v4(),
            post_id,
            author_id,
            text: text.to_owned(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn count_row(post_id: uuid::Uuid, count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("comment_count", Value::from(count)),
            ("post_id", Value::from(post_id)),
        ])
    }

    fn shared(db: DbConn) -> Arc<DbConn> {
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let post_id = uuid::Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![post_model(post_id, "Test Post")]])
            .into_connection();

        let repo = PostgresPostRepository::new(shared(db));

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        let post = result.unwrap();
        assert_eq!(post.title, "Test Post");
        assert_eq!(post.id, post_id);
        assert!(post.category_id.is_none());
    }

    #[tokio::test]
    async fn test_save_returns_stored_row() {
        let post_id = uuid::Uuid::new_v4();
        let stored = post_model(post_id, "Saved");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let repo = PostgresPostRepository::new(shared(db));
        let post: Post = stored.into();

        let saved: Post = repo.save(post).await.unwrap();

        assert_eq!(saved.id, post_id);
        assert_eq!(saved.title, "Saved");
    }

    #[tokio::test]
    async fn test_delete_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(shared(db));

        let result = BaseRepository::<Post, uuid::Uuid>::delete(&repo, uuid::Uuid::new_v4()).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_find_records_joins_relations_and_counts_comments() {
        let now = chrono::Utc::now();
        let author_id = uuid::Uuid::new_v4();
        let category_id = uuid::Uuid::new_v4();
        let location_id = uuid::Uuid::new_v4();

        let mut with_comments = post_model(uuid::Uuid::new_v4(), "Busy");
        with_comments.author_id = author_id;
        with_comments.category_id = Some(category_id);
        with_comments.location_id = Some(location_id);
        let mut quiet = post_model(uuid::Uuid::new_v4(), "Quiet");
        quiet.author_id = author_id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![with_comments.clone(), quiet.clone()]])
            .append_query_results(vec![vec![user_model(author_id, "leo")]])
            .append_query_results(vec![vec![category::Model {
                id: category_id,
                title: "Travel".to_owned(),
                description: "Trips".to_owned(),
                slug: "travel".to_owned(),
                is_published: true,
                created_at: now.into(),
            }]])
            .append_query_results(vec![vec![location::Model {
                id: location_id,
                name: "Lisbon".to_owned(),
                is_published: true,
                created_at: now.into(),
            }]])
            .append_query_results(vec![vec![count_row(with_comments.id, 3)]])
            .into_connection();

        let repo = PostgresPostRepository::new(shared(db));

        let records = repo.find_records(PostScope::All).await.unwrap();

        assert_eq!(records.len(), 2);
        let busy = records.iter().find(|r| r.post.id == with_comments.id).unwrap();
        assert_eq!(busy.author_username, "leo");
        assert_eq!(busy.comment_count, 3);
        assert_eq!(busy.category.as_ref().unwrap().slug, "travel");
        assert_eq!(busy.location.as_ref().unwrap().name, "Lisbon");

        let calm = records.iter().find(|r| r.post.id == quiet.id).unwrap();
        assert_eq!(calm.comment_count, 0);
        assert!(calm.category.is_none());
        assert!(calm.location.is_none());
    }

    #[tokio::test]
    async fn test_find_record_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<post::Model>::new()])
            .into_connection();

        let repo = PostgresPostRepository::new(shared(db));

        assert!(repo.find_record(uuid::Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comments_by_post_are_oldest_first() {
        let post_id = uuid::Uuid::new_v4();
        let author = user_model(uuid::Uuid::new_v4(), "reader");
        let first = comment_model(post_id, author.id, "first");
        let second = comment_model(post_id, author.id, "second");

        let db = shared(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results(vec![vec![
                    (first, Some(author.clone())),
                    (second, Some(author.clone())),
                ]])
                .into_connection(),
        );

        let repo = PostgresCommentRepository::new(Arc::clone(&db));
        let comments = repo.find_by_post(post_id).await.unwrap();

        let texts: Vec<&str> = comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(comments[0].author_username, "reader");
        assert!(comments.iter().all(|c| c.comment.post_id == post_id));

        drop(repo);
        let log = Arc::try_unwrap(db)
            .ok()
            .expect("repository released the pool")
            .into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains(r#"ORDER BY \"comments\".\"created_at\" ASC"#));
    }

    #[tokio::test]
    async fn test_find_category_by_slug() {
        let now = chrono::Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![category::Model {
                id: uuid::Uuid::new_v4(),
                title: "Travel".to_owned(),
                description: "Trips".to_owned(),
                slug: "travel".to_owned(),
                is_published: false,
                created_at: now.into(),
            }]])
            .append_query_results(vec![Vec::<category::Model>::new()])
            .into_connection();

        let repo = PostgresCategoryRepository::new(shared(db));

        let found: Option<Category> = repo.find_by_slug("travel").await.unwrap();
        let found = found.unwrap();
        assert_eq!(found.slug, "travel");
        assert!(!found.is_published);

        assert!(repo.find_by_slug("missing").await.unwrap().is_none());
    }
}
