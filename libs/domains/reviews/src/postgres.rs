//! PostgreSQL implementation of the review store.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use uuid::Uuid;

use crate::entity;
use crate::error::ReviewResult;
use crate::models::{NewReview, Review};
use crate::repository::ReviewStore;

pub struct PgReviewStore {
    db: DatabaseConnection,
}

impl PgReviewStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn create_review(&self, input: NewReview) -> ReviewResult<Review> {
        let active_model: entity::ActiveModel = input.into();

        let model = active_model.insert(&self.db).await?;

        tracing::info!(review_id = %model.id, space_id = %model.space_id, "Created review");
        Ok(model.into())
    }

    async fn find_space_owner_email(&self, space_id: Uuid) -> ReviewResult<Option<String>> {
        // Spaces and users are owned by the web application; a join is the
        // pipeline's only contact with them.
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT u.email AS email
               FROM spaces s
               JOIN users u ON u.id = s.owner_id
               WHERE s.id = $1"#,
            [space_id.into()],
        );

        let row = self.db.query_one(statement).await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<String>("", "email")?)),
            None => Ok(None),
        }
    }
}
