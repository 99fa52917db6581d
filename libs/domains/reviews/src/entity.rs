use crate::models::{Classification, NewReview, Review, Sentiment};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

/// Sea-ORM entity for the reviews table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub space_id: Uuid,
    pub name: String,
    pub email: String,
    pub rating: i16,
    #[sea_orm(column_type = "Text", nullable)]
    pub text: Option<String>,
    pub sentiment: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub sentiment_score: Option<f64>,
    pub tags: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Review {
    fn from(model: Model) -> Self {
        let tags = model
            .tags
            .and_then(|json| serde_json::from_value::<Vec<String>>(json).ok())
            .unwrap_or_default();

        Self {
            id: model.id,
            space_id: model.space_id,
            name: model.name,
            email: model.email,
            rating: model.rating,
            text: model.text,
            sentiment: model.sentiment.and_then(|s| s.parse::<Sentiment>().ok()),
            sentiment_score: model.sentiment_score,
            tags,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<NewReview> for ActiveModel {
    fn from(input: NewReview) -> Self {
        let now = chrono::Utc::now();

        // The three derived columns are written together from one
        // classification pass, or not at all.
        let (sentiment, sentiment_score, tags) = match input.classification {
            Some(Classification {
                sentiment,
                score,
                tags,
            }) => (
                Some(sentiment.to_string()),
                Some(score),
                Some(serde_json::json!(tags)),
            ),
            None => (None, None, None),
        };

        ActiveModel {
            id: Set(Uuid::now_v7()),
            space_id: Set(input.space_id),
            name: Set(input.name),
            email: Set(input.email),
            rating: Set(input.rating),
            text: Set(input.text),
            sentiment: Set(sentiment),
            sentiment_score: Set(sentiment_score),
            tags: Set(tags),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    fn new_review(classification: Option<Classification>) -> NewReview {
        NewReview {
            space_id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            rating: 1,
            text: Some("terrible packaging".to_string()),
            classification,
        }
    }

    #[test]
    fn test_classified_review_sets_all_three_columns() {
        let active: ActiveModel = new_review(Some(Classification {
            sentiment: Sentiment::Negative,
            score: 0.91,
            tags: vec!["packaging".to_string()],
        }))
        .into();

        assert_eq!(
            active.sentiment,
            ActiveValue::Set(Some("negative".to_string()))
        );
        assert_eq!(active.sentiment_score, ActiveValue::Set(Some(0.91)));
        assert_eq!(
            active.tags,
            ActiveValue::Set(Some(serde_json::json!(["packaging"])))
        );
    }

    #[test]
    fn test_unclassified_review_leaves_all_three_absent()  {
        let active: ActiveModel = new_review(None).into();

        assert_eq!(active.sentiment, ActiveValue::Set(None));
        assert_eq!(active.sentiment_score, ActiveValue::Set(None));
        assert_eq!(active.tags, ActiveValue::Set(None));
    }

    #[test]
    fn test_model_with_unknown_sentiment_maps_to_none() {
        let model = Model {
            id: Uuid::new_v4(),
            space_id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            rating: 3,
            text: None,
            sentiment: Some("enthusiastic".to_string()),
            sentiment_score: Some(0.5),
            tags: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };

        let review: Review = model.into();
        assert!(review.sentiment.is_none());
        assert!(review.tags.is_empty());
    }
}
