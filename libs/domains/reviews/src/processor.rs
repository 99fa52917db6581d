//! Review processor for the stream worker.
//!
//! One job flows through an explicit sequence: classify, persist,
//! conditionally notify. Only the persist step is guarded by the retry
//! boundary; classification degrades softly and the notification fan-out is
//! best-effort once the review is stored.
//!
//! At-least-once caveat: a lease reclaimed between the store write and the
//! acknowledgement redelivers the job, and the second pass inserts a second
//! review row with identical content. There is no dedup key; the submission
//! layer owns uniqueness if it ever wants it.

use crate::alerts::AlertQueue;
use crate::classify::{Classifier, TAG_CANDIDATES, TAG_SCORE_THRESHOLD};
use crate::models::{Classification, NewReview, Review};
use crate::repository::ReviewStore;
use crate::stream_models::ReviewJob;
use async_trait::async_trait;
use domain_notifications::EmailJob;
use std::sync::Arc;
use stream_worker::{StreamError, StreamProcessor};
use tracing::{debug, info, warn};

/// Processor consuming `ReviewJob`s: classify, persist, conditionally alert.
pub struct ReviewProcessor<S, C, Q>
where
    S: ReviewStore,
    C: Classifier,
    Q: AlertQueue,
{
    store: Arc<S>,
    classifier: Arc<C>,
    alerts: Arc<Q>,
}

impl<S, C, Q> ReviewProcessor<S, C, Q>
where
    S: ReviewStore + 'static,
    C: Classifier + 'static,
    Q: AlertQueue + 'static,
{
    pub fn new(store: S, classifier: C, alerts: Q) -> Self {
        Self {
            store: Arc::new(store),
            classifier: Arc::new(classifier),
            alerts: Arc::new(alerts),
        }
    }

    /// Run one classification pass over the review text.
    ///
    /// Classification must never block review storage: every failure path
    /// collapses to `None` (or to an empty tag set when only tag extraction
    /// failed) and the pipeline carries on.
    async fn classify(&self, text: &str) -> Option<Classification> {
        let sentiment = match self.classifier.classify_sentiment(text).await {
            Ok(Some(sentiment)) => sentiment,
            Ok(None) => {
                warn!("Classification returned no recognizable label, storing review without it");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Sentiment classification failed, storing review without it");
                return None;
            }
        };

        let tags = match self.classifier.extract_tags(text, &TAG_CANDIDATES).await {
            Ok(scores) => scores
                .into_iter()
                .filter(|tag| tag.score > TAG_SCORE_THRESHOLD)
                .map(|tag| tag.label)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Tag extraction failed, keeping sentiment with no tags");
                Vec::new()
            }
        };

        info!(
            sentiment = %sentiment.label,
            score = %sentiment.score,
            tags = ?tags,
            "Classified review text"
        );

        Some(Classification {
            sentiment: sentiment.label,
            score: sentiment.score,
            tags,
        })
    }

    /// Queue the owner alert for a stored negative review.
    ///
    /// Every failure here is soft: the review is already durable, and
    /// retrying the whole job would duplicate it.
    async fn queue_alert(&self, review: &Review) {
        let owner_email = match self.store.find_space_owner_email(review.space_id).await {
            Ok(Some(email)) => email,
            Ok(None) => {
                debug!(space_id = %review.space_id, "No owner email resolvable, skipping alert");
                return;
            }
            Err(e) => {
                warn!(
                    space_id = %review.space_id,
                    error = %e,
                    "Owner email lookup failed, skipping alert"
                );
                return;
            }
        };

        let job = EmailJob::negative_review_alert(
            owner_email.clone(),
            Some(review.name.clone()),
            Some(review.rating),
            review.text.clone(),
            review.sentiment.map(|s| s.to_string()),
            review.tags.clone(),
        );

        match self.alerts.enqueue(&job).await {
            Ok(stream_id) => {
                info!(
                    review_id = %review.id,
                    to = %owner_email,
                    stream_id = %stream_id,
                    "Queued negative review alert"
                );
            }
            Err(e) => {
                warn!(
                    review_id = %review.id,
                    error = %e,
                    "Failed to queue alert email; review is already stored"
                );
            }
        }
    }
}

#[async_trait]
impl<S, C, Q> StreamProcessor<ReviewJob> for ReviewProcessor<S, C, Q>
where
    S: ReviewStore + 'static,
    C: Classifier + 'static,
    Q: AlertQueue + 'static,
{
    async fn process(&self, job: &ReviewJob) -> Result<(), StreamError> {
        info!(
            job_id = %job.id,
            space_id = %job.space_id,
            rating = %job.rating,
            retry_count = %job.retry_count,
            "Processing review job"
        );

        let text = job
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let classification = match text {
            Some(text) => self.classify(text).await,
            None => None,
        };

        // The store write is the job's sole durable side effect; its failure
        // is the only thing that engages the retry policy.
        let review = self
            .store
            .create_review(NewReview {
                space_id: job.space_id,
                name: job.name.clone(),
                email: job.email.clone(),
                rating: job.rating,
                text: text.map(|t| t.to_string()),
                classification,
            })
            .await
            .map_err(|e| StreamError::transient(e.to_string()))?;

        info!(review_id = %review.id, "Review saved");

        if review.is_negative() {
            self.queue_alert(&review).await;
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ReviewProcessor"
    }
}

impl<S, C, Q> Clone for ReviewProcessor<S, C, Q>
where
    S: ReviewStore,
    C: Classifier,
    Q: AlertQueue,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            classifier: Arc::clone(&self.classifier),
            alerts: Arc::clone(&self.alerts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::MockAlertQueue;
    use crate::classify::{ClassifyError, MockClassifier, SentimentScore, TagScore};
    use crate::error::ReviewError;
    use crate::models::Sentiment;
    use crate::repository::MockReviewStore;
    use chrono::Utc;
    use stream_worker::ErrorCategory;
    use uuid::Uuid;

    fn review_from(input: &NewReview) -> Review {
        let (sentiment, sentiment_score, tags) = match &input.classification {
            Some(c) => (Some(c.sentiment), Some(c.score), c.tags.clone()),
            None => (None, None, Vec::new()),
        };

        Review {
            id: Uuid::new_v4(),
            space_id: input.space_id,
            name: input.name.clone(),
            email: input.email.clone(),
            rating: input.rating,
            text: input.text.clone(),
            sentiment,
            sentiment_score,
            tags,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn job_with_text(text: Option<&str>) -> ReviewJob {
        ReviewJob::new(
            Uuid::new_v4(),
            "Ann",
            "a@x.com",
            1,
            text.map(|t| t.to_string()),
        )
    }

    #[tokio::test]
    async fn test_absent_text_skips_classification_entirely() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .withf(|input| input.classification.is_none() && input.text.is_none())
            .returning(|input| Ok(review_from(&input)));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(0);
        classifier.expect_extract_tags().times(0);

        let mut alerts = MockAlertQueue::new();
        alerts.expect_enqueue().times(0);

        let processor = ReviewProcessor::new(store, classifier, alerts);
        processor.process(&job_with_text(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_text_treated_as_absent() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .withf(|input| input.classification.is_none() && input.text.is_none())
            .returning(|input| Ok(review_from(&input)));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(0);

        let processor = ReviewProcessor::new(store, classifier, MockAlertQueue::new());
        processor.process(&job_with_text(Some("   "))).await.unwrap();
    }

    #[tokio::test]
    async fn test_classifier_failure_still_creates_review() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .withf(|input| input.classification.is_none())
            .returning(|input| Ok(review_from(&input)));

        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify_sentiment()
            .times(1)
            .returning(|_| Err(ClassifyError::Http("503 overloaded".to_string())));
        // A failed sentiment call means tags are never requested.
        classifier.expect_extract_tags().times(0);

        let mut alerts = MockAlertQueue::new();
        alerts.expect_enqueue().times(0);

        let processor = ReviewProcessor::new(store, classifier, alerts);
        processor
            .process(&job_with_text(Some("slow delivery")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unrecognizable_label_treated_as_no_classification() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .withf(|input| input.classification.is_none())
            .returning(|input| Ok(review_from(&input)));

        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify_sentiment()
            .times(1)
            .returning(|_| Ok(None));
        classifier.expect_extract_tags().times(0);

        let processor = ReviewProcessor::new(store, classifier, MockAlertQueue::new());
        processor
            .process(&job_with_text(Some("slow delivery")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tag_threshold_is_strictly_greater() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .withf(|input| {
                let classification = input.classification.as_ref().unwrap();
                classification.tags == vec!["quality".to_string(), "delivery".to_string()]
            })
            .returning(|input| Ok(review_from(&input)));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(1).returning(|_| {
            Ok(Some(SentimentScore {
                label: Sentiment::Positive,
                score: 0.8,
            }))
        });
        classifier.expect_extract_tags().times(1).returning(|_, _| {
            Ok(vec![
                TagScore {
                    label: "quality".to_string(),
                    score: 0.5,
                },
                TagScore {
                    label: "delivery".to_string(),
                    score: 0.25,
                },
                TagScore {
                    label: "price".to_string(),
                    score: 0.1,
                },
                // Exactly at the threshold is excluded.
                TagScore {
                    label: "service".to_string(),
                    score: 0.2,
                },
            ])
        });

        let processor = ReviewProcessor::new(store, classifier, MockAlertQueue::new());
        processor
            .process(&job_with_text(Some("great quality, okay delivery")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tag_extraction_failure_keeps_sentiment_with_empty_tags() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .withf(|input| {
                let classification = input.classification.as_ref().unwrap();
                classification.sentiment == Sentiment::Positive && classification.tags.is_empty()
            })
            .returning(|input| Ok(review_from(&input)));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(1).returning(|_| {
            Ok(Some(SentimentScore {
                label: Sentiment::Positive,
                score: 0.97,
            }))
        });
        classifier
            .expect_extract_tags()
            .times(1)
            .returning(|_, _| Err(ClassifyError::Http("timeout".to_string())));

        let processor = ReviewProcessor::new(store, classifier, MockAlertQueue::new());
        processor
            .process(&job_with_text(Some("lovely product")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_is_transient_and_skips_alerting() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .returning(|_| Err(ReviewError::Store("connection lost".to_string())));
        store.expect_find_space_owner_email().times(0);

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(0);

        let mut alerts = MockAlertQueue::new();
        alerts.expect_enqueue().times(0);

        let processor = ReviewProcessor::new(store, classifier, alerts);
        let err = processor.process(&job_with_text(None)).await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Transient);
    }

    #[tokio::test]
    async fn test_negative_review_queues_exactly_one_alert() {
        let space_id = Uuid::new_v4();

        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .returning(|input| Ok(review_from(&input)));
        store
            .expect_find_space_owner_email()
            .times(1)
            .withf(move |id| *id == space_id)
            .returning(|_| Ok(Some("owner@y.com".to_string())));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(1).returning(|_| {
            Ok(Some(SentimentScore {
                label: Sentiment::Negative,
                score: 0.91,
            }))
        });
        classifier.expect_extract_tags().times(1).returning(|_, _| {
            Ok(vec![TagScore {
                label: "packaging".to_string(),
                score: 0.7,
            }])
        });

        let mut alerts = MockAlertQueue::new();
        alerts
            .expect_enqueue()
            .times(1)
            .withf(|job| {
                job.to == "owner@y.com"
                    && job.subject == "Negative Review Alert"
                    && job.name.as_deref() == Some("Ann")
                    && job.rating == Some(1)
                    && job.sentiment.as_deref() == Some("negative")
                    && job.tags == vec!["packaging".to_string()]
            })
            .returning(|_| Ok("1-0".to_string()));

        let mut job = job_with_text(Some("terrible packaging, arrived broken"));
        job.space_id = space_id;

        let processor = ReviewProcessor::new(store, classifier, alerts);
        processor.process(&job).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_negative_sentiment_queues_nothing() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .returning(|input| Ok(review_from(&input)));
        store.expect_find_space_owner_email().times(0);

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(1).returning(|_| {
            Ok(Some(SentimentScore {
                label: Sentiment::Positive,
                score: 0.99,
            }))
        });
        classifier
            .expect_extract_tags()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut alerts = MockAlertQueue::new();
        alerts.expect_enqueue().times(0);

        let processor = ReviewProcessor::new(store, classifier, alerts);
        processor
            .process(&job_with_text(Some("wonderful service")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_owner_email_skips_silently() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .returning(|input| Ok(review_from(&input)));
        store
            .expect_find_space_owner_email()
            .times(1)
            .returning(|_| Ok(None));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(1).returning(|_| {
            Ok(Some(SentimentScore {
                label: Sentiment::Negative,
                score: 0.85,
            }))
        });
        classifier
            .expect_extract_tags()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut alerts = MockAlertQueue::new();
        alerts.expect_enqueue().times(0);

        let processor = ReviewProcessor::new(store, classifier, alerts);
        // No owner email is a valid terminal state, not an error.
        processor
            .process(&job_with_text(Some("awful experience")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_owner_lookup_failure_is_soft() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .returning(|input| Ok(review_from(&input)));
        store
            .expect_find_space_owner_email()
            .times(1)
            .returning(|_| Err(ReviewError::Store("connection lost".to_string())));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(1).returning(|_| {
            Ok(Some(SentimentScore {
                label: Sentiment::Negative,
                score: 0.85,
            }))
        });
        classifier
            .expect_extract_tags()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut alerts = MockAlertQueue::new();
        alerts.expect_enqueue().times(0);

        let processor = ReviewProcessor::new(store, classifier, alerts);
        processor
            .process(&job_with_text(Some("awful experience")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_alert_enqueue_failure_does_not_fail_the_job() {
        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .returning(|input| Ok(review_from(&input)));
        store
            .expect_find_space_owner_email()
            .times(1)
            .returning(|_| Ok(Some("owner@y.com".to_string())));

        let mut classifier = MockClassifier::new();
        classifier.expect_classify_sentiment().times(1).returning(|_| {
            Ok(Some(SentimentScore {
                label: Sentiment::Negative,
                score: 0.85,
            }))
        });
        classifier
            .expect_extract_tags()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut alerts = MockAlertQueue::new();
        alerts
            .expect_enqueue()
            .times(1)
            .returning(|_| Err(StreamError::Internal("stream gone".to_string())));

        let processor = ReviewProcessor::new(store, classifier, alerts);
        // The review is stored; retrying the job would duplicate it.
        processor
            .process(&job_with_text(Some("awful experience")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_end_to_end_negative_review_scenario() {
        let space_id = Uuid::new_v4();

        let mut store = MockReviewStore::new();
        store
            .expect_create_review()
            .times(1)
            .withf(|input| {
                let classification = input.classification.as_ref().unwrap();
                input.name == "Ann"
                    && input.rating == 1
                    && classification.sentiment == Sentiment::Negative
                    && classification.score == 0.91
                    && classification.tags == vec!["packaging".to_string()]
            })
            .returning(|input| Ok(review_from(&input)));
        store
            .expect_find_space_owner_email()
            .times(1)
            .returning(|_| Ok(Some("owner@y.com".to_string())));

        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify_sentiment()
            .times(1)
            .withf(|text| text == "terrible packaging, arrived broken")
            .returning(|_| {
                Ok(Some(SentimentScore {
                    label: Sentiment::Negative,
                    score: 0.91,
                }))
            });
        classifier.expect_extract_tags().times(1).returning(|_, _| {
            Ok(vec![
                TagScore {
                    label: "packaging".to_string(),
                    score: 0.62,
                },
                TagScore {
                    label: "quality".to_string(),
                    score: 0.12,
                },
            ])
        });

        let mut alerts = MockAlertQueue::new();
        alerts
            .expect_enqueue()
            .times(1)
            .withf(|job| job.to == "owner@y.com" && job.subject == "Negative Review Alert")
            .returning(|_| Ok("1-0".to_string()));

        let job = ReviewJob::new(
            space_id,
            "Ann",
            "a@x.com",
            1,
            Some("terrible packaging, arrived broken".to_string()),
        );

        let processor = ReviewProcessor::new(store, classifier, alerts);
        processor.process(&job).await.unwrap();
    }
}
