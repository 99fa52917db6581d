//! Email processor for the stream worker.
//!
//! Implements `StreamProcessor<EmailJob>`: validates the job, renders the
//! alert body, and dispatches through the configured provider.

use crate::models::EmailJob;
use crate::providers::{EmailContent, EmailProvider};
use crate::templates::{ReviewAlertData, TemplateEngine};
use async_trait::async_trait;
use std::sync::Arc;
use stream_worker::{StreamError, StreamProcessor};
use tracing::info;

/// Email processor: render and send.
pub struct EmailProcessor<P: EmailProvider> {
    provider: Arc<P>,
    templates: Arc<TemplateEngine>,
}

impl<P: EmailProvider + 'static> EmailProcessor<P> {
    pub fn new(provider: P, templates: TemplateEngine) -> Self {
        Self {
            provider: Arc::new(provider),
            templates: Arc::new(templates),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: EmailProvider + 'static> StreamProcessor<EmailJob> for EmailProcessor<P> {
    async fn process(&self, job: &EmailJob) -> Result<(), StreamError> {
        info!(
            job_id = %job.id,
            to = %job.to,
            retry_count = %job.retry_count,
            "Processing email job"
        );

        // A job without a recipient or subject can never be delivered;
        // fail it without engaging the retry policy.
        if job.to.trim().is_empty() {
            return Err(StreamError::permanent("missing recipient"));
        }
        if job.subject.trim().is_empty() {
            return Err(StreamError::permanent("missing subject"));
        }

        let body = self
            .templates
            .render_review_alert(&ReviewAlertData::from_job(job))
            .map_err(|e| StreamError::permanent(e.to_string()))?;

        let email = EmailContent {
            to_email: job.to.clone(),
            to_name: job.name.clone().unwrap_or_default(),
            subject: job.subject.clone(),
            text_body: body,
        };

        // Transport failures are retryable under the job's fixed backoff.
        let result = self
            .provider
            .send(&email)
            .await
            .map_err(|e| StreamError::transient(e.to_string()))?;

        info!(
            job_id = %job.id,
            to = %job.to,
            message_id = ?result.message_id,
            "Successfully sent email"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "EmailProcessor"
    }

    async fn health_check(&self) -> Result<bool, StreamError> {
        self.provider
            .health_check()
            .await
            .map_err(|e| StreamError::transient(e.to_string()))
    }
}

impl<P: EmailProvider> Clone for EmailProcessor<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            templates: Arc::clone(&self.templates),
        }
    }
}
