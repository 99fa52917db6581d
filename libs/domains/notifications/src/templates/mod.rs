//! Email template rendering.
//!
//! Handlebars-based rendering for the plaintext alert body. Absent review
//! fields are substituted with literal placeholders before rendering, so the
//! template itself stays free of conditionals.

use crate::error::NotificationResult;
use crate::models::EmailJob;
use handlebars::Handlebars;
use serde::Serialize;

const REVIEW_ALERT_TEXT_TEMPLATE: &str = "\
Hello {{greeting}},

A new negative review was submitted for your space.

Reviewer: {{reviewer}}
Rating: {{rating}}
Comment: {{comment}}
Sentiment: {{sentiment}}
Tags: {{tags}}

Please log in to your dashboard to review further.
";

/// Template data for the negative-review alert, with placeholders already
/// applied.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewAlertData {
    pub greeting: String,
    pub reviewer: String,
    pub rating: String,
    pub comment: String,
    pub sentiment: String,
    pub tags: String,
}

impl ReviewAlertData {
    /// Build template data from a job, substituting placeholders for absent
    /// fields.
    pub fn from_job(job: &EmailJob) -> Self {
        let name = job
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.to_string());

        Self {
            greeting: name.clone().unwrap_or_else(|| "Owner".to_string()),
            reviewer: name.unwrap_or_else(|| "N/A".to_string()),
            rating: job
                .rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            comment: job
                .text
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "No comment".to_string()),
            sentiment: job
                .sentiment
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            tags: if job.tags.is_empty() {
                "None".to_string()
            } else {
                job.tags.join(", ")
            },
        }
    }
}

/// Template engine with the alert template registered.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();

        handlebars.register_template_string("review_alert_text", REVIEW_ALERT_TEXT_TEMPLATE)?;

        Ok(Self { handlebars })
    }

    /// Render the plaintext negative-review alert body.
    pub fn render_review_alert(&self, data: &ReviewAlertData) -> NotificationResult<String> {
        Ok(self.handlebars.render("review_alert_text", data)?)
    }
}
