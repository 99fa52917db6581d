//! Hugging Face inference API classifier.
//!
//! Sentiment via an SST-2 fine-tuned DistilBERT endpoint, topic tags via a
//! BART-MNLI zero-shot endpoint. Any non-2xx, timeout, or unparseable body
//! surfaces as an error; the caller decides how to degrade.

use super::{ClassifyError, ClassifyResult, Classifier, SentimentScore, TagScore};
use crate::models::Sentiment;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_SENTIMENT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/distilbert/distilbert-base-uncased-finetuned-sst-2-english";
const DEFAULT_TAG_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli";

/// Hugging Face API configuration.
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// API token, sent as a bearer credential.
    pub api_key: String,
    /// Sentiment model endpoint.
    pub sentiment_model_url: String,
    /// Zero-shot tag model endpoint.
    pub tag_model_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl HuggingFaceConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            sentiment_model_url: DEFAULT_SENTIMENT_MODEL_URL.to_string(),
            tag_model_url: DEFAULT_TAG_MODEL_URL.to_string(),
            timeout_secs: 15,
        }
    }

    /// Load configuration from environment variables:
    /// - `HF_API_KEY` (required)
    /// - `HF_SENTIMENT_MODEL_URL`, `HF_TAG_MODEL_URL` (optional overrides)
    pub fn from_env() -> ClassifyResult<Self> {
        let api_key = std::env::var("HF_API_KEY")
            .map_err(|_| ClassifyError::Config("HF_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);

        if let Ok(url) = std::env::var("HF_SENTIMENT_MODEL_URL") {
            config.sentiment_model_url = url;
        }
        if let Ok(url) = std::env::var("HF_TAG_MODEL_URL") {
            config.tag_model_url = url;
        }

        Ok(config)
    }
}

/// Classifier backed by the Hugging Face inference API.
pub struct HuggingFaceClassifier {
    config: HuggingFaceConfig,
    client: Client,
}

impl HuggingFaceClassifier {
    pub fn new(config: HuggingFaceConfig) -> ClassifyResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> ClassifyResult<Self> {
        Self::new(HuggingFaceConfig::from_env()?)
    }
}

// Hugging Face request/response structures

#[derive(Debug, Serialize)]
struct HfTextRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Serialize)]
struct HfZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: HfZeroShotParams,
}

#[derive(Debug, Serialize)]
struct HfZeroShotParams {
    candidate_labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct HfLabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct HfZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

/// The sentiment endpoint answers `[[{label, score}, ...]]`, best first.
fn best_label(response: Vec<Vec<HfLabelScore>>) -> Option<HfLabelScore> {
    response.into_iter().next()?.into_iter().next()
}

/// Pair up the zero-shot endpoint's parallel label/score arrays.
fn zip_tag_scores(response: HfZeroShotResponse) -> Vec<TagScore> {
    response
        .labels
        .into_iter()
        .zip(response.scores)
        .map(|(label, score)| TagScore { label, score })
        .collect()
}

#[async_trait]
impl Classifier for HuggingFaceClassifier {
    async fn classify_sentiment(&self, text: &str) -> ClassifyResult<Option<SentimentScore>> {
        debug!(model = %self.config.sentiment_model_url, "Requesting sentiment classification");

        let response = self
            .client
            .post(&self.config.sentiment_model_url)
            .bearer_auth(&self.config.api_key)
            .json(&HfTextRequest { inputs: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Http(format!("{}: {}", status, body)));
        }

        let parsed: Vec<Vec<HfLabelScore>> = response
            .json()
            .await
            .map_err(|e| ClassifyError::UnexpectedResponse(e.to_string()))?;

        let Some(best) = best_label(parsed) else {
            return Err(ClassifyError::UnexpectedResponse(
                "empty sentiment response".to_string(),
            ));
        };

        // An unrecognizable label is not an error: the service answered,
        // it just has nothing the pipeline can use.
        match best.label.parse::<Sentiment>() {
            Ok(label) => Ok(Some(SentimentScore {
                label,
                score: best.score,
            })),
            Err(_) => {
                debug!(label = %best.label, "Unrecognized sentiment label");
                Ok(None)
            }
        }
    }

    async fn extract_tags(
        &self,
        text: &str,
        candidate_labels: &[&'static str],
    ) -> ClassifyResult<Vec<TagScore>> {
        debug!(model = %self.config.tag_model_url, "Requesting tag extraction");

        let request = HfZeroShotRequest {
            inputs: text,
            parameters: HfZeroShotParams {
                candidate_labels: candidate_labels.iter().map(|s| s.to_string()).collect(),
            },
        };

        let response = self
            .client
            .post(&self.config.tag_model_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Http(format!("{}: {}", status, body)));
        }

        let parsed: HfZeroShotResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::UnexpectedResponse(e.to_string()))?;

        Ok(zip_tag_scores(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_label_takes_first_of_first() {
        let response = vec![vec![
            HfLabelScore {
                label: "NEGATIVE".to_string(),
                score: 0.91,
            },
            HfLabelScore {
                label: "POSITIVE".to_string(),
                score: 0.09,
            },
        ]];

        let best = best_label(response).unwrap();
        assert_eq!(best.label, "NEGATIVE");
        assert_eq!(best.score, 0.91);
    }

    #[test]
    fn test_best_label_empty_response() {
        assert!(best_label(vec![]).is_none());
        assert!(best_label(vec![vec![]]).is_none());
    }

    #[test]
    fn test_sentiment_response_json_shape() {
        // The endpoint nests one candidate list per input.
        let json = r#"[[{"label": "NEGATIVE", "score": 0.91}]]"#;
        let parsed: Vec<Vec<HfLabelScore>> = serde_json::from_str(json).unwrap();

        let best = best_label(parsed).unwrap();
        assert_eq!(best.label.parse::<Sentiment>().unwrap(), Sentiment::Negative);
    }

    #[test]
    fn test_zip_tag_scores_pairs_arrays() {
        let response = HfZeroShotResponse {
            labels: vec![
                "quality".to_string(),
                "delivery".to_string(),
                "price".to_string(),
            ],
            scores: vec![0.5, 0.25, 0.1],
        };

        let tags = zip_tag_scores(response);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].label, "quality");
        assert_eq!(tags[0].score, 0.5);
        assert_eq!(tags[2].label, "price");
    }

    #[test]
    fn test_zero_shot_request_wire_format() {
        let request = HfZeroShotRequest {
            inputs: "terrible packaging",
            parameters: HfZeroShotParams {
                candidate_labels: vec!["quality".to_string(), "packaging".to_string()],
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["inputs"], "terrible packaging");
        assert_eq!(value["parameters"]["candidate_labels"][1], "packaging");
    }
}
