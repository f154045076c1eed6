use std::time::Duration;

use async_trait::async_trait;
use churn_core::{
    BatchFile, BatchResult, ChurnError, EvaluationRequest, EvaluationResult, FeatureVector,
    PredictionResult, Result, ServiceConfig,
};
use reqwest::multipart;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::ChurnApi;

const EVALUATE_PATH: &str = "/churn/evaluate/";
const PREDICT_PATH: &str = "/churn/predict/";
const PREDICT_LIST_PATH: &str = "/churn/predict_list/";

/// reqwest-backed client for the churn service
#[derive(Debug, Clone)]
pub struct ChurnClient {
    host: String,
    client: reqwest::Client,
}

impl ChurnClient {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ChurnError::Config(e.to_string()))?;

        Ok(Self {
            host: config.host.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ChurnError::Http(e.to_string()))?;

        let parsed = serde_json::from_str::<Value>(&body);

        if let Ok(value) = &parsed {
            if let Some(message) = error_envelope(value) {
                return Err(ChurnError::Service(message));
            }
        }

        if !status.is_success() {
            return Err(ChurnError::Service(format!(
                "{} - {}",
                status,
                snippet(&body)
            )));
        }

        parsed.map_err(|e| {
            ChurnError::Decode(format!(
                "{} - Body: {}",
                e,
                snippet(&body)
            ))
        })
    }
}

#[async_trait]
impl ChurnApi for ChurnClient {
    #[instrument(skip(self), fields(host = %self.host))]
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult> {
        let resp = self
            .client
            .post(self.url(EVALUATE_PATH))
            .json(request)
            .send()
            .await
            .map_err(|e| ChurnError::Http(e.to_string()))?;

        let value = Self::read_json(resp).await?;
        debug!("Evaluation payload: {}", value);
        Ok(EvaluationResult(value))
    }

    #[instrument(skip_all, fields(host = %self.host))]
    async fn predict(&self, features: &FeatureVector) -> Result<PredictionResult> {
        let resp = self
            .client
            .post(self.url(PREDICT_PATH))
            .json(features)
            .send()
            .await
            .map_err(|e| ChurnError::Http(e.to_string()))?;

        let value = Self::read_json(resp).await?;
        parse_prediction(value)
    }

    #[instrument(skip_all, fields(host = %self.host, file = %file.file_name))]
    async fn predict_list(&self, file: &BatchFile) -> Result<BatchResult> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str("text/csv")
            .map_err(|e| ChurnError::Http(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(self.url(PREDICT_LIST_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChurnError::Http(e.to_string()))?;

        let value = Self::read_json(resp).await?;
        parse_batch(value)
    }
}

const SNIPPET_CHARS: usize = 500;

/// Leading part of a response body for error messages, cut on a char boundary
fn snippet(body: &str) -> &str {
    match body.char_indices().nth(SNIPPET_CHARS) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

/// `{"error": "..."}` is how the service reports failures, sometimes with a 200
fn error_envelope(value: &Value) -> Option<String> {
    value.get("error")?.as_str().map(str::to_string)
}

fn prediction_flag(value: &Value) -> Option<bool> {
    match value.get("prediction")? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

pub(crate) fn parse_prediction(value: Value) -> Result<PredictionResult> {
    let churn = prediction_flag(&value)
        .ok_or_else(|| ChurnError::Decode(format!("missing 'prediction' in {}", value)))?;
    Ok(PredictionResult::new(churn, value))
}

pub(crate) fn parse_batch(value: Value) -> Result<BatchResult> {
    let Some(Value::Array(rows)) = value.get("predictions") else {
        return Err(ChurnError::Decode(format!(
            "missing 'predictions' list in {}",
            value
        )));
    };

    let predictions = rows
        .iter()
        .cloned()
        .map(parse_prediction)
        .collect::<Result<Vec<_>>>()?;

    Ok(BatchResult { predictions })
}
