use async_trait::async_trait;
use churn_core::{
    BatchFile, BatchResult, EvaluationRequest, EvaluationResult, FeatureVector, PredictionResult,
    Result,
};

/// The three calls the prediction service answers
#[async_trait]
pub trait ChurnApi: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult>;

    async fn predict(&self, features: &FeatureVector) -> Result<PredictionResult>;

    async fn predict_list(&self, file: &BatchFile) -> Result<BatchResult>;
}
