use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ChurnError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "Logistic Regression")]
    LogisticRegression,
    #[serde(rename = "Random Forest")]
    RandomForest,
    #[serde(rename = "XGBoost")]
    XgBoost,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::XgBoost => "XGBoost",
        }
    }

    pub fn all() -> &'static [ModelKind] {
        &[
            ModelKind::LogisticRegression,
            ModelKind::RandomForest,
            ModelKind::XgBoost,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Accuracy => "Accuracy",
            Metric::Precision => "Precision",
            Metric::Recall => "Recall",
        }
    }

    pub fn all() -> &'static [Metric] {
        &[Metric::Accuracy, Metric::Precision, Metric::Recall]
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Accepts the display label or a squashed form ("random-forest", "xgboost").
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for ModelKind {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        ModelKind::all()
            .iter()
            .copied()
            .find(|m| squash(m.label()) == wanted)
            .ok_or_else(|| ChurnError::UnknownValue {
                kind: "model",
                value: s.to_string(),
            })
    }
}

impl FromStr for Metric {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        Metric::all()
            .iter()
            .copied()
            .find(|m| squash(m.label()) == wanted)
            .ok_or_else(|| ChurnError::UnknownValue {
                kind: "metric",
                value: s.to_string(),
            })
    }
}

/// Body of `POST /churn/evaluate/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub model: ModelKind,
    pub metric: Metric,
}
