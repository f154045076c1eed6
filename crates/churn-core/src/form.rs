use crate::{
    BatchFile, EvaluationRequest, FeatureKey, FeatureVector, Metric, ModelKind, Result,
    ValidationError,
};

/// Everything the user has typed or picked so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub features: FeatureVector,
    pub model: Option<ModelKind>,
    pub metric: Option<Metric>,
    pub file: Option<BatchFile>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_feature_field(&mut self, key: FeatureKey, value: impl Into<String>) {
        self.features.set(key, value);
    }

    pub fn feature(&self, key: FeatureKey) -> &str {
        self.features.get(key)
    }

    pub fn set_model(&mut self, model: Option<ModelKind>) {
        self.model = model;
    }

    pub fn set_metric(&mut self, metric: Option<Metric>) {
        self.metric = metric;
    }

    pub fn set_file(&mut self, file: Option<BatchFile>) {
        self.file = file;
    }

    pub fn evaluation_request(&self) -> Result<EvaluationRequest> {
        let model = self.model.ok_or(ValidationError::MissingModel)?;
        let metric = self.metric.ok_or(ValidationError::MissingMetric)?;
        Ok(EvaluationRequest { model, metric })
    }

    pub fn batch_file(&self) -> Result<&BatchFile> {
        Ok(self.file.as_ref().ok_or(ValidationError::MissingFile)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChurnError;

    #[test]
    fn test_evaluation_request_requires_both() {
        let mut form = FormState::new();
        assert!(matches!(
            form.evaluation_request(),
            Err(ChurnError::Validation(ValidationError::MissingModel))
        ));

        form.set_model(Some(ModelKind::XgBoost));
        assert!(matches!(
            form.evaluation_request(),
            Err(ChurnError::Validation(ValidationError::MissingMetric))
        ));

        form.set_metric(Some(Metric::Precision));
        let req = form.evaluation_request().unwrap();
        assert_eq!(req.model, ModelKind::XgBoost);
        assert_eq!(req.metric, Metric::Precision);

        form.set_model(None);
        assert!(form.evaluation_request().is_err());
    }

    #[test]
    fn test_setters_are_independent() {
        let mut a = FormState::new();
        a.set_model(Some(ModelKind::RandomForest));
        a.set_feature_field(FeatureKey::AreaCode, "415");
        a.set_metric(Some(Metric::Recall));

        let mut b = FormState::new();
        b.set_metric(Some(Metric::Recall));
        b.set_feature_field(FeatureKey::AreaCode, "415");
        b.set_model(Some(ModelKind::RandomForest));

        assert_eq!(a, b);
        assert_eq!(a.feature(FeatureKey::AreaCode), "415");
        assert!(a.file.is_none());
    }

    #[test]
    fn test_batch_file_required() {
        let mut form = FormState::new();
        assert!(form.batch_file().unwrap_err().is_validation());
        form.set_file(Some(BatchFile::new("x.csv", "a\n1\n")));
        assert_eq!(form.batch_file().unwrap().file_name, "x.csv");
    }
}
