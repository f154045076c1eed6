use serde::{Deserialize, Serialize};

/// Which forms are shown. Switching never touches form values or results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Simple,
    Developer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Form {
    Evaluation,
    SinglePrediction,
    BatchPrediction,
}

impl ViewMode {
    pub fn from_developer(developer: bool) -> Self {
        if developer {
            ViewMode::Developer
        } else {
            ViewMode::Simple
        }
    }

    pub fn toggle(&mut self) {
        *self = match self {
            ViewMode::Simple => ViewMode::Developer,
            ViewMode::Developer => ViewMode::Simple,
        };
    }

    pub fn is_developer(&self) -> bool {
        matches!(self, ViewMode::Developer)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Simple => "simple",
            ViewMode::Developer => "developer",
        }
    }

    pub fn visible_forms(&self) -> &'static [Form] {
        match self {
            ViewMode::Simple => &[Form::Evaluation],
            ViewMode::Developer => &[Form::SinglePrediction, Form::BatchPrediction],
        }
    }

    pub fn shows(&self, form: Form) -> bool {
        self.visible_forms().contains(&form)
    }
}
