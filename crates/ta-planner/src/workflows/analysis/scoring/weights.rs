use serde::{Deserialize, Serialize};

/// Coefficients and thresholds of the need-score formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedWeights {
    pub pupil_premium: f64,
    pub looked_after: f64,
    pub sen_needs_multiplier: f64,
    pub eal: f64,
    pub reading_threshold: f64,
    pub reading_score: f64,
    pub spelling_threshold: f64,
    pub spelling_score: f64,
    pub boxall: f64,
    pub medical_info: f64,
    pub stage_support: f64,
}

impl Default for NeedWeights {
    fn default() -> Self {
        Self {
            pupil_premium: 2.0,
            looked_after: 3.0,
            sen_needs_multiplier: 3.0,
            eal: 1.0,
            reading_threshold: 85.0,
            reading_score: 2.0,
            spelling_threshold: 85.0,
            spelling_score: 2.0,
            boxall: 2.0,
            medical_info: 1.0,
            stage_support: 1.0,
        }
    }
}

impl NeedWeights {
    pub fn coefficients(&self) -> [(&'static str, f64); 11] {
        [
            ("pupil_premium", self.pupil_premium),
            ("looked_after", self.looked_after),
            ("sen_needs_multiplier", self.sen_needs_multiplier),
            ("eal", self.eal),
            ("reading_threshold", self.reading_threshold),
            ("reading_score", self.reading_score),
            ("spelling_threshold", self.spelling_threshold),
            ("spelling_score", self.spelling_score),
            ("boxall", self.boxall),
            ("medical_info", self.medical_info),
            ("stage_support", self.stage_support),
        ]
    }

    /// Every coefficient must be finite and non-negative.
    pub fn validate(&self) -> Result<(), WeightingError> {
        for (field, value) in self.coefficients() {
            if !value.is_finite() {
                return Err(WeightingError::NotFinite { field });
            }
            if value < 0.0 {
                return Err(WeightingError::Negative { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightingError {
    #[error("weighting '{field}' must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("weighting '{field}' must be a finite number")]
    NotFinite { field: &'static str },
    #[error("weighting config name must not be blank")]
    BlankName,
}
