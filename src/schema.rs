pub const FEATURES: [&str; 5] = [
    "module_count",
    "total_study_duration",
    "avg_study_per_module",
    "avg_completion_ratio",
    "avg_submission_rating",
];

/// Ordered feature names the classifier was trained with. Positional: the
/// predictor never sees names, only values in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    fields: &'static [&'static str],
}

impl FeatureSchema {
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(&FEATURES)
    }
}
