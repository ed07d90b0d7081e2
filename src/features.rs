use serde_json::Value;

use crate::error::PredictError;
use crate::models::InputRecord;
use crate::schema::FeatureSchema;

/// A record projected onto schema order. Values are kept as received so a
/// bad value only surfaces when the predictor asks for numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(&'static str, Value)>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn to_numeric(&self) -> Result<Vec<f64>, PredictError> {
        self.entries
            .iter()
            .map(|(name, value)| {
                coerce_number(value).ok_or_else(|| {
                    PredictError::prediction(format!(
                        "could not convert {name} value {value} to float"
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
impl FromIterator<(&'static str, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (&'static str, f64)>>(iter: I) -> Self {
        FeatureVector {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name, Value::from(value)))
                .collect(),
        }
    }
}

/// Expects a validated record; an absent field becomes `null`.
pub fn build(record: &InputRecord, schema: &FeatureSchema) -> FeatureVector {
    FeatureVector {
        entries: schema
            .fields()
            .iter()
            .map(|field| (*field, record.get(field).cloned().unwrap_or(Value::Null)))
            .collect(),
    }
}

/// JSON numbers and numeric strings; everything else is rejected.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
