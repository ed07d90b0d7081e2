use serde::Serialize;
use serde_json::{Map, Value};

pub const USER_ID_FIELD: &str = "user_id";

/// One learner's activity metrics as received from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    fields: Map<String, Value>,
}

impl InputRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn user_id(&self) -> Option<&Value> {
        self.fields.get(USER_ID_FIELD)
    }
}

impl From<Map<String, Value>> for InputRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchRequest {
    Single(InputRecord),
    Batch(Vec<InputRecord>),
}

impl BatchRequest {
    pub fn len(&self) -> usize {
        match self {
            BatchRequest::Single(_) => 1,
            BatchRequest::Batch(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub user_id: Option<Value>,
    pub label: String,
    pub description: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutput {
    Single(PredictionResult),
    Batch(Vec<PredictionResult>),
}

impl PredictionOutput {
    pub fn results(&self) -> &[PredictionResult] {
        match self {
            PredictionOutput::Single(result) => std::slice::from_ref(result),
            PredictionOutput::Batch(results) => results,
        }
    }
}

/// Response body for single-record requests.
#[derive(Debug, Serialize)]
pub struct SingleResponse<'a> {
    pub gaya_belajar: &'a str,
    pub insight: &'a str,
}

/// Response element for batch requests.
#[derive(Debug, Serialize)]
pub struct BatchItemResponse<'a> {
    pub user_id: Option<&'a Value>,
    pub gaya_belajar: &'a str,
    pub deskripsi: &'a str,
    pub saran: &'a [String],
}

impl<'a> From<&'a PredictionResult> for SingleResponse<'a> {
    fn from(result: &'a PredictionResult) -> Self {
        SingleResponse {
            gaya_belajar: &result.label,
            insight: &result.description,
        }
    }
}

impl<'a> From<&'a PredictionResult> for BatchItemResponse<'a> {
    fn from(result: &'a PredictionResult) -> Self {
        BatchItemResponse {
            user_id: result.user_id.as_ref(),
            gaya_belajar: &result.label,
            deskripsi: &result.description,
            saran: &result.suggestions,
        }
    }
}
