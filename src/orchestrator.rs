use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PredictError, Result, ValidationError};
use crate::features;
use crate::insight;
use crate::models::{BatchRequest, InputRecord, PredictionOutput, PredictionResult};
use crate::predictor::Predictor;
use crate::schema::FeatureSchema;
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Batch,
}

impl Mode {
    fn label(self) -> &'static str {
        match self {
            Mode::Single => "single",
            Mode::Batch => "batch",
        }
    }
}

/// Runs validate -> build -> predict -> insight for every record. A batch
/// either succeeds as a whole or fails on its first bad record.
#[derive(Clone)]
pub struct Orchestrator {
    predictor: Arc<dyn Predictor>,
    schema: FeatureSchema,
    strict: bool,
}

impl Orchestrator {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor,
            schema: FeatureSchema::default(),
            strict: false,
        }
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Interprets a parsed JSON body. Single mode takes exactly one object,
    /// batch mode a non-empty array of objects.
    pub fn parse_request(&self, body: Value, mode: Mode) -> Result<BatchRequest> {
        match (body, mode) {
            (Value::Object(map), Mode::Single) => Ok(BatchRequest::Single(map.into())),
            (Value::Array(items), Mode::Batch) if !items.is_empty() => {
                let records = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => Ok(InputRecord::new(map)),
                        _ => Err(ValidationError::expected_list()),
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(BatchRequest::Batch(records))
            }
            (_, Mode::Batch) => Err(ValidationError::expected_list().into()),
            (_, Mode::Single) => Err(ValidationError::expected_object().into()),
        }
    }

    pub fn run(&self, request: &BatchRequest) -> Result<PredictionOutput> {
        debug!(size = request.len(), "running prediction");
        match request {
            BatchRequest::Single(record) => {
                let mut results = self.run_records(std::slice::from_ref(record), Mode::Single)?;
                let result = results
                    .pop()
                    .ok_or_else(|| PredictError::Internal("no result for single record".into()))?;
                Ok(PredictionOutput::Single(result))
            }
            BatchRequest::Batch(records) => {
                if records.is_empty() {
                    return Err(ValidationError::expected_list().into());
                }
                Ok(PredictionOutput::Batch(self.run_records(records, Mode::Batch)?))
            }
        }
    }

    fn run_records(&self, records: &[InputRecord], mode: Mode) -> Result<Vec<PredictionResult>> {
        // Every record is validated before the predictor sees any of them.
        for (idx, record) in records.iter().enumerate() {
            let index = match mode {
                Mode::Single => None,
                Mode::Batch => Some(idx),
            };
            let outcome = if self.strict {
                validate::validate_strict(record, &self.schema, index)
            } else {
                validate::validate(record, &self.schema, index)
            };
            if let Err(err) = outcome {
                warn!(mode = mode.label(), error = %err, "rejecting request");
                return Err(err.into());
            }
        }

        let mut results = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let vector = features::build(record, &self.schema);
            let label = self.predictor.predict(&vector).map_err(|err| {
                warn!(mode = mode.label(), item = idx, error = %err, "prediction failed");
                err
            })?;
            let entry = insight::lookup(&label);

            results.push(PredictionResult {
                user_id: record.user_id().cloned(),
                label,
                description: entry.description,
                suggestions: entry.suggestions,
            });
        }

        Ok(results)
    }
}
