use crate::error::ValidationError;
use crate::features::coerce_number;
use crate::models::InputRecord;
use crate::schema::FeatureSchema;

/// Presence check over the schema, in schema order. `index` is the record's
/// position in a batch and `None` for single requests.
pub fn validate(
    record: &InputRecord,
    schema: &FeatureSchema,
    index: Option<usize>,
) -> Result<(), ValidationError> {
    for field in schema.fields() {
        if !record.contains(field) {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
                index,
            });
        }
    }
    Ok(())
}

/// Presence plus a numeric check on every feature.
pub fn validate_strict(
    record: &InputRecord,
    schema: &FeatureSchema,
    index: Option<usize>,
) -> Result<(), ValidationError> {
    validate(record, schema, index)?;

    for field in schema.fields() {
        let numeric = record.get(field).and_then(coerce_number);
        if numeric.is_none() {
            return Err(ValidationError::NotNumeric {
                field: field.to_string(),
                index,
            });
        }
    }
    Ok(())
}
