//! Typed decoding of key-value hash records

use super::errors::DecodeWarning;
use super::result::{Record, Scalar};
use crate::schema::FieldKind;
use crate::store::FieldMap;

/// Key prefix of a record key (`order` for `order:7`)
pub fn key_prefix(key: &str) -> &str {
    key.split_once(':').map(|(prefix, _)| prefix).unwrap_or(key)
}

/// Decodes one stored value against its declared kind
fn decode_value(raw: &str, kind: FieldKind) -> Option<Scalar> {
    let trimmed = raw.trim();
    match kind {
        FieldKind::Text => Some(Scalar::Text(raw.to_string())),
        FieldKind::Int => match trimmed.parse::<i64>() {
            Ok(i) => Some(Scalar::Int(i)),
            // "3.0" is still an integer
            Err(_) => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| Scalar::Int(f as i64)),
        },
        FieldKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Scalar::Float),
    }
}

/// Decodes every field of the record stored under `key`.
///
/// Fields that fail to decode are kept as raw text and reported.
pub fn decode_fields(key: &str, fields: &FieldMap) -> (Record, Vec<DecodeWarning>) {
    let prefix = key_prefix(key);
    let mut record = Vec::with_capacity(fields.len());
    let mut warnings = Vec::new();

    for (field, raw) in fields {
        let kind = FieldKind::of(prefix, field);
        let value = match decode_value(raw, kind) {
            Some(value) => value,
            None => {
                warnings.push(DecodeWarning {
                    key: key.to_string(),
                    field: field.clone(),
                    raw: raw.clone(),
                    expected: kind,
                });
                Scalar::Text(raw.clone())
            }
        };
        record.push((field.clone(), value));
    }

    (record, warnings)
}
