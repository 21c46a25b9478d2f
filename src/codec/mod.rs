//! Property value decoding and encoding.
//!
//! [`PropertyCodec`] turns raw property JSON into [`PropertyValue`]s and
//! writable values back into update payloads. It holds only the default
//! time zone, so one codec can be shared freely across tasks.

mod dates;
mod decode;
mod encode;

use crate::error::{DecodeError, EncodeError};
use crate::model::{PropertyType, PropertyValue};
use chrono_tz::Tz;
use decode::Decoder;
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyCodec {
    default_zone: Tz,
}

impl Default for PropertyCodec {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl PropertyCodec {
    /// Creates a codec that interprets zone-less dates in `default_zone`.
    pub fn new(default_zone: Tz) -> Self {
        Self { default_zone }
    }

    pub fn default_zone(&self) -> Tz {
        self.default_zone
    }

    /// Decodes one property value (`{"type": T, T: payload, ...}`).
    pub fn decode(&self, raw: &Value) -> Result<PropertyValue, DecodeError> {
        self.decoder().value(raw)
    }

    /// Decodes a value and checks that it has the expected type.
    pub fn decode_as(
        &self,
        expected: PropertyType,
        raw: &Value,
    ) -> Result<PropertyValue, DecodeError> {
        let value = self.decode(raw)?;
        if value.property_type() != expected {
            return Err(DecodeError::TypeMismatch {
                expected: expected.as_str().to_string(),
                found: value.property_type().as_str().to_string(),
            });
        }
        Ok(value)
    }

    /// Decodes a single result of a paginated property item listing.
    pub fn decode_item(&self, raw: &Value) -> Result<PropertyValue, DecodeError> {
        self.decoder().item(raw)
    }

    /// Decodes a page's whole `properties` object.
    pub fn decode_properties(
        &self,
        properties: &Value,
    ) -> Result<IndexMap<String, PropertyValue>, DecodeError> {
        let map = properties
            .as_object()
            .ok_or_else(|| DecodeError::WrongShape {
                property_type: "page".to_string(),
                field: "properties".to_string(),
                expected: "object",
            })?;
        map.iter()
            .map(|(name, raw)| Ok((name.clone(), self.decode(raw)?)))
            .collect()
    }

    /// Encodes a writable value as an update payload.
    ///
    /// Read-only types fail with [`EncodeError::UnsupportedWrite`].
    pub fn encode(&self, value: &PropertyValue) -> Result<Value, EncodeError> {
        encode::encode_value(value)
    }

    /// Encodes a `properties` update object keyed by property name.
    pub fn encode_properties<'a, I>(&self, updates: I) -> Result<Value, EncodeError>
    where
        I: IntoIterator<Item = (&'a str, &'a PropertyValue)>,
    {
        encode::encode_properties(updates)
    }

    fn decoder(&self) -> Decoder {
        Decoder {
            zone: self.default_zone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FormulaValue, RollupResult};
    use serde_json::json;

    #[test]
    fn missing_payload_names_the_field() {
        let err = PropertyCodec::default()
            .decode(&json!({"id": "abc", "type": "number"}))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                property_type: "number".into(),
                field: "number".into()
            }
        );
    }

    #[test]
    fn shape_disagreeing_with_tag_is_rejected() {
        let err = PropertyCodec::default()
            .decode(&json!({"type": "checkbox", "checkbox": "yes"}))
            .unwrap_err();
        assert!(matches!(err, DecodeError::WrongShape { ref field, .. } if field == "checkbox"));
    }

    #[test]
    fn unknown_tag_is_preserved() {
        let err = PropertyCodec::default()
            .decode(&json!({"type": "verification", "verification": {}}))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownType {
                type_tag: "verification".into()
            }
        );
    }

    #[test]
    fn null_select_is_unset_not_missing() {
        let value = PropertyCodec::default()
            .decode(&json!({"type": "select", "select": null}))
            .unwrap();
        assert_eq!(value, PropertyValue::Select(None));
    }

    #[test]
    fn formula_recurses_into_inner_type() {
        let value = PropertyCodec::default()
            .decode(&json!({
                "type": "formula",
                "formula": {"type": "number", "number": 12.5}
            }))
            .unwrap();
        assert_eq!(value, PropertyValue::Formula(FormulaValue::Number(Some(12.5))));
    }

    #[test]
    fn rollup_array_decodes_each_element_by_its_own_tag() {
        let value = PropertyCodec::default()
            .decode(&json!({
                "type": "rollup",
                "rollup": {
                    "type": "array",
                    "function": "show_original",
                    "array": [
                        {"type": "number", "number": 1},
                        {"type": "checkbox", "checkbox": true}
                    ]
                }
            }))
            .unwrap();
        let PropertyValue::Rollup(rollup) = value else {
            panic!("expected rollup");
        };
        assert_eq!(
            rollup.result,
            RollupResult::Array(vec![
                PropertyValue::Number(Some(1.0)),
                PropertyValue::Checkbox(true)
            ])
        );
    }

    #[test]
    fn decode_as_checks_type() {
        let err = PropertyCodec::default()
            .decode_as(PropertyType::Title, &json!({"type": "url", "url": null}))
            .unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { .. }));
    }

    #[test]
    fn properties_decode_by_name() {
        let decoded = PropertyCodec::default()
            .decode_properties(&json!({
                "Zeta": {"id": "z", "type": "checkbox", "checkbox": false},
                "Alpha": {"id": "a", "type": "number", "number": 2}
            }))
            .unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded["Zeta"], PropertyValue::Checkbox(false));
        assert_eq!(decoded["Alpha"], PropertyValue::Number(Some(2.0)));
    }

    #[test]
    fn read_only_types_refuse_to_encode() {
        let err = PropertyCodec::default()
            .encode(&PropertyValue::Formula(FormulaValue::Boolean(Some(true))))
            .unwrap_err();
        assert_eq!(
            err,
            EncodeError::UnsupportedWrite {
                property_type: "formula".into()
            }
        );
    }
}
