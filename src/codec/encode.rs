//! Write payloads for the writable property types.

use crate::error::EncodeError;
use crate::model::{
    Annotations, FileObject, FileSource, NotionDate, PropertyValue, RichText, RichTextKind,
    SelectOption, User,
};
use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

/// Encodes a value as `{ "type": T, T: payload }`.
pub(crate) fn encode_value(value: &PropertyValue) -> Result<Value, EncodeError> {
    let ty = value.property_type();
    if !ty.is_writable() {
        return Err(EncodeError::UnsupportedWrite {
            property_type: ty.as_str().to_string(),
        });
    }

    let payload = match value {
        PropertyValue::Title(text) | PropertyValue::RichText(text) => rich_text(text),
        PropertyValue::Number(number) => match number {
            Some(n) if !n.is_finite() => {
                return Err(EncodeError::InvalidValue {
                    property_type: ty.as_str().to_string(),
                    reason: format!("{} is not representable in JSON", n),
                })
            }
            Some(n) => self::number(*n),
            None => Value::Null,
        },
        PropertyValue::Checkbox(checked) => json!(checked),
        PropertyValue::Select(option) | PropertyValue::Status(option) => {
            option.as_ref().map(select_option).unwrap_or(Value::Null)
        }
        PropertyValue::MultiSelect(options) => {
            Value::Array(options.iter().map(select_option).collect())
        }
        PropertyValue::Date(date) => date.as_ref().map(date_payload).unwrap_or(Value::Null),
        PropertyValue::People(users) => Value::Array(users.iter().map(user_reference).collect()),
        PropertyValue::Files(files) => Value::Array(files.iter().map(file).collect()),
        PropertyValue::Relation { pages, has_more } => {
            if *has_more {
                return Err(EncodeError::InvalidValue {
                    property_type: ty.as_str().to_string(),
                    reason: "relation list is partial; writing it would drop the remaining pages"
                        .to_string(),
                });
            }
            Value::Array(
                pages
                    .iter()
                    .map(|page| json!({ "id": page.to_dashed() }))
                    .collect(),
            )
        }
        PropertyValue::Url(s) | PropertyValue::Email(s) | PropertyValue::PhoneNumber(s) => {
            s.as_ref().map(|s| json!(s)).unwrap_or(Value::Null)
        }
        PropertyValue::Formula(_)
        | PropertyValue::Rollup(_)
        | PropertyValue::CreatedTime(_)
        | PropertyValue::CreatedBy(_)
        | PropertyValue::LastEditedTime(_)
        | PropertyValue::LastEditedBy(_)
        | PropertyValue::UniqueId { .. } => {
            return Err(EncodeError::UnsupportedWrite {
                property_type: ty.as_str().to_string(),
            })
        }
    };

    let mut envelope = Map::new();
    envelope.insert("type".to_string(), json!(ty.as_str()));
    envelope.insert(ty.as_str().to_string(), payload);
    Ok(Value::Object(envelope))
}

fn rich_text(text: &RichText) -> Value {
    Value::Array(
        text.runs()
            .iter()
            .map(|run| {
                let (tag, body) = match &run.kind {
                    RichTextKind::Text { content, link } => (
                        "text",
                        json!({
                            "content": content,
                            "link": link.as_ref().map(|url| json!({ "url": url })),
                        }),
                    ),
                    RichTextKind::Mention {
                        mention_type,
                        payload,
                    } => {
                        let mut mention = Map::new();
                        mention.insert("type".to_string(), json!(mention_type));
                        mention.insert(mention_type.clone(), payload.clone());
                        ("mention", Value::Object(mention))
                    }
                    RichTextKind::Equation { expression } => {
                        ("equation", json!({ "expression": expression }))
                    }
                };
                let mut object = Map::new();
                object.insert("type".to_string(), json!(tag));
                object.insert(tag.to_string(), body);
                object.insert("annotations".to_string(), annotations(&run.annotations));
                Value::Object(object)
            })
            .collect(),
    )
}

/// Whole numbers go out as JSON integers, the way the server sends them.
fn number(n: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        json!(n as i64)
    } else {
        json!(n)
    }
}

fn annotations(annotations: &Annotations) -> Value {
    json!({
        "bold": annotations.bold,
        "code": annotations.code,
        "color": annotations.color.as_str(),
        "italic": annotations.italic,
        "strikethrough": annotations.strikethrough,
        "underline": annotations.underline,
    })
}

fn select_option(option: &SelectOption) -> Value {
    let mut object = Map::new();
    if let Some(id) = &option.id {
        object.insert("id".to_string(), json!(id));
    }
    object.insert("name".to_string(), json!(option.name));
    if let Some(color) = option.color {
        object.insert("color".to_string(), json!(color.as_str()));
    }
    Value::Object(object)
}

fn date_payload(date: &NotionDate) -> Value {
    json!({
        "start": date.start_format.render(date.start()),
        "end": date.end().map(|end| date.end_format.render(end)),
        "time_zone": date.time_zone.map(|tz| tz.name().to_string()),
    })
}

fn user_reference(user: &User) -> Value {
    json!({ "object": "user", "id": user.id.to_dashed() })
}

fn file(file: &FileObject) -> Value {
    match &file.source {
        FileSource::External { url } => json!({
            "name": file.name,
            "type": "external",
            "external": { "url": url },
        }),
        FileSource::Hosted { url, expiry_time } => json!({
            "name": file.name,
            "type": "file",
            "file": {
                "url": url,
                "expiry_time": expiry_time
                    .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            },
        }),
    }
}

/// Encodes a full `properties` map for a page update, keyed by property name.
pub(crate) fn encode_properties<'a, I>(updates: I) -> Result<Value, EncodeError>
where
    I: IntoIterator<Item = (&'a str, &'a PropertyValue)>,
{
    let mut properties = Map::new();
    for (name, value) in updates {
        properties.insert(name.to_string(), encode_value(value)?);
    }
    Ok(Value::Object(properties))
}
