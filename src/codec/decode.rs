//! Recursive-descent decoding keyed on the `type` tag.
//!
//! Every property payload is `{ "type": T, T: payload }`. Formula and rollup
//! payloads nest the same shape one level down, so the decoder recurses
//! through [`Decoder::value`] for their inner values.

use super::dates::{parse_bound, parse_timestamp};
use crate::error::DecodeError;
use crate::model::{
    Annotations, DateSpan, FileObject, FileSource, FormulaValue, NotionDate, PropertyType,
    PropertyValue, RichText, RichTextKind, RichTextRun, RollupFunction, RollupResult, RollupValue,
    SelectOption, User, UserKind,
};
use crate::types::{Color, PageId, UserId};
use chrono_tz::Tz;
use serde_json::{Map, Value};

pub(crate) struct Decoder {
    pub zone: Tz,
}

impl Decoder {
    /// Decodes a full property value.
    pub fn value(&self, raw: &Value) -> Result<PropertyValue, DecodeError> {
        let (ty, payload) = self.tagged(raw)?;
        self.payload(ty, payload, raw)
    }

    /// Decodes one result of a paginated property item listing.
    ///
    /// List-valued types deliver one element per item there (a single text
    /// run, user or relation reference); those are wrapped into one-element
    /// values. Everything else has the ordinary shape.
    pub fn item(&self, raw: &Value) -> Result<PropertyValue, DecodeError> {
        let (ty, payload) = self.tagged(raw)?;
        if !payload.is_object() {
            return self.payload(ty, payload, raw);
        }
        match ty {
            PropertyType::Title => Ok(PropertyValue::Title(RichText::new(vec![
                self.run(ty, payload)?
            ]))),
            PropertyType::RichText => Ok(PropertyValue::RichText(RichText::new(vec![
                self.run(ty, payload)?
            ]))),
            PropertyType::People => Ok(PropertyValue::People(vec![self.user(ty, payload)?])),
            PropertyType::Relation => Ok(PropertyValue::Relation {
                pages: vec![self.relation_ref(payload)?],
                has_more: false,
            }),
            _ => self.payload(ty, payload, raw),
        }
    }

    fn tagged<'a>(&self, raw: &'a Value) -> Result<(PropertyType, &'a Value), DecodeError> {
        let tag = match raw.get("type") {
            Some(Value::String(tag)) => tag,
            Some(_) => return Err(wrong_shape("property", "type", "string")),
            None => return Err(missing("property", "type")),
        };
        let ty = PropertyType::from_tag(tag).ok_or_else(|| DecodeError::UnknownType {
            type_tag: tag.clone(),
        })?;
        let payload = raw.get(tag).ok_or_else(|| missing(tag, tag))?;
        Ok((ty, payload))
    }

    fn payload(
        &self,
        ty: PropertyType,
        payload: &Value,
        raw: &Value,
    ) -> Result<PropertyValue, DecodeError> {
        let tag = ty.as_str();
        let value = match ty {
            PropertyType::Title => PropertyValue::Title(self.rich_text(ty, payload)?),
            PropertyType::RichText => PropertyValue::RichText(self.rich_text(ty, payload)?),
            PropertyType::Number => PropertyValue::Number(opt_number(tag, tag, payload)?),
            PropertyType::Checkbox => PropertyValue::Checkbox(
                payload
                    .as_bool()
                    .ok_or_else(|| wrong_shape(tag, tag, "boolean"))?,
            ),
            PropertyType::Select => PropertyValue::Select(self.opt_option(ty, payload)?),
            PropertyType::Status => PropertyValue::Status(self.opt_option(ty, payload)?),
            PropertyType::MultiSelect => PropertyValue::MultiSelect(
                array(tag, tag, payload)?
                    .iter()
                    .map(|option| self.option(ty, option))
                    .collect::<Result<_, _>>()?,
            ),
            PropertyType::Date => PropertyValue::Date(self.opt_date(tag, payload)?),
            PropertyType::People => PropertyValue::People(
                array(tag, tag, payload)?
                    .iter()
                    .map(|user| self.user(ty, user))
                    .collect::<Result<_, _>>()?,
            ),
            PropertyType::Files => PropertyValue::Files(
                array(tag, tag, payload)?
                    .iter()
                    .map(|file| self.file(file))
                    .collect::<Result<_, _>>()?,
            ),
            PropertyType::Relation => PropertyValue::Relation {
                pages: array(tag, tag, payload)?
                    .iter()
                    .map(|reference| self.relation_ref(reference))
                    .collect::<Result<_, _>>()?,
                has_more: raw
                    .get("has_more")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            PropertyType::Formula => PropertyValue::Formula(self.formula(payload)?),
            PropertyType::Rollup => PropertyValue::Rollup(self.rollup(payload)?),
            PropertyType::CreatedTime | PropertyType::LastEditedTime => {
                let raw_ts = payload
                    .as_str()
                    .ok_or_else(|| wrong_shape(tag, tag, "timestamp string"))?;
                let ts = parse_timestamp(tag, raw_ts)?;
                if ty == PropertyType::CreatedTime {
                    PropertyValue::CreatedTime(ts)
                } else {
                    PropertyValue::LastEditedTime(ts)
                }
            }
            PropertyType::CreatedBy => PropertyValue::CreatedBy(self.user(ty, payload)?),
            PropertyType::LastEditedBy => PropertyValue::LastEditedBy(self.user(ty, payload)?),
            PropertyType::Url => PropertyValue::Url(opt_string(tag, tag, payload)?),
            PropertyType::Email => PropertyValue::Email(opt_string(tag, tag, payload)?),
            PropertyType::PhoneNumber => {
                PropertyValue::PhoneNumber(opt_string(tag, tag, payload)?)
            }
            PropertyType::UniqueId => {
                let object = object(tag, tag, payload)?;
                let number = object
                    .get("number")
                    .ok_or_else(|| missing(tag, "number"))?
                    .as_u64()
                    .ok_or_else(|| wrong_shape(tag, "number", "non-negative integer"))?;
                PropertyValue::UniqueId {
                    prefix: opt_string(
                        tag,
                        "prefix",
                        object.get("prefix").unwrap_or(&Value::Null),
                    )?,
                    number,
                }
            }
        };
        Ok(value)
    }

    fn rich_text(&self, ty: PropertyType, payload: &Value) -> Result<RichText, DecodeError> {
        array(ty.as_str(), ty.as_str(), payload)?
            .iter()
            .map(|run| self.run(ty, run))
            .collect()
    }

    fn run(&self, ty: PropertyType, raw: &Value) -> Result<RichTextRun, DecodeError> {
        let tag = ty.as_str();
        let run = object(tag, tag, raw)?;
        let kind_tag = required_str(tag, "type", run.get("type"))?;
        let body = object(tag, kind_tag, run.get(kind_tag).ok_or_else(|| missing(tag, kind_tag))?)?;

        let (kind, fallback_text) = match kind_tag {
            "text" => {
                let content = required_str(tag, "text.content", body.get("content"))?.to_string();
                let link = match body.get("link") {
                    None | Some(Value::Null) => None,
                    Some(link) => Some(
                        required_str(tag, "text.link.url", link.get("url"))?.to_string(),
                    ),
                };
                let fallback = content.clone();
                (RichTextKind::Text { content, link }, fallback)
            }
            "mention" => {
                let mention_type = required_str(tag, "mention.type", body.get("type"))?.to_string();
                let payload = body.get(&mention_type).cloned().unwrap_or(Value::Null);
                (
                    RichTextKind::Mention {
                        mention_type,
                        payload,
                    },
                    String::new(),
                )
            }
            "equation" => {
                let expression =
                    required_str(tag, "equation.expression", body.get("expression"))?.to_string();
                let fallback = expression.clone();
                (RichTextKind::Equation { expression }, fallback)
            }
            _ => return Err(wrong_shape(tag, "type", "text, mention or equation")),
        };

        let href = match run.get("href") {
            Some(Value::String(href)) => Some(href.clone()),
            _ => match &kind {
                RichTextKind::Text { link, .. } => link.clone(),
                _ => None,
            },
        };

        Ok(RichTextRun {
            kind,
            annotations: match run.get("annotations") {
                None | Some(Value::Null) => Annotations::default(),
                Some(raw) => annotations(tag, raw)?,
            },
            plain_text: run
                .get("plain_text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(fallback_text),
            href,
        })
    }

    fn opt_option(
        &self,
        ty: PropertyType,
        payload: &Value,
    ) -> Result<Option<SelectOption>, DecodeError> {
        if payload.is_null() {
            return Ok(None);
        }
        self.option(ty, payload).map(Some)
    }

    fn option(&self, ty: PropertyType, raw: &Value) -> Result<SelectOption, DecodeError> {
        let tag = ty.as_str();
        let option = object(tag, tag, raw)?;
        Ok(SelectOption {
            id: opt_string(tag, "id", option.get("id").unwrap_or(&Value::Null))?,
            name: required_str(tag, "name", option.get("name"))?.to_string(),
            color: match option.get("color") {
                None | Some(Value::Null) => None,
                Some(raw) => Some(color(tag, raw)?),
            },
        })
    }

    pub(crate) fn opt_date(
        &self,
        tag: &str,
        payload: &Value,
    ) -> Result<Option<NotionDate>, DecodeError> {
        if payload.is_null() {
            return Ok(None);
        }
        let date = object(tag, "date", payload)?;

        let time_zone = match date.get("time_zone") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.parse::<Tz>().map_err(|_| {
                DecodeError::InvalidTimeZone {
                    field: format!("{}.time_zone", tag),
                    value: name.clone(),
                }
            })?),
            Some(_) => return Err(wrong_shape(tag, "time_zone", "string")),
        };
        let zone = time_zone.unwrap_or(self.zone);

        let start_raw = required_str(tag, "start", date.get("start"))?;
        let start = parse_bound(&format!("{}.start", tag), start_raw, zone)?;

        let (span, end_format) = match date.get("end") {
            None | Some(Value::Null) => (DateSpan::Instant(start.value), start.format),
            Some(Value::String(end_raw)) => {
                let end = parse_bound(&format!("{}.end", tag), end_raw, zone)?;
                let span = DateSpan::Interval {
                    start: start.value,
                    end: end.value,
                };
                (span, end.format)
            }
            Some(_) => return Err(wrong_shape(tag, "end", "string or null")),
        };

        Ok(Some(NotionDate {
            span,
            time_zone,
            start_format: start.format,
            end_format,
        }))
    }

    fn user(&self, ty: PropertyType, raw: &Value) -> Result<User, DecodeError> {
        let tag = ty.as_str();
        let user = object(tag, tag, raw)?;
        let id_raw = required_str(tag, "id", user.get("id"))?;
        let id = UserId::parse(id_raw).map_err(|_| DecodeError::InvalidId {
            field: format!("{}.id", tag),
            value: id_raw.to_string(),
        })?;

        let email = user
            .get("person")
            .and_then(|person| person.get("email"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(User {
            id,
            name: opt_string(tag, "name", user.get("name").unwrap_or(&Value::Null))?,
            avatar_url: opt_string(
                tag,
                "avatar_url",
                user.get("avatar_url").unwrap_or(&Value::Null),
            )?,
            email,
            kind: match user.get("type").and_then(Value::as_str) {
                Some("person") => Some(UserKind::Person),
                Some("bot") => Some(UserKind::Bot),
                _ => None,
            },
        })
    }

    fn file(&self, raw: &Value) -> Result<FileObject, DecodeError> {
        const TAG: &str = "files";
        let file = object(TAG, TAG, raw)?;
        let name = required_str(TAG, "name", file.get("name"))?.to_string();
        let source = match required_str(TAG, "type", file.get("type"))? {
            "external" => FileSource::External {
                url: required_str(
                    TAG,
                    "external.url",
                    file.get("external").and_then(|e| e.get("url")),
                )?
                .to_string(),
            },
            "file" => {
                let hosted = file.get("file").ok_or_else(|| missing(TAG, "file"))?;
                let hosted = object(TAG, "file", hosted)?;
                FileSource::Hosted {
                    url: required_str(TAG, "file.url", hosted.get("url"))?.to_string(),
                    expiry_time: match hosted.get("expiry_time").and_then(Value::as_str) {
                        Some(raw_ts) => Some(parse_timestamp("files.file.expiry_time", raw_ts)?),
                        None => None,
                    },
                }
            }
            _ => return Err(wrong_shape(TAG, "type", "external or file")),
        };
        Ok(FileObject { name, source })
    }

    fn relation_ref(&self, raw: &Value) -> Result<PageId, DecodeError> {
        let id_raw = required_str("relation", "id", raw.get("id"))?;
        PageId::parse(id_raw).map_err(|_| DecodeError::InvalidId {
            field: "relation.id".to_string(),
            value: id_raw.to_string(),
        })
    }

    fn formula(&self, payload: &Value) -> Result<FormulaValue, DecodeError> {
        const TAG: &str = "formula";
        let inner_tag = required_str(TAG, "type", payload.get("type"))?;
        let inner = payload
            .get(inner_tag)
            .ok_or_else(|| missing(TAG, inner_tag))?;
        let value = match inner_tag {
            "string" => FormulaValue::String(opt_string(TAG, "string", inner)?),
            "number" => FormulaValue::Number(opt_number(TAG, "number", inner)?),
            "boolean" => FormulaValue::Boolean(if inner.is_null() {
                None
            } else {
                Some(
                    inner
                        .as_bool()
                        .ok_or_else(|| wrong_shape(TAG, "boolean", "boolean"))?,
                )
            }),
            "date" => FormulaValue::Date(self.opt_date("formula.date", inner)?),
            other => {
                return Err(DecodeError::UnknownType {
                    type_tag: format!("formula.{}", other),
                })
            }
        };
        Ok(value)
    }

    fn rollup(&self, payload: &Value) -> Result<RollupValue, DecodeError> {
        const TAG: &str = "rollup";
        let function =
            RollupFunction::from_wire(required_str(TAG, "function", payload.get("function"))?);
        let inner_tag = required_str(TAG, "type", payload.get("type"))?;

        let result = match inner_tag {
            "number" => RollupResult::Number(opt_number(
                TAG,
                "number",
                payload.get("number").ok_or_else(|| missing(TAG, "number"))?,
            )?),
            "date" => RollupResult::Date(self.opt_date(
                "rollup.date",
                payload.get("date").ok_or_else(|| missing(TAG, "date"))?,
            )?),
            "array" => RollupResult::Array(
                array(TAG, "array", payload.get("array").ok_or_else(|| missing(TAG, "array"))?)?
                    .iter()
                    .map(|element| self.value(element))
                    .collect::<Result<_, _>>()?,
            ),
            "incomplete" => RollupResult::Incomplete,
            "unsupported" => {
                log::warn!(
                    "Rollup function '{}' has no structural result in the API",
                    function
                );
                RollupResult::Unsupported
            }
            other => {
                return Err(DecodeError::UnknownType {
                    type_tag: format!("rollup.{}", other),
                })
            }
        };

        Ok(RollupValue { function, result })
    }
}

fn annotations(tag: &str, raw: &Value) -> Result<Annotations, DecodeError> {
    let flag = |name: &str| raw.get(name).and_then(Value::as_bool).unwrap_or(false);
    Ok(Annotations {
        bold: flag("bold"),
        italic: flag("italic"),
        strikethrough: flag("strikethrough"),
        underline: flag("underline"),
        code: flag("code"),
        color: match raw.get("color") {
            None | Some(Value::Null) => Color::Default,
            Some(raw) => color(tag, raw)?,
        },
    })
}

fn color(tag: &str, raw: &Value) -> Result<Color, DecodeError> {
    raw.as_str()
        .and_then(|name| name.parse().ok())
        .ok_or_else(|| wrong_shape(tag, "color", "a Notion color name"))
}

fn missing(property_type: &str, field: &str) -> DecodeError {
    DecodeError::MissingField {
        property_type: property_type.to_string(),
        field: field.to_string(),
    }
}

fn wrong_shape(property_type: &str, field: &str, expected: &'static str) -> DecodeError {
    DecodeError::WrongShape {
        property_type: property_type.to_string(),
        field: field.to_string(),
        expected,
    }
}

fn object<'a>(
    tag: &str,
    field: &str,
    raw: &'a Value,
) -> Result<&'a Map<String, Value>, DecodeError> {
    raw.as_object().ok_or_else(|| wrong_shape(tag, field, "object"))
}

fn array<'a>(tag: &str, field: &str, raw: &'a Value) -> Result<&'a Vec<Value>, DecodeError> {
    raw.as_array().ok_or_else(|| wrong_shape(tag, field, "array"))
}

fn required_str<'a>(
    tag: &str,
    field: &str,
    raw: Option<&'a Value>,
) -> Result<&'a str, DecodeError> {
    match raw {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(wrong_shape(tag, field, "string")),
        None => Err(missing(tag, field)),
    }
}

fn opt_string(tag: &str, field: &str, raw: &Value) -> Result<Option<String>, DecodeError> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(wrong_shape(tag, field, "string or null")),
    }
}

fn opt_number(tag: &str, field: &str, raw: &Value) -> Result<Option<f64>, DecodeError> {
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| wrong_shape(tag, field, "finite number")),
        _ => Err(wrong_shape(tag, field, "number or null")),
    }
}
