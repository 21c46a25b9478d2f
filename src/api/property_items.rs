//! Reassembles property values that the API delivers in pages.
//!
//! Long titles and rich text, people lists, relations and rollup arrays are
//! returned by the property item endpoint as a listing with one element per
//! result. [`materialize`] walks the cursor chain and concatenates the
//! elements, in delivered order, into one value.

use super::responses::{is_listing, PropertyItemListing};
use crate::codec::PropertyCodec;
use crate::error::{AppError, DecodeError};
use crate::model::{PropertyType, PropertyValue, RichText, RollupResult, RollupValue};
use crate::types::PropertyId;
use serde_json::Value;
use std::future::Future;

/// Elements gathered across pages, by property type.
enum Gathered {
    Text(PropertyType, RichText),
    People(Vec<crate::model::User>),
    Relation(Vec<crate::types::PageId>),
    Rollup(Vec<PropertyValue>),
}

impl Gathered {
    fn for_type(ty: PropertyType, property_id: &PropertyId) -> Result<Self, AppError> {
        match ty {
            PropertyType::Title | PropertyType::RichText => {
                Ok(Gathered::Text(ty, RichText::default()))
            }
            PropertyType::People => Ok(Gathered::People(Vec::new())),
            PropertyType::Relation => Ok(Gathered::Relation(Vec::new())),
            PropertyType::Rollup => Ok(Gathered::Rollup(Vec::new())),
            other => Err(AppError::MalformedResponse(format!(
                "Property {} of type '{}' was returned as a listing",
                property_id, other
            ))),
        }
    }

    fn push(&mut self, item: PropertyValue) -> Result<(), DecodeError> {
        match (self, item) {
            (Gathered::Text(_, text), PropertyValue::Title(more))
            | (Gathered::Text(_, text), PropertyValue::RichText(more)) => text.extend(more),
            (Gathered::People(users), PropertyValue::People(more)) => users.extend(more),
            (Gathered::Relation(pages), PropertyValue::Relation { pages: more, .. }) => {
                pages.extend(more)
            }
            (Gathered::Rollup(elements), element) => elements.push(element),
            (gathered, item) => {
                return Err(DecodeError::TypeMismatch {
                    expected: gathered.type_name().to_string(),
                    found: item.property_type().as_str().to_string(),
                })
            }
        }
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        match self {
            Gathered::Text(ty, _) => ty.as_str(),
            Gathered::People(_) => "people",
            Gathered::Relation(_) => "relation",
            Gathered::Rollup(_) => "rollup",
        }
    }
}

/// Resolves a property item response into one complete value.
///
/// A single-value response is decoded directly. A listing is followed by
/// calling `fetch_next` with each page's cursor until `has_more` is false.
/// Elements are appended exactly as delivered: no sorting, no
/// deduplication. There is no page cap of its own; termination is the
/// server's `has_more`, and `fetch_next` may refuse to go further by
/// returning an error.
///
/// For rollups, the aggregate comes from the last page's `property_item`;
/// an array rollup's elements are the concatenated results.
pub async fn materialize<F, Fut>(
    codec: &PropertyCodec,
    property_id: &PropertyId,
    initial_page: Value,
    mut fetch_next: F,
) -> Result<PropertyValue, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Value, AppError>>,
{
    if !is_listing(&initial_page) {
        return Ok(codec.decode(&initial_page)?);
    }

    let mut listing: PropertyItemListing = serde_json::from_value(initial_page)?;
    let ty = PropertyType::from_tag(&listing.property_item.type_tag).ok_or_else(|| {
        DecodeError::UnknownType {
            type_tag: listing.property_item.type_tag.clone(),
        }
    })?;
    let mut gathered = Gathered::for_type(ty, property_id)?;
    let mut pages = 1u32;

    loop {
        for result in &listing.results {
            gathered.push(codec.decode_item(result)?)?;
        }
        log::debug!(
            "Property {} page {}: {} items, has_more={}",
            property_id,
            pages,
            listing.results.len(),
            listing.has_more
        );

        if !listing.has_more {
            break;
        }
        let cursor = listing.next_cursor.take().ok_or_else(|| {
            AppError::MalformedResponse(format!(
                "Property {} listing has more items but no cursor",
                property_id
            ))
        })?;
        let next = fetch_next(cursor).await?;
        listing = serde_json::from_value(next)?;
        pages += 1;
    }

    let value = match gathered {
        Gathered::Text(PropertyType::Title, text) => PropertyValue::Title(text),
        Gathered::Text(_, text) => PropertyValue::RichText(text),
        Gathered::People(users) => PropertyValue::People(users),
        Gathered::Relation(pages) => PropertyValue::Relation {
            pages,
            has_more: false,
        },
        Gathered::Rollup(elements) => {
            let header = listing.property_item.as_property_value();
            let rollup = match codec.decode(&header)? {
                PropertyValue::Rollup(rollup) => rollup,
                other => {
                    return Err(DecodeError::TypeMismatch {
                        expected: "rollup".to_string(),
                        found: other.property_type().as_str().to_string(),
                    }
                    .into())
                }
            };
            PropertyValue::Rollup(match rollup.result {
                RollupResult::Array(_) => RollupValue {
                    function: rollup.function,
                    result: RollupResult::Array(elements),
                },
                _ => rollup,
            })
        }
    };
    Ok(value)
}
