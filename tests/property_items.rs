// tests/property_items.rs
//! Reassembling paginated property items.

mod common;

use common::{dashed, page_id, ScriptedTransport};
use notion_dbkit::{
    materialize, AppError, DecodeError, NotionSession, PageId, PropertyCodec, PropertyId,
    PropertyValue, RollupFunction, RollupResult,
};
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::{json, Value};
use std::cell::RefCell;

fn relation_item(n: u32) -> Value {
    json!({
        "object": "property_item",
        "id": "rel1",
        "type": "relation",
        "relation": {"id": dashed(&page_id(n))}
    })
}

fn relation_listing(items: &[u32], next_cursor: Option<&str>) -> Value {
    json!({
        "object": "list",
        "results": items.iter().map(|n| relation_item(*n)).collect::<Vec<_>>(),
        "next_cursor": next_cursor,
        "has_more": next_cursor.is_some(),
        "type": "property_item",
        "property_item": {"id": "rel1", "next_url": null, "type": "relation", "relation": {}}
    })
}

fn text_item(content: &str) -> Value {
    json!({
        "object": "property_item",
        "id": "title",
        "type": "title",
        "title": {
            "type": "text",
            "text": {"content": content, "link": null},
            "annotations": {
                "bold": false, "italic": false, "strikethrough": false,
                "underline": false, "code": false, "color": "default"
            },
            "plain_text": content,
            "href": null
        }
    })
}

fn property_id(raw: &str) -> PropertyId {
    PropertyId::new(raw).unwrap()
}

#[tokio::test]
async fn single_value_needs_no_further_requests() {
    let value = materialize(
        &PropertyCodec::default(),
        &property_id("num"),
        json!({"object": "property_item", "id": "num", "type": "number", "number": 7}),
        |_cursor| async { Err::<Value, _>(AppError::MalformedResponse("unexpected".into())) },
    )
    .await
    .unwrap();

    assert_eq!(value, PropertyValue::Number(Some(7.0)));
}

#[tokio::test]
async fn pages_concatenate_in_delivered_order() {
    let cursors = RefCell::new(Vec::new());
    let value = materialize(
        &PropertyCodec::default(),
        &property_id("rel1"),
        relation_listing(&[5, 2], Some("p2")),
        |cursor| {
            cursors.borrow_mut().push(cursor.clone());
            let page = match cursor.as_str() {
                "p2" => relation_listing(&[2, 9], Some("p3")),
                _ => relation_listing(&[1], None),
            };
            async move { Ok(page) }
        },
    )
    .await
    .unwrap();

    assert_eq!(cursors.into_inner(), vec!["p2".to_string(), "p3".to_string()]);
    let PropertyValue::Relation { pages, has_more } = value else {
        panic!("expected relation");
    };
    assert!(!has_more);
    let ids: Vec<String> = pages.iter().map(|p| p.as_str().to_string()).collect();
    assert_eq!(
        ids,
        vec![page_id(5), page_id(2), page_id(2), page_id(9), page_id(1)]
    );
}

#[tokio::test]
async fn long_titles_are_rejoined() {
    let listing = json!({
        "object": "list",
        "results": [text_item("Quarterly "), text_item("planning "), text_item("notes")],
        "next_cursor": null,
        "has_more": false,
        "type": "property_item",
        "property_item": {"id": "title", "next_url": null, "type": "title", "title": {}}
    });

    let value = materialize(&PropertyCodec::default(), &property_id("title"), listing, |_| async {
        Err::<Value, _>(AppError::MalformedResponse("unexpected".into()))
    })
    .await
    .unwrap();

    assert_eq!(value.display_text(), "Quarterly planning notes");
    assert!(matches!(value, PropertyValue::Title(ref text) if text.len() == 3));
}

#[tokio::test]
async fn rollup_array_collects_elements_and_keeps_function() {
    let first = json!({
        "object": "list",
        "results": [
            {"object": "property_item", "id": "rl", "type": "number", "number": 3},
            {"object": "property_item", "id": "rl", "type": "number", "number": 1}
        ],
        "next_cursor": "more",
        "has_more": true,
        "type": "property_item",
        "property_item": {
            "id": "rl", "next_url": "https://api.notion.com/v1/pages/x/properties/rl?start_cursor=more",
            "type": "rollup",
            "rollup": {"type": "array", "array": [], "function": "show_original"}
        }
    });
    let last = json!({
        "object": "list",
        "results": [{"object": "property_item", "id": "rl", "type": "number", "number": 3}],
        "next_cursor": null,
        "has_more": false,
        "type": "property_item",
        "property_item": {
            "id": "rl", "next_url": null,
            "type": "rollup",
            "rollup": {"type": "array", "array": [], "function": "show_original"}
        }
    });

    let value = materialize(&PropertyCodec::default(), &property_id("rl"), first, move |_| {
        let page = last.clone();
        async move { Ok(page) }
    })
    .await
    .unwrap();

    let PropertyValue::Rollup(rollup) = value else {
        panic!("expected rollup");
    };
    assert_eq!(rollup.function, RollupFunction::ShowOriginal);
    assert_eq!(
        rollup.result,
        RollupResult::Array(vec![
            PropertyValue::Number(Some(3.0)),
            PropertyValue::Number(Some(1.0)),
            PropertyValue::Number(Some(3.0))
        ])
    );
}

#[tokio::test]
async fn mixed_item_types_are_a_decode_failure() {
    let mut listing = relation_listing(&[1], None);
    listing["results"] = json!([text_item("stray")]);

    let err = materialize(&PropertyCodec::default(), &property_id("rel1"), listing, |_| async {
        Err::<Value, _>(AppError::MalformedResponse("unexpected".into()))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Decode(DecodeError::TypeMismatch { .. })));
}

#[tokio::test]
async fn has_more_without_cursor_is_malformed() {
    let mut listing = relation_listing(&[1], None);
    listing["has_more"] = json!(true);

    let err = materialize(&PropertyCodec::default(), &property_id("rel1"), listing, |_| async {
        Err::<Value, _>(AppError::MalformedResponse("fetch_next must not run".into()))
    })
    .await
    .unwrap_err();

    assert!(
        matches!(err, AppError::MalformedResponse(ref msg) if msg.contains("no cursor")),
        "unexpected error: {}",
        err
    );
}

#[tokio::test]
async fn session_follows_start_cursor_on_the_property_endpoint() {
    let transport = ScriptedTransport::new()
        .ok(relation_listing(&[1, 2], Some("abc+/=")))
        .ok(relation_listing(&[3], None));
    let session = NotionSession::new(transport, PropertyCodec::default());
    let page = PageId::parse(&page_id(42)).unwrap();

    let value = session
        .retrieve_property(&page, &property_id("rel1"))
        .await
        .unwrap();

    let PropertyValue::Relation { pages, .. } = value else {
        panic!("expected relation");
    };
    assert_eq!(pages.len(), 3);

    let requests = session.transport().requests();
    let base = format!("pages/{}/properties/rel1", dashed(&page_id(42)));
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method == Method::GET && r.body.is_none()));
    assert_eq!(requests[0].path, base);
    assert_eq!(requests[1].path, format!("{}?start_cursor=abc%2B%2F%3D", base));
}

#[tokio::test]
async fn a_failing_page_fails_the_whole_property() {
    let transport = ScriptedTransport::new()
        .ok(relation_listing(&[1, 2], Some("c1")))
        .respond(
            503,
            common::error_body(503, "service_unavailable", "Notion is unavailable"),
        );
    let session = NotionSession::new(transport, PropertyCodec::default());
    let page = PageId::parse(&page_id(42)).unwrap();

    let err = session
        .retrieve_property(&page, &property_id("rel1"))
        .await
        .unwrap_err();

    assert!(err.as_api_error().is_some_and(|e| e.is_retryable()));
}
