// tests/filter_snapshots.rs
//! Wire output of filter trees and sort chains.
//!
//! Uses `insta` inline JSON snapshots. Object keys print in alphabetical
//! order; arrays keep their construction order.

use insta::assert_json_snapshot;
use notion_dbkit::{
    CompoundFilter, FilterError, FormulaResultType, Operator, PageId, PropertyFilter,
    PropertyType, RollupAggregate, SortCriterion, SortSpec, TimestampFilter,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn nested_compound_filter() {
    let filter = CompoundFilter::and(vec![
        PropertyFilter::checkbox("Done", Operator::Equals, false).unwrap(),
        CompoundFilter::or(vec![
            PropertyFilter::status("Stage", Operator::Equals, "In progress").unwrap(),
            PropertyFilter::date("Due", PropertyType::Date, Operator::PastWeek, ()).unwrap(),
        ])
        .unwrap(),
    ])
    .unwrap();

    assert_eq!(filter.leaf_count(), 3);
    assert_json_snapshot!(filter.serialize(), @r###"
    {
      "and": [
        {
          "checkbox": {
            "equals": false
          },
          "property": "Done"
        },
        {
          "or": [
            {
              "property": "Stage",
              "status": {
                "equals": "In progress"
              }
            },
            {
              "date": {
                "past_week": {}
              },
              "property": "Due"
            }
          ]
        }
      ]
    }
    "###);
}

#[test]
fn emptiness_checks_send_true() {
    let filter = PropertyFilter::text("Notes", PropertyType::RichText, Operator::IsEmpty, ())
        .unwrap();
    assert_json_snapshot!(filter.serialize(), @r###"
    {
      "property": "Notes",
      "rich_text": {
        "is_empty": true
      }
    }
    "###);
}

#[test]
fn timestamp_filter() {
    let filter = TimestampFilter::last_edited_time(Operator::OnOrAfter, "2024-05-01").unwrap();
    assert_json_snapshot!(filter.serialize(), @r###"
    {
      "last_edited_time": {
        "on_or_after": "2024-05-01"
      },
      "timestamp": "last_edited_time"
    }
    "###);
}

#[test]
fn rollup_any_nests_the_element_condition() {
    let filter = PropertyFilter::rollup(
        "Subtask names",
        RollupAggregate::Any,
        PropertyType::RichText,
        Operator::Contains,
        "urgent",
    )
    .unwrap();
    assert_json_snapshot!(filter.serialize(), @r###"
    {
      "property": "Subtask names",
      "rollup": {
        "any": {
          "rich_text": {
            "contains": "urgent"
          }
        }
      }
    }
    "###);
}

#[test]
fn formula_filter_by_result_type() {
    let filter = PropertyFilter::formula(
        "Overdue",
        FormulaResultType::Checkbox,
        Operator::Equals,
        true,
    )
    .unwrap();
    assert_json_snapshot!(filter.serialize(), @r###"
    {
      "formula": {
        "checkbox": {
          "equals": true
        }
      },
      "property": "Overdue"
    }
    "###);
}

#[test]
fn relation_ids_are_sent_dashed() {
    let page =
        PageId::parse("https://www.notion.so/Roadmap-0123456789abcdef0123456789abcdef").unwrap();
    let filter = PropertyFilter::relation("Blocked by", Operator::Contains, &page).unwrap();
    assert_json_snapshot!(filter.serialize(), @r###"
    {
      "property": "Blocked by",
      "relation": {
        "contains": "01234567-89ab-cdef-0123-456789abcdef"
      }
    }
    "###);
}

#[test]
fn number_and_rollup_aggregate_filters() {
    let estimate = PropertyFilter::number("Estimate", Operator::LessThanOrEqualTo, 8).unwrap();
    assert_eq!(
        estimate.serialize(),
        json!({"property": "Estimate", "number": {"less_than_or_equal_to": 8.0}})
    );

    let total = PropertyFilter::rollup(
        "Total points",
        RollupAggregate::Number,
        PropertyType::Number,
        Operator::GreaterThan,
        20,
    )
    .unwrap();
    assert_eq!(
        total.serialize(),
        json!({"property": "Total points", "rollup": {"number": {"greater_than": 20.0}}})
    );
}

#[test]
fn sort_chain_keeps_tie_break_order() {
    let sorts = SortSpec::new()
        .then(SortCriterion::ascending("x"))
        .then(SortCriterion::created_time_descending());
    assert_json_snapshot!(sorts.serialize(), @r###"
    [
      {
        "direction": "ascending",
        "property": "x"
      },
      {
        "direction": "descending",
        "timestamp": "created_time"
      }
    ]
    "###);

    let reversed: SortSpec = vec![
        SortCriterion::created_time_descending(),
        SortCriterion::ascending("x"),
    ]
    .into();
    assert_eq!(reversed.serialize()[0]["timestamp"], "created_time");
}

#[test]
fn serialization_is_repeatable() {
    let filter = PropertyFilter::select("Stage", Operator::DoesNotEqual, "Done").unwrap();
    assert_eq!(filter.serialize(), filter.serialize());

    let combined = CompoundFilter::or(vec![filter.clone(), filter]).unwrap();
    assert_eq!(combined.serialize()["or"][0], combined.serialize()["or"][1]);
}

#[test]
fn invalid_filters_fail_at_construction() {
    assert!(matches!(
        PropertyFilter::checkbox("done", Operator::Contains, true),
        Err(FilterError::OperatorNotAllowed { .. })
    ));
    assert!(matches!(
        PropertyFilter::text("Notes", PropertyType::RichText, Operator::IsNotEmpty, "x"),
        Err(FilterError::OperandMismatch { .. })
    ));
    assert!(matches!(
        PropertyFilter::date("Due", PropertyType::Date, Operator::After, "next tuesday"),
        Err(FilterError::OperandMismatch { .. })
    ));
    assert!(matches!(
        PropertyFilter::date("Due", PropertyType::Date, Operator::NextMonth, "2024-01-01"),
        Err(FilterError::OperandMismatch { .. })
    ));
    assert!(matches!(
        PropertyFilter::new("Total", PropertyType::Rollup, Operator::Equals, 1),
        Err(FilterError::NotFilterable { .. })
    ));
    assert!(matches!(
        CompoundFilter::and(vec![]),
        Err(FilterError::EmptyCompound { .. })
    ));
    assert!(matches!(
        "resembles".parse::<Operator>(),
        Err(FilterError::UnknownOperator(_))
    ));
}
