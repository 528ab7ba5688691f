//! Property tests for the query engine.

use csvq::core::compare::Comparator;
use csvq::core::condition::{Condition, FieldFilter, Query};
use csvq::core::table::{Row, Table};
use csvq::operators::predicate::evaluate;
use csvq::operators::query::run_query;
use csvq::operators::{OpContext, TableExt};
use proptest::prelude::*;

fn id_table(values: &[String]) -> Table {
    let rows = values
        .iter()
        .enumerate()
        .map(|(i, v)| vec![i.to_string(), v.clone()])
        .collect();
    Table::from_rows(["id", "v"], rows).unwrap()
}

fn sorted_rows(t: &Table) -> Vec<Row> {
    let mut rows = t.rows().to_vec();
    rows.sort();
    rows
}

fn assert_ordered(t: &Table, cmp: &Comparator) {
    let col = t.column("v").unwrap();
    for pair in col.windows(2) {
        assert!(
            !cmp.is_before(pair[1], pair[0]),
            "{:?} sorted before {:?} under {}",
            pair[1],
            pair[0],
            cmp.name()
        );
    }
}

/// Integers as text, sometimes zero-padded so equal numbers differ textually.
fn int_text() -> impl Strategy<Value = String> {
    (-20i32..20, any::<bool>()).prop_map(|(n, pad)| {
        if pad && n >= 0 {
            format!("0{}", n)
        } else {
            n.to_string()
        }
    })
}

fn range_condition() -> impl Strategy<Value = Condition> {
    (0u8..5, int_text()).prop_map(|(kind, v)| match kind {
        0 => Condition::eq(v),
        1 => Condition::lt(v),
        2 => Condition::gt(v),
        3 => Condition::lte(v),
        _ => Condition::gte(v),
    })
}

fn leaf_condition() -> impl Strategy<Value = Condition> {
    prop_oneof![
        range_condition(),
        int_text().prop_map(Condition::neq),
        prop::collection::vec(int_text(), 0..3).prop_map(Condition::is_in),
    ]
}

fn condition() -> impl Strategy<Value = Condition> {
    leaf_condition().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Condition::not),
            prop::collection::vec(inner.clone(), 0..3).prop_map(Condition::And),
            prop::collection::vec(inner, 0..3).prop_map(Condition::Or),
        ]
    })
}

proptest! {
    #[test]
    fn index_sorts_integers(values in prop::collection::vec(int_text(), 0..200)) {
        let mut ctx = OpContext::lenient();
        let t = id_table(&values).indexed_by("v", Comparator::Integer, &mut ctx).unwrap();
        assert_ordered(&t, &Comparator::Integer);
        prop_assert_eq!(sorted_rows(&t), sorted_rows(&id_table(&values)));
    }

    #[test]
    fn index_sorts_floats(values in prop::collection::vec(-1.0e6f64..1.0e6, 0..200)) {
        let values: Vec<String> = values.iter().map(|f| f.to_string()).collect();
        let mut ctx = OpContext::lenient();
        let t = id_table(&values).indexed_by("v", Comparator::Float, &mut ctx).unwrap();
        assert_ordered(&t, &Comparator::Float);
        prop_assert_eq!(t.len(), values.len());
    }

    #[test]
    fn index_sorts_text(values in prop::collection::vec("[a-c]{0,3}", 0..200)) {
        let mut ctx = OpContext::lenient();
        let t = id_table(&values).indexed_by("v", Comparator::Lexical, &mut ctx).unwrap();
        let col = t.column("v").unwrap();
        let mut expected: Vec<&str> = values.iter().map(String::as_str).collect();
        expected.sort();
        prop_assert_eq!(col, expected);
    }

    #[test]
    fn narrowed_query_matches_linear_scan(
        values in prop::collection::vec(int_text(), 0..120),
        conditions in prop::collection::vec(range_condition(), 0..4),
    ) {
        let mut ctx = OpContext::lenient();
        let plain = id_table(&values);
        let indexed = plain.clone().indexed_by("v", Comparator::Integer, &mut ctx).unwrap();

        let mut filter = FieldFilter::new();
        for c in conditions {
            filter = filter.with(c);
        }
        let scan_query = Query::new().filter("v", filter.clone().comparison(Comparator::Integer));
        let range_query = Query::new().filter("v", filter);

        let scanned = run_query(&plain, &scan_query, &mut ctx).unwrap();
        let narrowed = run_query(&indexed, &range_query, &mut ctx).unwrap();
        prop_assert_eq!(sorted_rows(&narrowed), sorted_rows(&scanned));
    }

    #[test]
    fn empty_query_is_identity(values in prop::collection::vec(int_text(), 0..50)) {
        let mut ctx = OpContext::lenient();
        let t = id_table(&values);
        let out = run_query(&t, &Query::new(), &mut ctx).unwrap();
        prop_assert_eq!(out.rows(), t.rows());
    }

    #[test]
    fn results_do_not_alias_source(values in prop::collection::vec(int_text(), 1..50)) {
        let mut ctx = OpContext::lenient();
        let t = id_table(&values);
        let mut out = run_query(&t, &Query::new(), &mut ctx).unwrap();
        let mut selected = t.select(&["v"], &mut ctx).unwrap();
        out.rows_mut()[0][1] = "mutated".into();
        selected.rows_mut()[0][0] = "mutated".into();
        prop_assert_eq!(t.value(0, "v"), Some(values[0].as_str()));
    }

    #[test]
    fn double_negation(value in int_text(), c in condition()) {
        let cmp = Comparator::Integer;
        let twice = Condition::not(Condition::not(c.clone()));
        prop_assert_eq!(evaluate(&value, &twice, &cmp), evaluate(&value, &c, &cmp));
    }

    #[test]
    fn empty_combinators(value in int_text()) {
        let cmp = Comparator::Integer;
        prop_assert!(evaluate(&value, &Condition::And(vec![]), &cmp));
        prop_assert!(!evaluate(&value, &Condition::Or(vec![]), &cmp));
    }
}
