mod common;

use query_engine_models::builders::*;
use query_engine_models::{AggregateMethod, Literal, Query, StringMethod};
use query_engine_translation::translation::error::{Clause, Error};
use similar_asserts::assert_eq;
use tests_common::{customer, field, order, order_line};

#[tokio::test]
async fn select_where() {
    let result = common::test_translation("select_where").await.unwrap();
    insta::assert_snapshot!(result, @r###"
    SELECT Name FROM Customer AS t0 WHERE (t0.City = @0)

    [(0, String("London"))]
    "###);
}

#[tokio::test]
async fn order_by_descending() {
    let result = common::test_translation("order_by_descending").await.unwrap();
    insta::assert_snapshot!(result, @r###"
    SELECT Id, Name, City FROM Customer AS t0 ORDER BY t0.Name Desc

    []
    "###);
}

#[tokio::test]
async fn divide_backslash() {
    let result = common::test_translation("divide_backslash").await.unwrap();
    insta::assert_snapshot!(result, @r###"
    SELECT Id, CustomerId, Amount FROM Order AS t0 WHERE ((t0.Amount \ @0) > @1)

    [(0, Int(2)), (1, Int(10))]
    "###);
}

#[test]
fn division_uses_a_slash_by_default() {
    let o = order("o");
    let query = Query::table("Order").filter(lambda(
        [&o],
        gt(div(field(&o, "Amount"), constant(2_i64)), constant(10_i64)),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Id, CustomerId, Amount FROM Order AS t0 WHERE ((t0.Amount / @0) > @1)"
    );
}

#[test]
fn join_selects_columns_of_both_tables() {
    let c = customer("c");
    let o = order("o");
    let query = Query::table("Customer").join(
        Query::table("Order"),
        lambda([&c], field(&c, "Id")),
        lambda([&o], field(&o, "CustomerId")),
        lambda(
            [&c, &o],
            new_record(
                "Row",
                [("Name", field(&c, "Name")), ("Amount", field(&o, "Amount"))],
            ),
        ),
    );
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Customer.Name, Order.Amount FROM Customer INNER JOIN Order ON Customer.Id = Order.CustomerId"
    );
    assert!(result.params.is_empty());
}

#[test]
fn join_applies_the_orderings_of_its_sources_first() {
    let c = customer("c");
    let o = order("o");
    let row_type = record("Row", [("Name", string()), ("Amount", decimal())]);
    let x = param("x", row_type);
    let query = Query::table("Customer")
        .order_by(lambda([&c], field(&c, "Name")))
        .join(
            Query::table("Order").order_by_descending(lambda([&o], field(&o, "Amount"))),
            lambda([&c], field(&c, "Id")),
            lambda([&o], field(&o, "CustomerId")),
            lambda(
                [&c, &o],
                new_record(
                    "Row",
                    [("Name", field(&c, "Name")), ("Amount", field(&o, "Amount"))],
                ),
            ),
        )
        .order_by(lambda([&x], x.member("Amount", decimal())));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Customer.Name, Order.Amount FROM Customer INNER JOIN Order ON Customer.Id = Order.CustomerId ORDER BY Customer.Name, Order.Amount Desc, Order.Amount"
    );
}

#[test]
fn join_sources_must_be_tables() {
    let c = customer("c");
    let o = order("o");
    let query = Query::table("Customer").join(
        Query::table("Order").filter(lambda([&o], gt(field(&o, "Amount"), constant(10_i64)))),
        lambda([&c], field(&c, "Id")),
        lambda([&o], field(&o, "CustomerId")),
        lambda([&c, &o], field(&o, "Amount")),
    );
    assert!(matches!(
        common::translate(&query),
        Err(Error::UnsupportedMethod(_))
    ));
}

#[test]
fn joins_of_joins_are_duplicate_join_clauses() {
    let c = customer("c");
    let o = order("o");
    let pair = Query::table("Customer").join(
        Query::table("Order"),
        lambda([&c], field(&c, "Id")),
        lambda([&o], field(&o, "CustomerId")),
        lambda([&c, &o], o.reference()),
    );
    let query = pair.join(
        Query::table("Order"),
        lambda([&o], field(&o, "Id")),
        lambda([&o], field(&o, "Id")),
        lambda([&o, &o], field(&o, "Amount")),
    );
    assert!(matches!(
        common::translate(&query),
        Err(Error::DuplicateClauseHandler {
            clause: Clause::Join,
            ..
        })
    ));
}

#[test]
fn navigation_aggregates_become_correlated_subqueries() {
    let c = customer("c");
    let o = order("o");
    let query = Query::table("Customer").select(lambda(
        [&c],
        new_record(
            "Summary",
            [
                ("Name", field(&c, "Name")),
                (
                    "Total",
                    aggregate(
                        AggregateMethod::Sum,
                        field(&c, "Orders"),
                        Some(lambda([&o], field(&o, "Amount"))),
                        decimal(),
                    ),
                ),
            ],
        ),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Name, (SELECT Sum(Amount) FROM Order AS t1 WHERE (t1.CustomerId = t0.Id)) FROM Customer AS t0"
    );
}

#[test]
fn aggregates_of_aggregates_are_computed_over_pairs() {
    let c = customer("c");
    let o = order("o");
    let l = order_line("l");
    let lines = aggregate(
        AggregateMethod::Sum,
        field(&o, "Lines"),
        Some(lambda([&l], field(&l, "Quantity"))),
        int32(),
    );
    let query = Query::table("Customer").select(lambda(
        [&c],
        new_record(
            "Summary",
            [
                ("Name", field(&c, "Name")),
                (
                    "Quantity",
                    aggregate(
                        AggregateMethod::Sum,
                        field(&c, "Orders"),
                        Some(lambda([&o], lines)),
                        int32(),
                    ),
                ),
            ],
        ),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Name, (SELECT Sum(Value) FROM (SELECT CustomerId AS Key, (SELECT Sum(Quantity) FROM OrderLine AS t3 WHERE (t3.OrderId = t2.Id)) AS Value FROM Order AS t2 WHERE (t2.CustomerId = t0.Id)) AS t1) FROM Customer AS t0"
    );
}

#[test]
fn count_predicates_join_the_correlation() {
    let c = customer("c");
    let o = order("o");
    let query = Query::table("Customer").select(lambda(
        [&c],
        aggregate(
            AggregateMethod::Count,
            field(&c, "Orders"),
            Some(lambda([&o], gt(field(&o, "Amount"), constant(100_i64)))),
            int32(),
        ),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        common::render(&result),
        "SELECT (SELECT Count(*) FROM Order AS t1 WHERE ((t1.CustomerId = t0.Id) AND (t1.Amount > @0))) FROM Customer AS t0\n\n[(0, Int(100))]"
    );
}

#[test]
fn count_without_a_predicate_counts_every_related_row() {
    let c = customer("c");
    let query = Query::table("Customer").select(lambda(
        [&c],
        aggregate(AggregateMethod::Count, field(&c, "Orders"), None, int32()),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT (SELECT Count(*) FROM Order AS t1 WHERE (t1.CustomerId = t0.Id)) FROM Customer AS t0"
    );
}

#[test]
fn sums_need_a_selector() {
    let c = customer("c");
    let query = Query::table("Customer").select(lambda(
        [&c],
        aggregate(AggregateMethod::Sum, field(&c, "Orders"), None, decimal()),
    ));
    assert!(matches!(
        common::translate(&query),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn records_without_columns_select_their_scalar_fields() {
    let c = customer("c");
    let query = Query::table("Customer").select(lambda(
        [&c],
        new_record(
            "CustomerCard",
            [
                ("Name", constant("n/a")),
                ("Orders", field(&c, "Orders")),
                ("City", constant("?")),
            ],
        ),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(result.sql, "SELECT City, Name FROM Customer AS t0");
    assert!(result.params.is_empty());
}

#[test]
fn records_of_constants_select_their_scalar_fields() {
    let c = customer("c");
    let query = Query::table("Customer").select(lambda(
        [&c],
        new_record(
            "CustomerCard",
            [("Name", constant("n/a")), ("City", constant("?"))],
        ),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(result.sql, "SELECT City, Name FROM Customer AS t0");
    assert!(result.params.is_empty());
}

#[test]
fn joins_of_a_table_with_itself_are_unsupported() {
    let a = customer("a");
    let b = customer("b");
    let query = Query::table("Customer").join(
        Query::table("Customer"),
        lambda([&a], field(&a, "City")),
        lambda([&b], field(&b, "City")),
        lambda(
            [&a, &b],
            new_record(
                "Pair",
                [("A", field(&a, "Name")), ("B", field(&b, "Name"))],
            ),
        ),
    );
    assert_eq!(
        common::translate(&query),
        Err(Error::UnsupportedMethod(
            "a join of 'Customer' with itself".to_string()
        ))
    );
}

#[test]
fn cross_joins_of_a_table_with_itself_are_unsupported() {
    let a = customer("a");
    let b = customer("b");
    let query = Query::table("Customer").cross_join(
        Query::table("Customer"),
        lambda(
            [&a, &b],
            new_record(
                "Pair",
                [("A", field(&a, "Name")), ("B", field(&b, "Name"))],
            ),
        ),
    );
    assert_eq!(
        common::translate(&query),
        Err(Error::UnsupportedMethod(
            "a cross join of 'Customer' with itself".to_string()
        ))
    );
}

#[test]
fn cross_joins_select_from_derived_tables() {
    let c = customer("c");
    let o = order("o");
    let query = Query::table("Customer").cross_join(
        Query::table("Order"),
        lambda(
            [&c, &o],
            new_record(
                "Row",
                [("Name", field(&c, "Name")), ("Amount", field(&o, "Amount"))],
            ),
        ),
    );
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT leftStatement.Name, rightStatement.Amount FROM (SELECT Id, Name, City FROM Customer AS t1) AS leftStatement CROSS JOIN (SELECT Id, CustomerId, Amount FROM Order AS t1) AS rightStatement"
    );
}

#[test]
fn cross_joins_apply_the_orderings_of_their_sources() {
    let c = customer("c");
    let o = order("o");
    let query = Query::table("Customer")
        .order_by(lambda([&c], field(&c, "Name")))
        .cross_join(
            Query::table("Order").filter(lambda([&o], gt(field(&o, "Amount"), constant(5_i64)))),
            lambda(
                [&c, &o],
                new_record(
                    "Row",
                    [("Name", field(&c, "Name")), ("Amount", field(&o, "Amount"))],
                ),
            ),
        );
    let result = common::translate(&query).unwrap();
    assert_eq!(
        common::render(&result),
        "SELECT leftStatement.Name, rightStatement.Amount FROM (SELECT Id, Name, City FROM Customer AS t1) AS leftStatement CROSS JOIN (SELECT Id, CustomerId, Amount FROM Order AS t1 WHERE (t1.Amount > @0)) AS rightStatement ORDER BY leftStatement.Name\n\n[(0, Int(5))]"
    );
}

#[test]
fn projected_cross_join_sources_alias_their_members() {
    let c = customer("c");
    let o = order("o");
    let card_type = record("Card", [("Label", string())]);
    let card = param("card", card_type);
    let query = Query::table("Customer")
        .select(lambda(
            [&c],
            new_record("Card", [("Label", field(&c, "Name"))]),
        ))
        .cross_join(
            Query::table("Order"),
            lambda([&card, &o], card.member("Label", string())),
        );
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT leftStatement.Label FROM (SELECT Name AS Label FROM Customer AS t1) AS leftStatement CROSS JOIN (SELECT Id, CustomerId, Amount FROM Order AS t1) AS rightStatement"
    );
}

#[test]
fn a_second_where_is_a_duplicate_clause() {
    let c = customer("c");
    let query = Query::table("Customer")
        .filter(lambda([&c], eq(field(&c, "City"), constant("London"))))
        .filter(lambda([&c], eq(field(&c, "Name"), constant("Bob"))));
    assert_eq!(
        common::translate(&query),
        Err(Error::DuplicateClauseHandler {
            clause: Clause::Where,
            expression: r#"c => (c.City == "London")"#.to_string(),
        })
    );
}

#[test]
fn a_second_select_is_a_duplicate_clause() {
    let c = customer("c");
    let name = param("name", string());
    let query = Query::table("Customer")
        .select(lambda([&c], field(&c, "Name")))
        .select(lambda([&name], name.reference()));
    assert!(matches!(
        common::translate(&query),
        Err(Error::DuplicateClauseHandler {
            clause: Clause::Select,
            ..
        })
    ));
}

#[test]
fn unhandled_operators_are_unsupported() {
    let c = customer("c");
    let query = Query::table("Customer")
        .select(lambda([&c], field(&c, "Name")))
        .call("Distinct");
    assert_eq!(
        common::translate(&query),
        Err(Error::UnsupportedMethod("Distinct()".to_string()))
    );
}

#[test]
fn groupings_are_unsupported() {
    let g = param("g", group(string(), row("Customer")));
    let query = Query::table("Customer")
        .call("GroupBy")
        .select(lambda([&g], g.member("Key", string())));
    assert_eq!(
        common::translate(&query),
        Err(Error::UnsupportedMethod("GroupBy()".to_string()))
    );
}

#[test]
fn unknown_row_types_are_missing_metadata() {
    assert_eq!(
        common::translate(&Query::table("Product")),
        Err(Error::MissingMetadata("row type 'Product'".to_string()))
    );
    assert!(matches!(
        common::translate(&Query::table("")),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn bare_tables_have_no_projection() {
    assert_eq!(
        common::translate(&Query::table("Customer")),
        Err(Error::UnresolvableProjection("Table<Customer>".to_string()))
    );
}

#[test]
fn constant_projections_have_no_columns() {
    let c = customer("c");
    let query = Query::table("Customer").select(lambda([&c], constant("x")));
    assert_eq!(
        common::translate(&query),
        Err(Error::UnresolvableProjection("string".to_string()))
    );
}

#[test]
fn comparisons_with_null_test_for_null() {
    let c = customer("c");
    let query = Query::table("Customer").filter(lambda(
        [&c],
        or(
            eq(field(&c, "City"), null(string())),
            ne(null(string()), field(&c, "Name")),
        ),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Id, Name, City FROM Customer AS t0 WHERE ((t0.City IS NULL) OR (t0.Name IS NOT NULL))"
    );
    assert!(result.params.is_empty());
}

#[test]
fn nulls_outside_comparisons_are_inlined() {
    let o = order("o");
    let query = Query::table("Order").filter(lambda(
        [&o],
        gt(add(field(&o, "Amount"), null(decimal())), constant(10_i64)),
    ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Id, CustomerId, Amount FROM Order AS t0 WHERE ((t0.Amount + NULL) > @0)"
    );
    assert_eq!(
        result.params,
        vec![query_engine_sql::sql::string::Param::Int(10)]
    );
}

#[test]
fn type_tests_survive_evaluation_and_are_rejected() {
    let c = customer("c");
    let query = Query::table("Customer").filter(lambda(
        [&c],
        query_engine_models::Expression::TypeIs {
            operand: Box::new(c.reference()),
            type_operand: row("Order"),
        },
    ));
    assert_eq!(
        common::translate(&query),
        Err(Error::UnsupportedNodeKind("(c Is Order)".to_string()))
    );
}

#[test]
fn string_methods_become_patterns_and_functions() {
    let c = customer("c");
    let query = Query::table("Customer")
        .filter(lambda(
            [&c],
            and(
                field(&c, "Name").call_string(StringMethod::StartsWith, vec![constant("A")]),
                field(&c, "City").call_string(StringMethod::Contains, vec![constant("on")]),
            ),
        ))
        .order_by(lambda(
            [&c],
            field(&c, "Name").call_string(StringMethod::ToLower, vec![]),
        ));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        common::render(&result),
        "SELECT Id, Name, City FROM Customer AS t0 WHERE (t0.Name LIKE (@0 + '%') AND t0.City LIKE ('%' + @1 + '%')) ORDER BY Lower(t0.Name)\n\n[(0, String(\"A\")), (1, String(\"on\"))]"
    );
}

#[test]
fn captured_values_become_parameters() {
    let c = customer("c");
    let city = captured([("city", Literal::from("Paris"))]).member("city", string());
    let query = Query::table("Customer")
        .filter(lambda([&c], eq(field(&c, "City"), city)))
        .select(lambda([&c], field(&c, "Name")));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        common::render(&result),
        "SELECT Name FROM Customer AS t0 WHERE (t0.City = @0)\n\n[(0, String(\"Paris\"))]"
    );
}

#[test]
fn scalar_conversions_are_transparent() {
    let c = customer("c");
    let query = Query::table("Customer")
        .filter(lambda([&c], gt(convert(field(&c, "Id"), int64()), constant(3_i64))))
        .select(lambda([&c], field(&c, "Name")));
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Name FROM Customer AS t0 WHERE (t0.Id > @0)"
    );
}

#[test]
fn placeholders_follow_the_order_of_the_text() {
    let c = customer("c");
    let query = Query::table("Customer")
        .filter(lambda(
            [&c],
            or(
                eq(field(&c, "City"), constant("London")),
                and(
                    eq(field(&c, "Name"), constant("Bob")),
                    gt(field(&c, "Id"), constant(3_i64)),
                ),
            ),
        ))
        .select(lambda([&c], field(&c, "Name")));

    let first = common::translate(&query).unwrap();
    let second = common::translate(&query).unwrap();
    assert_eq!(first, second);

    assert_eq!(
        first.sql,
        "SELECT Name FROM Customer AS t0 WHERE ((t0.City = @0) OR ((t0.Name = @1) AND (t0.Id > @2)))"
    );
    assert_eq!(
        first.params,
        vec![
            query_engine_sql::sql::string::Param::String("London".to_string()),
            query_engine_sql::sql::string::Param::String("Bob".to_string()),
            query_engine_sql::sql::string::Param::Int(3),
        ]
    );
}

#[test]
fn queries_deserialize_and_translate() {
    let query: Query = serde_json::from_value(serde_json::json!({
        "operator": "where",
        "source": { "operator": "table", "row_type": "Customer" },
        "predicate": {
            "parameters": [{ "name": "c", "type": { "row": "Customer" } }],
            "body": {
                "node": "unary",
                "operator": "not",
                "operand": {
                    "node": "binary",
                    "operator": "equal",
                    "left": {
                        "node": "member",
                        "object": { "node": "parameter", "name": "c", "type": { "row": "Customer" } },
                        "member": "City",
                        "type": { "scalar": "string" }
                    },
                    "right": { "node": "constant", "value": "Paris", "type": { "scalar": "string" } }
                }
            }
        }
    }))
    .unwrap();
    let result = common::translate(&query).unwrap();
    assert_eq!(
        result.sql,
        "SELECT Id, Name, City FROM Customer AS t0 WHERE NOT ((t0.City = @0))"
    );
}
