use std::collections::BTreeMap;

use indexmap::IndexMap;

use query_engine_metadata::metadata::{
    ColumnInfo, Metadata, NavigationInfo, RowTypeInfo, RowTypes, ScalarType,
};
use query_engine_models::builders::{collection, decimal, int32, param, row, string};
use query_engine_models::{Expression, Parameter, Type};

fn column(name: &str, r#type: ScalarType) -> (String, ColumnInfo) {
    (
        name.to_string(),
        ColumnInfo {
            name: name.to_string(),
            r#type,
            description: None,
        },
    )
}

fn navigation(member: &str, target: &str) -> (String, NavigationInfo) {
    (
        member.to_string(),
        NavigationInfo {
            target: target.to_string(),
        },
    )
}

/// `Customer(Id, Name, City)`, `Order(Id, CustomerId, Amount)` and
/// `OrderLine(Id, OrderId, Quantity)`, keyed by `Id`.
pub fn shop_metadata() -> Metadata {
    let customer = RowTypeInfo {
        table_name: "Customer".to_string(),
        primary_key: "Id".to_string(),
        columns: IndexMap::from([
            column("Id", ScalarType::Int32),
            column("Name", ScalarType::String),
            column("City", ScalarType::String),
        ]),
        foreign_keys: BTreeMap::new(),
        navigations: BTreeMap::from([navigation("Orders", "Order")]),
    };
    let order = RowTypeInfo {
        table_name: "Order".to_string(),
        primary_key: "Id".to_string(),
        columns: IndexMap::from([
            column("Id", ScalarType::Int32),
            column("CustomerId", ScalarType::Int32),
            column("Amount", ScalarType::Decimal),
        ]),
        foreign_keys: BTreeMap::from([("Customer".to_string(), "CustomerId".to_string())]),
        navigations: BTreeMap::from([navigation("Lines", "OrderLine")]),
    };
    let order_line = RowTypeInfo {
        table_name: "OrderLine".to_string(),
        primary_key: "Id".to_string(),
        columns: IndexMap::from([
            column("Id", ScalarType::Int32),
            column("OrderId", ScalarType::Int32),
            column("Quantity", ScalarType::Int32),
        ]),
        foreign_keys: BTreeMap::from([("Order".to_string(), "OrderId".to_string())]),
        navigations: BTreeMap::new(),
    };

    Metadata {
        row_types: RowTypes(BTreeMap::from([
            ("Customer".to_string(), customer),
            ("Order".to_string(), order),
            ("OrderLine".to_string(), order_line),
        ])),
    }
}

/// A lambda parameter bound to a customer row.
pub fn customer(name: &str) -> Parameter {
    param(name, row("Customer"))
}

/// A lambda parameter bound to an order row.
pub fn order(name: &str) -> Parameter {
    param(name, row("Order"))
}

/// A lambda parameter bound to an order line row.
pub fn order_line(name: &str) -> Parameter {
    param(name, row("OrderLine"))
}

/// The typed members of the fixture row types.
pub fn member_type(row_type: &str, member: &str) -> Type {
    match (row_type, member) {
        ("Customer", "Name" | "City") => string(),
        ("Order", "Amount") => decimal(),
        ("Customer", "Orders") => collection(row("Order")),
        ("Order", "Lines") => collection(row("OrderLine")),
        _ => int32(),
    }
}

/// Access a member of a fixture row parameter with its registered type.
pub fn field(parameter: &Parameter, member: &str) -> Expression {
    let row_type = parameter.r#type.row_type().unwrap_or_default();
    parameter.member(member, member_type(row_type, member))
}
