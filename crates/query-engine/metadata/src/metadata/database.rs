//! Metadata information regarding row types: which table stores them, which members map to
//! which columns, and how row types relate to each other.

use std::collections::BTreeMap;
use std::fmt;

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scalar types a row member may have. This is also the set of types a conversion
/// may target.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Char,
    String,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Single,
    Double,
    Decimal,
    DateTime,
    Guid,
    Enum,
}

impl ScalarType {
    /// Whether values of this type take part in arithmetic.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ScalarType::Byte
                | ScalarType::SByte
                | ScalarType::Int16
                | ScalarType::Int32
                | ScalarType::Int64
                | ScalarType::UInt16
                | ScalarType::UInt32
                | ScalarType::UInt64
                | ScalarType::Single
                | ScalarType::Double
                | ScalarType::Decimal
        )
    }

    /// Whether values of this type are integral.
    pub fn is_integral(self) -> bool {
        self.is_numeric()
            && !matches!(
                self,
                ScalarType::Single | ScalarType::Double | ScalarType::Decimal
            )
    }

    /// Whether values of this type are text.
    pub fn is_textual(self) -> bool {
        matches!(self, ScalarType::String | ScalarType::Char)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Char => "char",
            ScalarType::String => "string",
            ScalarType::Byte => "byte",
            ScalarType::SByte => "sbyte",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt16 => "uint16",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Single => "single",
            ScalarType::Double => "double",
            ScalarType::Decimal => "decimal",
            ScalarType::DateTime => "datetime",
            ScalarType::Guid => "guid",
            ScalarType::Enum => "enum",
        };
        write!(f, "{name}")
    }
}

/// Mapping from a row type name to its information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RowTypes(pub BTreeMap<String, RowTypeInfo>);

impl RowTypes {
    pub fn empty() -> Self {
        RowTypes(BTreeMap::new())
    }
}

/// Information about a row type and the table that stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowTypeInfo {
    pub table_name: String,
    /// The member holding the primary key.
    pub primary_key: String,
    /// Members stored as columns, in declaration order.
    pub columns: IndexMap<String, ColumnInfo>,
    /// For each principal row type, the member of this row type that references its
    /// primary key.
    #[serde(default)]
    pub foreign_keys: BTreeMap<String, String>,
    /// One-to-many navigation members.
    #[serde(default)]
    pub navigations: BTreeMap<String, NavigationInfo>,
}

/// Information about a database column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    /// The name of the column in the database.
    pub name: String,
    pub r#type: ScalarType,
    #[serde(default)]
    pub description: Option<String>,
}

/// A navigation member exposing the rows of another row type that reference this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NavigationInfo {
    /// The row type on the "many" side.
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_names_round_trip_through_serde() {
        for scalar_type in enum_iterator::all::<ScalarType>() {
            let json = serde_json::to_value(scalar_type).unwrap();
            assert_eq!(json, serde_json::Value::String(scalar_type.to_string()));
        }
    }

    #[test]
    fn integral_types_are_numeric() {
        for scalar_type in enum_iterator::all::<ScalarType>().filter(|t| t.is_integral()) {
            assert!(
                scalar_type.is_numeric(),
                "{scalar_type} is integral but not numeric"
            );
        }
    }

    #[test]
    fn columns_keep_declaration_order() {
        let info: RowTypeInfo = serde_json::from_value(serde_json::json!({
            "tableName": "Customer",
            "primaryKey": "Id",
            "columns": {
                "Id": { "name": "Id", "type": "int32" },
                "Name": { "name": "Name", "type": "string" },
                "City": { "name": "City", "type": "string" }
            }
        }))
        .unwrap();

        let members: Vec<&str> = info.columns.keys().map(String::as_str).collect();
        assert_eq!(members, ["Id", "Name", "City"]);
        assert!(info.foreign_keys.is_empty());
    }
}
