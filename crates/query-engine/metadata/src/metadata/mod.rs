//! Metadata information regarding the row types and the tables that store them.

pub mod database;

// re-export without modules
pub use database::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata information.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub row_types: RowTypes,
}

impl Metadata {
    pub fn empty() -> Self {
        Metadata {
            row_types: RowTypes::empty(),
        }
    }
}
