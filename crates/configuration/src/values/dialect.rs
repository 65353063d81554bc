use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Options for the flavour of SQL the compiler emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    #[serde(default)]
    pub division_operator: DivisionOperator,
}

/// The token emitted for division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum DivisionOperator {
    /// `/`
    #[default]
    Slash,
    /// `\`, integer division in some dialects.
    Backslash,
}

impl DivisionOperator {
    pub fn token(self) -> &'static str {
        match self {
            DivisionOperator::Slash => "/",
            DivisionOperator::Backslash => "\\",
        }
    }
}

impl Dialect {
    pub fn is_default(&self) -> bool {
        *self == Dialect::default()
    }
}
