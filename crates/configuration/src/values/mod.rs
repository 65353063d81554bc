mod dialect;

pub use dialect::{Dialect, DivisionOperator};
