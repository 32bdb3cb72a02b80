//! Infrastructure services

mod assignment_engine;

pub use assignment_engine::{AssignmentEngine, ConditionValue, VariableValue};
