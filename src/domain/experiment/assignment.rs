//! Persisted assignment records

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::condition::VariableSet;
use super::entity::{ExperimentKind, ExperimentName};
use crate::domain::storage::StorageEntity;
use crate::domain::DomainError;

/// Resolved outcome of an experiment, kept as JSON so any serializable condition fits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Assignment {
    /// The single condition chosen for a binary or weighted split experiment
    Condition(Value),
    /// The variables included for a multivariate experiment, in declaration order
    Variables(Vec<Value>),
}

impl Assignment {
    pub fn condition<C: Serialize>(condition: &C) -> Result<Self, DomainError> {
        Ok(Self::Condition(serde_json::to_value(condition)?))
    }

    pub fn variables<V: Serialize>(variables: &VariableSet<V>) -> Result<Self, DomainError>
    where
        V: PartialEq,
    {
        let values = variables
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Variables(values))
    }

    pub fn is_condition(&self) -> bool {
        matches!(self, Self::Condition(_))
    }

    pub fn is_variables(&self) -> bool {
        matches!(self, Self::Variables(_))
    }

    /// Describes the stored shape for error messages and logs
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Condition(_) => "condition",
            Self::Variables(_) => "variables",
        }
    }

    /// Decode a stored condition into the caller's type
    pub fn decode_condition<C: DeserializeOwned>(&self) -> Result<C, DomainError> {
        match self {
            Self::Condition(value) => serde_json::from_value(value.clone()).map_err(|e| {
                DomainError::serialization(format!("Stored condition does not decode: {}", e))
            }),
            Self::Variables(_) => Err(DomainError::conflict(
                "Stored assignment is a multivariate variable set, not a condition",
            )),
        }
    }

    /// Decode a stored variable set into the caller's type
    pub fn decode_variables<V>(&self) -> Result<VariableSet<V>, DomainError>
    where
        V: DeserializeOwned + PartialEq,
    {
        match self {
            Self::Variables(values) => values
                .iter()
                .map(|value| {
                    serde_json::from_value(value.clone()).map_err(|e| {
                        DomainError::serialization(format!(
                            "Stored variable does not decode: {}",
                            e
                        ))
                    })
                })
                .collect(),
            Self::Condition(_) => Err(DomainError::conflict(
                "Stored assignment is a single condition, not a multivariate variable set",
            )),
        }
    }
}

/// Storage entity wrapping an assignment with its experiment name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAssignment {
    name: ExperimentName,
    kind: ExperimentKind,
    assignment: Assignment,
    assigned_at: DateTime<Utc>,
}

impl StoredAssignment {
    pub fn new(name: ExperimentName, kind: ExperimentKind, assignment: Assignment) -> Self {
        Self {
            name,
            kind,
            assignment,
            assigned_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &ExperimentName {
        &self.name
    }

    pub fn kind(&self) -> ExperimentKind {
        self.kind
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }
}

impl StorageEntity for StoredAssignment {
    type Key = ExperimentName;

    fn key(&self) -> &Self::Key {
        &self.name
    }
}
