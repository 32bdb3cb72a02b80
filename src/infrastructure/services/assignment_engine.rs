//! Assignment engine
//!
//! Resolves an experiment name to a durable outcome. The first resolution draws
//! with [`WeightedSampler`] and persists the result; every later resolution returns
//! the persisted outcome untouched until the experiment is reset.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::domain::experiment::{
    Assignment, AssignmentStore, Choices, ExperimentEvent, ExperimentKind, ExperimentName,
    ExperimentObserver, StoredAssignment, VariableSet, Variables, WeightedSet,
};
use crate::domain::DomainError;
use crate::infrastructure::experiment::{NameLocks, WeightedSampler};

/// Bounds for values used as conditions
pub trait ConditionValue: Serialize + DeserializeOwned + Clone + Send + Sync {}

impl<T> ConditionValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync {}

/// Bounds for values used as multivariate variables
pub trait VariableValue: ConditionValue + PartialEq {}

impl<T> VariableValue for T where T: ConditionValue + PartialEq {}

/// Persistent experiment assignment
pub struct AssignmentEngine {
    store: Arc<dyn AssignmentStore>,
    sampler: WeightedSampler,
    locks: NameLocks,
    observers: Vec<Arc<dyn ExperimentObserver>>,
}

impl std::fmt::Debug for AssignmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentEngine")
            .field("sampler", &self.sampler)
            .field("locks", &self.locks)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl AssignmentEngine {
    /// Create an engine over the given store with an entropy-seeded sampler
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self {
            store,
            sampler: WeightedSampler::new(),
            locks: NameLocks::new(),
            observers: Vec::new(),
        }
    }

    /// Replace the random source
    pub fn with_sampler(mut self, sampler: WeightedSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Register a lifecycle observer
    pub fn with_observer(mut self, observer: Arc<dyn ExperimentObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// A/B test: `a` or `b` with equal probability, remembered per name
    pub async fn resolve_binary<C: ConditionValue>(
        &self,
        name: impl AsRef<str>,
        a: C,
        b: C,
    ) -> Result<C, DomainError> {
        let conditions = WeightedSet::binary(a, b);
        self.resolve_condition(name.as_ref(), ExperimentKind::Binary, &conditions)
            .await
    }

    /// Weighted split test
    ///
    /// A stored condition is returned unchanged and `conditions` is ignored, even
    /// if it differs from the set used for the first resolution. The set is still
    /// validated, so an empty or degenerate set always fails.
    pub async fn resolve_split<C: ConditionValue>(
        &self,
        name: impl AsRef<str>,
        conditions: &WeightedSet<C>,
    ) -> Result<C, DomainError> {
        self.resolve_condition(name.as_ref(), ExperimentKind::WeightedSplit, conditions)
            .await
    }

    /// Legacy entry point taking a plain or weighted list
    #[deprecated(since = "0.1.0", note = "use `resolve_split` with a `WeightedSet`")]
    pub async fn resolve_choices<C: ConditionValue>(
        &self,
        name: impl AsRef<str>,
        choices: Choices<C>,
    ) -> Result<C, DomainError> {
        let conditions: WeightedSet<C> = choices.into();
        self.resolve_split(name, &conditions).await
    }

    /// Multivariate test: each variable is included on its own Bernoulli draw
    ///
    /// An empty variable set resolves to (and persists) the empty set.
    pub async fn resolve_multivariate<V: VariableValue>(
        &self,
        name: impl AsRef<str>,
        variables: &Variables<V>,
    ) -> Result<VariableSet<V>, DomainError> {
        let kind = ExperimentKind::Multivariate;
        let name = parse_name(name.as_ref())?;
        variables.validate()?;

        let _guard = self.locks.acquire(&name).await?;
        let cached = self.load(&name).await?;
        self.emit(|| ExperimentEvent::WillResolve {
            name: name.clone(),
            kind,
            cached: cached.as_ref().map(|r| r.assignment().clone()),
        });

        if let Some(record) = cached {
            let included = record.assignment().decode_variables::<V>()?;
            debug!(experiment = %name, kind = %kind, included = included.len(), "Returning stored assignment");
            self.emit(|| ExperimentEvent::DidResolve {
                name: name.clone(),
                kind,
                assignment: record.assignment().clone(),
                newly_assigned: false,
            });
            return Ok(included);
        }

        let probabilities: Vec<f64> = variables.factors().iter().map(|f| f.probability).collect();
        let outcomes = self.sampler.include_each(&probabilities)?;

        let included: VariableSet<V> = variables
            .factors()
            .iter()
            .zip(outcomes)
            .filter(|(_, included)| *included)
            .map(|(factor, _)| factor.variable.clone())
            .collect();

        let assignment = Assignment::variables(&included)?;
        self.persist(StoredAssignment::new(name.clone(), kind, assignment.clone()))
            .await?;

        info!(
            experiment = %name,
            kind = %kind,
            included = included.len(),
            of = variables.len(),
            "Assigned new variant"
        );
        self.emit(|| ExperimentEvent::DidResolve {
            name: name.clone(),
            kind,
            assignment,
            newly_assigned: true,
        });

        Ok(included)
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Forget the assignment for `name`; returns true if one existed
    ///
    /// On failure the previous assignment stays in place.
    pub async fn reset(&self, name: impl AsRef<str>) -> Result<bool, DomainError> {
        let name = parse_name(name.as_ref())?;

        let _guard = self.locks.acquire(&name).await?;
        let removed = self.store.delete(&name).await.map_err(|e| {
            let e = as_store_unavailable(e);
            warn!(experiment = %name, error = %e, "Failed to reset assignment");
            e
        })?;

        info!(experiment = %name, removed, "Experiment reset");
        self.emit(|| ExperimentEvent::DidReset { name: name.clone() });

        Ok(removed)
    }

    /// Stored assignment for `name`, without drawing one
    pub async fn assignment(
        &self,
        name: impl AsRef<str>,
    ) -> Result<Option<StoredAssignment>, DomainError> {
        let name = parse_name(name.as_ref())?;
        self.load(&name).await
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    async fn resolve_condition<C: ConditionValue>(
        &self,
        name: &str,
        kind: ExperimentKind,
        conditions: &WeightedSet<C>,
    ) -> Result<C, DomainError> {
        let name = parse_name(name)?;
        conditions.total_weight()?;

        let _guard = self.locks.acquire(&name).await?;
        let cached = self.load(&name).await?;
        self.emit(|| ExperimentEvent::WillResolve {
            name: name.clone(),
            kind,
            cached: cached.as_ref().map(|r| r.assignment().clone()),
        });

        if let Some(record) = cached {
            let condition = record.assignment().decode_condition::<C>()?;
            debug!(experiment = %name, kind = %kind, "Returning stored assignment");
            self.emit(|| ExperimentEvent::DidResolve {
                name: name.clone(),
                kind,
                assignment: record.assignment().clone(),
                newly_assigned: false,
            });
            return Ok(condition);
        }

        let condition = self.sampler.draw(conditions)?.clone();
        let assignment = Assignment::condition(&condition)?;
        self.persist(StoredAssignment::new(name.clone(), kind, assignment.clone()))
            .await?;

        info!(
            experiment = %name,
            kind = %kind,
            conditions = conditions.len(),
            "Assigned new variant"
        );
        self.emit(|| ExperimentEvent::DidResolve {
            name: name.clone(),
            kind,
            assignment,
            newly_assigned: true,
        });

        Ok(condition)
    }

    async fn load(&self, name: &ExperimentName) -> Result<Option<StoredAssignment>, DomainError> {
        self.store.load(name).await.map_err(|e| {
            let e = as_store_unavailable(e);
            warn!(experiment = %name, error = %e, "Failed to load assignment");
            e
        })
    }

    async fn persist(&self, record: StoredAssignment) -> Result<(), DomainError> {
        let name = record.name().clone();
        self.store.save(record).await.map_err(|e| {
            let e = as_store_unavailable(e);
            warn!(experiment = %name, error = %e, "Failed to save assignment");
            e
        })
    }

    fn emit(&self, event: impl FnOnce() -> ExperimentEvent) {
        if self.observers.is_empty() {
            return;
        }

        let event = event();
        for observer in &self.observers {
            observer.notify(&event);
        }
    }
}

fn parse_name(name: &str) -> Result<ExperimentName, DomainError> {
    Ok(ExperimentName::new(name)?)
}

/// Any failure reported by the store surfaces to callers as `StoreUnavailable`
fn as_store_unavailable(err: DomainError) -> DomainError {
    match err {
        DomainError::StoreUnavailable { .. } => err,
        other => DomainError::store_unavailable(other.to_string()),
    }
}
