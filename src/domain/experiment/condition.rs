//! Condition and variable sets handed to the assignment engine

use serde::{Deserialize, Serialize};

use super::validation::{validate_probability, validate_weights, ExperimentValidationError};

/// Inclusion probability given to a variable when none is specified
pub const DEFAULT_INCLUSION_PROBABILITY: f64 = 0.5;

// ============================================================================
// Weighted conditions
// ============================================================================

/// A condition paired with its relative weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub item: T,
    pub weight: f64,
}

impl<T> Weighted<T> {
    pub fn new(item: T, weight: f64) -> Self {
        Self { item, weight }
    }
}

/// Ordered set of conditions with relative weights
///
/// Order matters: the sampler scans cumulative weights front to back, so ties
/// resolve toward the earlier entry. Weights are relative and need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedSet<T> {
    entries: Vec<Weighted<T>>,
}

impl<T> Default for WeightedSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> WeightedSet<T> {
    /// Every condition equally likely
    pub fn uniform(items: impl IntoIterator<Item = T>) -> Self {
        items.into_iter().map(|item| (item, 1.0)).collect()
    }

    /// Explicit relative weights, validated when sampled
    pub fn weighted(pairs: impl IntoIterator<Item = (T, f64)>) -> Self {
        pairs.into_iter().collect()
    }

    /// The two-condition A/B shape
    pub fn binary(a: T, b: T) -> Self {
        Self::weighted([(a, 0.5), (b, 0.5)])
    }

    pub fn push(&mut self, item: T, weight: f64) {
        self.entries.push(Weighted::new(item, weight));
    }

    pub fn with(mut self, item: T, weight: f64) -> Self {
        self.push(item, weight);
        self
    }

    pub fn entries(&self) -> &[Weighted<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Weighted<T>> {
        self.entries.iter()
    }

    /// Validates every weight and returns the positive total
    pub fn total_weight(&self) -> Result<f64, ExperimentValidationError> {
        validate_weights(self.entries.iter().map(|e| e.weight))
    }
}

impl<T> FromIterator<(T, f64)> for WeightedSet<T> {
    fn from_iter<I: IntoIterator<Item = (T, f64)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(item, weight)| Weighted::new(item, weight))
                .collect(),
        }
    }
}

// ============================================================================
// Legacy choices
// ============================================================================

/// Loosely-shaped condition input accepted by the legacy entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choices<C> {
    /// Weighted pairs, e.g. `[["red", 0.8], ["blue", 0.2]]`
    Weighted(Vec<(C, f64)>),
    /// Plain list, each entry equally likely
    List(Vec<C>),
}

impl<C> From<Choices<C>> for WeightedSet<C> {
    fn from(choices: Choices<C>) -> Self {
        match choices {
            Choices::List(items) => WeightedSet::uniform(items),
            Choices::Weighted(pairs) => WeightedSet::weighted(pairs),
        }
    }
}

// ============================================================================
// Multivariate factors
// ============================================================================

/// A variable with its independent inclusion probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor<V> {
    pub variable: V,
    pub probability: f64,
}

impl<V> Factor<V> {
    pub fn new(variable: V, probability: f64) -> Self {
        Self {
            variable,
            probability,
        }
    }
}

/// Variables of a multivariate experiment, each included or not on its own draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables<V> {
    factors: Vec<Factor<V>>,
}

impl<V> Default for Variables<V> {
    fn default() -> Self {
        Self {
            factors: Vec::new(),
        }
    }
}

impl<V> Variables<V> {
    /// Every variable gets a coin flip
    pub fn even(variables: impl IntoIterator<Item = V>) -> Self {
        variables
            .into_iter()
            .map(|v| (v, DEFAULT_INCLUSION_PROBABILITY))
            .collect()
    }

    pub fn with_probabilities(pairs: impl IntoIterator<Item = (V, f64)>) -> Self {
        pairs.into_iter().collect()
    }

    pub fn push(&mut self, variable: V, probability: f64) {
        self.factors.push(Factor::new(variable, probability));
    }

    pub fn factors(&self) -> &[Factor<V>] {
        &self.factors
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Every probability must lie in [0, 1]; out-of-range values are rejected, never clamped
    pub fn validate(&self) -> Result<(), ExperimentValidationError> {
        for (index, factor) in self.factors.iter().enumerate() {
            validate_probability(index, factor.probability)?;
        }
        Ok(())
    }
}

impl<V> FromIterator<(V, f64)> for Variables<V> {
    fn from_iter<I: IntoIterator<Item = (V, f64)>>(iter: I) -> Self {
        Self {
            factors: iter
                .into_iter()
                .map(|(variable, probability)| Factor::new(variable, probability))
                .collect(),
        }
    }
}

// ============================================================================
// VariableSet
// ============================================================================

/// Variables included in a multivariate assignment
///
/// Keeps declaration order and holds each variable at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSet<V> {
    variables: Vec<V>,
}

impl<V> Default for VariableSet<V> {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
        }
    }
}

impl<V: PartialEq> VariableSet<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the variable was already present
    pub fn insert(&mut self, variable: V) -> bool {
        if self.variables.contains(&variable) {
            return false;
        }
        self.variables.push(variable);
        true
    }

    pub fn contains(&self, variable: &V) -> bool {
        self.variables.contains(variable)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.variables.iter()
    }

    pub fn into_vec(self) -> Vec<V> {
        self.variables
    }
}

impl<V: PartialEq> FromIterator<V> for VariableSet<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut set = Self::new();
        for variable in iter {
            set.insert(variable);
        }
        set
    }
}

impl<V> IntoIterator for VariableSet<V> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_weights() {
        let set = WeightedSet::uniform(["a", "b", "c"]);
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|e| e.weight == 1.0));
        assert_eq!(set.total_weight(), Ok(3.0));
    }

    #[test]
    fn test_binary_shape() {
        let set = WeightedSet::binary("A", "B");
        assert_eq!(set.entries()[0], Weighted::new("A", 0.5));
        assert_eq!(set.entries()[1], Weighted::new("B", 0.5));
    }

    #[test]
    fn test_empty_set_rejected() {
        let set: WeightedSet<&str> = WeightedSet::default();
        assert_eq!(
            set.total_weight(),
            Err(ExperimentValidationError::EmptyConditions)
        );
    }

    #[test]
    fn test_zero_weight_entry_kept() {
        let set = WeightedSet::weighted([("never", 0.0), ("always", 2.0)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_weight(), Ok(2.0));
    }

    #[test]
    fn test_choices_from_list_and_pairs() {
        let list: WeightedSet<&str> = Choices::List(vec!["x", "y"]).into();
        assert_eq!(list, WeightedSet::uniform(["x", "y"]));

        let pairs: WeightedSet<&str> = Choices::Weighted(vec![("x", 3.0), ("y", 1.0)]).into();
        assert_eq!(pairs.entries()[0].weight, 3.0);
    }

    #[test]
    fn test_choices_untagged_json() {
        let list: Choices<String> = serde_json::from_str(r#"["red", "blue"]"#).unwrap();
        assert!(matches!(list, Choices::List(ref v) if v.len() == 2));

        let weighted: Choices<String> =
            serde_json::from_str(r#"[["red", 0.8], ["blue", 0.2]]"#).unwrap();
        assert!(matches!(weighted, Choices::Weighted(ref v) if v[0].1 == 0.8));
    }

    #[test]
    fn test_variables_even_probability() {
        let vars = Variables::even(["banner", "badge"]);
        assert!(vars
            .factors()
            .iter()
            .all(|f| f.probability == DEFAULT_INCLUSION_PROBABILITY));
        assert!(vars.validate().is_ok());
    }

    #[test]
    fn test_variables_out_of_range() {
        let vars = Variables::with_probabilities([("banner", 0.3), ("badge", 1.2)]);
        assert_eq!(
            vars.validate(),
            Err(ExperimentValidationError::ProbabilityOutOfRange {
                index: 1,
                probability: 1.2
            })
        );
    }

    #[test]
    fn test_variable_set_dedupes_in_order() {
        let set: VariableSet<&str> = ["b", "a", "b", "c"].into_iter().collect();
        assert_eq!(set.into_vec(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_variable_set_contains() {
        let mut set = VariableSet::new();
        assert!(set.insert("hero"));
        assert!(!set.insert("hero"));
        assert!(set.contains(&"hero"));
        assert!(!set.contains(&"footer"));
        assert_eq!(set.len(), 1);
    }
}
