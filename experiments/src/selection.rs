use common::Hyperparams;
use indexmap::IndexMap;

/// Explicit problem id to model ids mapping restricting which pairs are run
pub type Restriction = IndexMap<String, Vec<String>>;

/// A problem taking part in an experiment
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSpec {
    /// Registry id
    pub id: String,
    /// Overrides of the registered defaults, empty for all defaults
    pub params: Hyperparams,
}

impl ProblemSpec {
    /// A problem with default hyperparameters
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            params: Hyperparams::new(),
        }
    }

    /// Builder style hyperparameter override
    pub fn with_params(mut self, params: Hyperparams) -> Self {
        self.params = params;
        self
    }
}

/// A model taking part in an experiment.
/// `key` is the id the results are stored under, which differs from `id`
/// once the same model was added multiple times.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    /// Registry id
    pub id: String,
    /// Unique key within the experiment
    pub key: String,
    /// Overrides of the registered defaults, empty for all defaults
    pub params: Hyperparams,
    /// Optional display name used to derive the key
    pub name: Option<String>,
    /// Whether the model consumes lagged observations
    pub uses_regressors: bool,
}

impl ModelSpec {
    /// A model with default hyperparameters, stored under its id
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            key: id.to_string(),
            params: Hyperparams::new(),
            name: None,
            uses_regressors: false,
        }
    }

    /// Builder style hyperparameter override
    pub fn with_params(mut self, params: Hyperparams) -> Self {
        self.params = params;
        self
    }
}

/// Problems or models selected for an experiment, either plain ids or ids with hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Ids with default hyperparameters
    Ids(Vec<String>),
    /// Ids with explicit hyperparameters
    WithParams(IndexMap<String, Hyperparams>),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Ids(vec![])
    }
}

impl Selection {
    /// Both forms normalize to the same insertion ordered mapping
    pub fn normalize(&self) -> IndexMap<String, Hyperparams> {
        match self {
            Selection::Ids(ids) => ids.iter().map(|id| (id.clone(), Hyperparams::new())).collect(),
            Selection::WithParams(map) => map.clone(),
        }
    }

    /// Whether any non-default hyperparameter was supplied
    pub fn has_explicit_params(&self) -> bool {
        match self {
            Selection::Ids(_) => false,
            Selection::WithParams(map) => map.values().any(|p| !p.is_empty()),
        }
    }

    /// Number of selected ids
    pub fn len(&self) -> usize {
        match self {
            Selection::Ids(ids) => ids.len(),
            Selection::WithParams(map) => map.len(),
        }
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<String>> for Selection {
    fn from(ids: Vec<String>) -> Self {
        Selection::Ids(ids)
    }
}

impl From<&[&str]> for Selection {
    fn from(ids: &[&str]) -> Self {
        Selection::Ids(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(ids: [&str; N]) -> Self {
        Selection::Ids(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl From<IndexMap<String, Hyperparams>> for Selection {
    fn from(map: IndexMap<String, Hyperparams>) -> Self {
        Selection::WithParams(map)
    }
}

impl<const N: usize> From<[(&str, Hyperparams); N]> for Selection {
    fn from(entries: [(&str, Hyperparams); N]) -> Self {
        Selection::WithParams(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_forms_normalize_alike() {
        let ids = Selection::from(["ARMA-v0", "LDS-v0"]);
        let mapped = Selection::from([("ARMA-v0", Hyperparams::new()), ("LDS-v0", Hyperparams::new())]);
        assert_eq!(ids.normalize(), mapped.normalize());
        assert_eq!(
            ids.normalize().keys().collect::<Vec<_>>(),
            vec!["ARMA-v0", "LDS-v0"]
        );
        assert!(!mapped.has_explicit_params());

        let explicit = Selection::from([("ARMA-v0", Hyperparams::new().with("p", 2_usize))]);
        assert!(explicit.has_explicit_params());
        assert_eq!(explicit.len(), 1);
    }
}
