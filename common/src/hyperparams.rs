use std::{collections::BTreeMap, fmt};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Named hyperparameters of a problem or model.
/// Keys are kept sorted so that printing is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hyperparams {
    values: BTreeMap<String, Value>,
}

impl Hyperparams {
    /// An empty set, meaning "use the defaults"
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a json object such as `{"h": 64, "optimizer": "Adagrad"}`
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            other => Err(Error::Hyperparams(format!("expected an object, got {}", other))),
        }
    }

    /// The json object holding every entry
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone().into_iter().collect())
    }

    /// Builder style insertion
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Raw access to a value
    #[inline(always)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The value of `key` if it is a string
    #[inline(always)]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Whether a key was supplied
    #[inline(always)]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of supplied values
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value was supplied
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `self` on top of `defaults`, values in `self` win
    pub fn merged_over(&self, defaults: &Hyperparams) -> Hyperparams {
        let mut out = defaults.clone();
        out.values.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }
}

impl fmt::Display for Hyperparams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match v {
                Value::String(s) => write!(f, "{}: {}", k, s)?,
                other => write!(f, "{}: {}", k, other)?,
            }
        }
        write!(f, "}}")
    }
}

/// A typed parameter struct read from [`Hyperparams`].
/// Implementors derive serde with `#[serde(default)]` so that missing keys take the `Default` value.
pub trait HyperparamSet: Serialize + DeserializeOwned + Default {
    /// Reject values that deserialize fine but make no sense
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Deserialize and validate
    fn from_hyperparams(params: &Hyperparams) -> Result<Self> {
        let out: Self = serde_json::from_value(params.to_value())
            .map_err(|e| Error::Hyperparams(e.to_string()))?;
        out.validate()?;

        Ok(out)
    }

    /// Write every field out
    fn to_hyperparams(&self) -> Hyperparams {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Hyperparams {
                values: map.into_iter().collect(),
            },
            _ => Hyperparams::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct Params {
        #[serde(rename = "h")]
        hidden_size: usize,
        lr: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        phi: Option<Vec<f64>>,
    }

    impl Default for Params {
        fn default() -> Self {
            Self {
                hidden_size: 64,
                lr: 0.003,
                phi: None,
            }
        }
    }

    impl HyperparamSet for Params {
        fn validate(&self) -> Result<()> {
            if self.hidden_size == 0 {
                return Err(Error::invalid_param("h", "must be positive"));
            }
            Ok(())
        }
    }

    #[test]
    fn missing_keys_take_defaults() {
        let p = Params::from_hyperparams(&Hyperparams::new().with("h", 32_usize)).unwrap();
        assert_eq!(p.hidden_size, 32);
        assert_eq!(p.lr, 0.003);
        assert_eq!(p.phi, None);

        // integers are accepted where floats are expected
        let p = Params::from_hyperparams(&Hyperparams::new().with("lr", 1_i64)).unwrap();
        assert_eq!(p.lr, 1.0);

        let p = Params::from_hyperparams(&Hyperparams::new().with("phi", vec![0.5, 0.2])).unwrap();
        assert_eq!(p.phi, Some(vec![0.5, 0.2]));
    }

    #[test]
    fn wrong_type_or_value_is_an_error() {
        let p = Hyperparams::new().with("h", "many");
        assert!(matches!(Params::from_hyperparams(&p), Err(Error::Hyperparams(_))));

        let p = Hyperparams::new().with("h", -3_i64);
        assert!(Params::from_hyperparams(&p).is_err());

        let p = Hyperparams::new().with("h", 0_usize);
        assert!(matches!(
            Params::from_hyperparams(&p),
            Err(Error::InvalidParam { ref key, .. }) if key == "h"
        ));
    }

    #[test]
    fn defaults_written_out() {
        let hp = Params::default().to_hyperparams();
        assert_eq!(hp.get("h"), Some(&json!(64)));
        assert!(!hp.contains("phi"));
        assert_eq!(Params::from_hyperparams(&hp).unwrap(), Params::default());
    }

    #[test]
    fn merge_prefers_overrides() {
        let defaults = Hyperparams::new().with("h", 64_usize).with("lr", 0.003);
        let merged = Hyperparams::new().with("lr", 0.1).with("optimizer", "OGD").merged_over(&defaults);
        assert_eq!(merged.get("h"), Some(&json!(64)));
        assert_eq!(merged.get_str("optimizer"), Some("OGD"));
        assert_eq!(merged.to_string(), "{h: 64, lr: 0.1, optimizer: OGD}");
    }

    #[test]
    fn from_json_object() {
        let hp = Hyperparams::from_value(json!({"h": 8, "optimizer": "Adagrad"})).unwrap();
        assert_eq!(hp.len(), 2);
        assert!(Hyperparams::from_value(json!([1, 2])).is_err());
    }
}
