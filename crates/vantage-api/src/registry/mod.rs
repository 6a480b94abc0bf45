use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap as Map, BTreeSet as Set};
use tracing::{debug, trace};

mod builtin;
mod params;

pub use builtin::{ALPHA_VANTAGE, OPENAI};
pub use params::ParameterSet;

/// A single external data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub functions: Map<String, FunctionConfig>,
}

/// The parameter contract of one function offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Declaration order is the order missing names are reported in.
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Set<String>,
    #[serde(default)]
    pub defaults: ParameterSet,
    #[serde(default)]
    pub current_values: ParameterSet,
}

impl FunctionConfig {
    pub fn is_declared(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name) || self.optional.contains(name)
    }

    /// Keys present in `defaults` or `current_values` that are neither required nor optional.
    ///
    /// These are accepted as-is; callers may warn about them.
    pub fn undeclared_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .defaults
            .keys()
            .chain(self.current_values.keys())
            .filter(|k| !self.is_declared(k))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

/// Provider → function → parameter table.
///
/// Constructed once at startup and handed to whoever needs it:
/// ```ignore
/// let mut registry = Registry::builtin();
/// registry.update_current_values("alpha_vantage", "GLOBAL_QUOTE", [("symbol", "AAPL")])?;
/// let url = vantage_api::build_url(&registry, "alpha_vantage", "GLOBAL_QUOTE", &key, &ParameterSet::new())?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    providers: Map<String, ProviderConfig>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_provider(&mut self, name: impl Into<String>, config: ProviderConfig) {
        self.providers.insert(name.into(), config);
    }

    pub fn provider(&self, name: &str) -> Result<&ProviderConfig> {
        self.providers.get(name).ok_or_else(|| Error::provider(name))
    }

    pub fn function(&self, provider: &str, function: &str) -> Result<&FunctionConfig> {
        self.provider(provider)?
            .functions
            .get(function)
            .ok_or_else(|| Error::function(provider, function))
    }

    fn function_mut(&mut self, provider: &str, function: &str) -> Result<&mut FunctionConfig> {
        self.providers
            .get_mut(provider)
            .ok_or_else(|| Error::provider(provider))?
            .functions
            .get_mut(function)
            .ok_or_else(|| Error::function(provider, function))
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Function names of `provider`, sorted.
    pub fn functions(&self, provider: &str) -> Result<Vec<&str>> {
        Ok(self
            .provider(provider)?
            .functions
            .keys()
            .map(String::as_str)
            .collect())
    }

    /// A copy of the function's current values; changing it leaves the registry untouched.
    pub fn get_current_values(&self, provider: &str, function: &str) -> Result<ParameterSet> {
        Ok(self.function(provider, function)?.current_values.clone())
    }

    /// Insert-or-overwrite each of `updates` into the function's current values.
    ///
    /// Keys are not checked against the declared parameters.
    pub fn update_current_values<I, K, V>(
        &mut self,
        provider: &str,
        function: &str,
        updates: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config = self.function_mut(provider, function)?;
        for (key, value) in updates {
            let (key, value) = (key.into(), value.into());
            trace!("{provider}/{function}: {key} = {value}");
            config.current_values.insert(key, value);
        }
        Ok(())
    }

    /// Every function must declare at least one required parameter.
    pub fn validate(&self) -> Result<()> {
        for (provider, config) in &self.providers {
            for (function, func) in &config.functions {
                if func.required.is_empty() {
                    return Err(Error::InvalidParam(format!(
                        "{provider}/{function} declares no required parameters"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Overlay `other` onto `self`; same-named functions are replaced, new ones added.
    ///
    /// A provider's `base_url` is taken from `other` when it already exists here.
    pub fn merge(&mut self, other: Registry) {
        for (name, incoming) in other.providers {
            match self.providers.get_mut(&name) {
                Some(existing) => {
                    debug!("overlaying provider {name}");
                    existing.base_url = incoming.base_url;
                    existing.functions.extend(incoming.functions);
                }
                None => {
                    debug!("adding provider {name}");
                    self.providers.insert(name, incoming);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_current_values_returns_copy() {
        let registry = Registry::builtin();
        let mut values = registry
            .get_current_values("alpha_vantage", "GLOBAL_QUOTE")
            .unwrap();
        values.insert("symbol", "MUTATED");
        values.insert("extra", "1");

        let again = registry
            .get_current_values("alpha_vantage", "GLOBAL_QUOTE")
            .unwrap();
        assert_eq!(again.get("symbol"), Some("NVDA"));
        assert!(!again.contains_key("extra"));
    }

    #[test]
    fn test_unknown_names() {
        let mut registry = Registry::builtin();
        assert!(matches!(
            registry.get_current_values("nope", "GLOBAL_QUOTE"),
            Err(Error::NotFound { kind: "provider", .. })
        ));
        assert!(matches!(
            registry.get_current_values("alpha_vantage", "NOPE"),
            Err(Error::NotFound { kind: "function", .. })
        ));
        assert!(matches!(
            registry.update_current_values("alpha_vantage", "NOPE", [("a", "b")]),
            Err(Error::NotFound { kind: "function", .. })
        ));
    }

    #[test]
    fn test_update_current_values() {
        let mut registry = Registry::builtin();
        registry
            .update_current_values(
                "alpha_vantage",
                "GLOBAL_QUOTE",
                [("symbol", "AAPL"), ("datatype", "csv")],
            )
            .unwrap();

        let values = registry
            .get_current_values("alpha_vantage", "GLOBAL_QUOTE")
            .unwrap();
        assert_eq!(
            values.to_query(),
            "function=GLOBAL_QUOTE&symbol=AAPL&datatype=csv"
        );
    }

    #[test]
    fn test_update_accepts_undeclared_keys() {
        let mut registry = Registry::builtin();
        registry
            .update_current_values("alpha_vantage", "GLOBAL_QUOTE", [("colour", "blue")])
            .unwrap();

        let func = registry.function("alpha_vantage", "GLOBAL_QUOTE").unwrap();
        assert_eq!(func.undeclared_keys(), ["colour"]);
    }

    #[test]
    fn test_builtin_is_valid() {
        let registry = Registry::builtin();
        registry.validate().unwrap();
        for provider in registry.providers() {
            for function in registry.functions(provider).unwrap() {
                let func = registry.function(provider, function).unwrap();
                assert!(
                    func.undeclared_keys().is_empty(),
                    "{provider}/{function} has undeclared keys"
                );
            }
        }
    }

    #[test]
    fn test_merge_overlay() {
        let mut registry = Registry::builtin();
        let overlay: Registry = serde_json::from_str(
            r#"{
                "alpha_vantage": {
                    "base_url": "https://www.alphavantage.co/query",
                    "functions": {
                        "GLOBAL_QUOTE": {
                            "required": ["function", "symbol", "apikey"],
                            "current_values": { "function": "GLOBAL_QUOTE", "symbol": "MSFT" }
                        }
                    }
                },
                "fred": {
                    "base_url": "https://api.stlouisfed.org/fred/series/observations",
                    "functions": {
                        "observations": {
                            "required": ["series_id", "api_key"],
                            "optional": ["file_type"],
                            "defaults": { "file_type": "json" }
                        }
                    }
                }
            }"#,
        )
        .unwrap();
        overlay.validate().unwrap();
        registry.merge(overlay);

        let quote = registry.function("alpha_vantage", "GLOBAL_QUOTE").unwrap();
        assert_eq!(quote.current_values.get("symbol"), Some("MSFT"));
        assert!(quote.defaults.is_empty());

        // untouched functions survive the overlay
        assert!(registry.function("alpha_vantage", "NEWS_SENTIMENT").is_ok());
        assert!(registry.function("fred", "observations").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_required() {
        let registry: Registry = serde_json::from_str(
            r#"{ "p": { "base_url": "http://x", "functions": { "f": { "required": [] } } } }"#,
        )
        .unwrap();
        assert!(matches!(registry.validate(), Err(Error::InvalidParam(_))));
    }

    #[test]
    fn test_technical_indicators_declare_outputsize() {
        let registry = Registry::builtin();
        for name in ["ADX", "WILLR"] {
            let func = registry.function("alpha_vantage", name).unwrap();
            assert!(func.is_declared("outputsize"));
            assert!(func.is_declared("datatype"));
            assert_eq!(func.defaults.get("outputsize"), Some("compact"));
            assert!(func.undeclared_keys().is_empty());
        }

        let url = crate::build_url(&registry, "alpha_vantage", "ADX", "K", &ParameterSet::new()).unwrap();
        assert!(url.contains("outputsize=compact"));
        assert!(url.contains("time_period=30"));
    }
}
