use crate::error::{Error, Result};
use crate::registry::{ParameterSet, Registry};
use std::str::FromStr;
use tracing::trace;

/// Name under which the API key is injected into every request.
pub const API_KEY_PARAM: &str = "apikey";

/// Build the full request URL for `provider`/`function`.
///
/// Parameters are merged in increasing precedence, each stage overwriting the last:
/// 1. the function's defaults
/// 2. the function's current values
/// 3. `apikey` = `api_key`
/// 4. `overrides`
///
/// Every required parameter must be present after merging. Values are written verbatim;
/// nothing is percent-encoded.
pub fn build_url(
    registry: &Registry,
    provider: &str,
    function: &str,
    api_key: &str,
    overrides: &ParameterSet,
) -> Result<String> {
    let params = merge_parameters(registry, provider, function, api_key, overrides)?;
    let base_url = &registry.provider(provider)?.base_url;
    Ok(format!("{base_url}?{}", params.to_query()))
}

/// Steps 1-4 of [`build_url()`], plus the required-parameter check.
///
/// [`build_url()`]: ./fn.build_url.html
pub fn merge_parameters(
    registry: &Registry,
    provider: &str,
    function: &str,
    api_key: &str,
    overrides: &ParameterSet,
) -> Result<ParameterSet> {
    let config = registry.function(provider, function)?;

    let mut params = config.defaults.clone();
    params.extend(config.current_values.iter());
    params.insert(API_KEY_PARAM, api_key);
    params.extend(overrides.iter());

    let missing: Vec<String> = config
        .required
        .iter()
        .filter(|name| !params.contains_key(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingParameter(missing));
    }

    trace!("merged parameters for {provider}/{function}: {:?}", params.keys().collect::<Vec<_>>());
    Ok(params)
}

/// Replace the value of `apikey` in `url` with `***`, for logs & diagnostics.
pub fn redact(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((API_KEY_PARAM, _)) => format!("{API_KEY_PARAM}=***"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}

/// A single `KEY=VALUE` override, as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl FromStr for Param {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidParam(format!("expected KEY=VALUE, found \"{s}\"")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidParam(format!("empty key in \"{s}\"")));
        }
        Ok(Param {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl FromIterator<Param> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        iter.into_iter().map(|p| (p.key, p.value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> ParameterSet {
        ParameterSet::new()
    }

    #[test]
    fn test_global_quote_defaults() {
        let registry = Registry::builtin();
        let url = build_url(&registry, "alpha_vantage", "GLOBAL_QUOTE", "DEMOKEY", &none()).unwrap();
        assert_eq!(
            url,
            "https://www.alphavantage.co/query?datatype=json&function=GLOBAL_QUOTE&symbol=NVDA&apikey=DEMOKEY"
        );
    }

    #[test]
    fn test_news_sentiment_order() {
        let registry = Registry::builtin();
        let url = build_url(&registry, "alpha_vantage", "NEWS_SENTIMENT", "K", &none()).unwrap();
        assert_eq!(
            url,
            "https://www.alphavantage.co/query?sort=LATEST&limit=100&function=NEWS_SENTIMENT\
             &topics=technology,retail_wholesale,real_estate&tickers=NVDA,AAPL,MSFT\
             &time_from=20250101T0000&time_to=20250630T2359&apikey=K"
        );
    }

    #[test]
    fn test_override_wins_and_new_keys_append() {
        let registry = Registry::builtin();
        let overrides = ParameterSet::from([("symbol", "X"), ("extra", "1")]);
        let url = build_url(&registry, "alpha_vantage", "GLOBAL_QUOTE", "K", &overrides).unwrap();
        assert!(url.contains("symbol=X"));
        assert!(!url.contains("symbol=NVDA"));
        assert!(url.ends_with("&apikey=K&extra=1"));
    }

    #[test]
    fn test_override_can_replace_api_key() {
        let registry = Registry::builtin();
        let overrides = ParameterSet::from([("apikey", "OTHER")]);
        let params =
            merge_parameters(&registry, "alpha_vantage", "GLOBAL_QUOTE", "K", &overrides).unwrap();
        assert_eq!(params.get("apikey"), Some("OTHER"));
    }

    #[test]
    fn test_missing_required_lists_all_in_declaration_order() {
        let mut registry = Registry::builtin();
        let overrides = ParameterSet::new();

        // openai never supplies `messages`
        let err = build_url(&registry, "openai", "chat_completions", "K", &overrides).unwrap_err();
        assert!(matches!(err, Error::MissingParameter(ref m) if m == &["messages"]));

        // strip `function` & `symbol` from GLOBAL_QUOTE
        let mut quote = registry.function("alpha_vantage", "GLOBAL_QUOTE").unwrap().clone();
        quote.current_values = ParameterSet::new();
        let mut provider = registry.provider("alpha_vantage").unwrap().clone();
        provider.functions.insert("GLOBAL_QUOTE".into(), quote);
        registry.insert_provider("alpha_vantage", provider);

        let err = build_url(&registry, "alpha_vantage", "GLOBAL_QUOTE", "K", &overrides).unwrap_err();
        assert!(
            matches!(err, Error::MissingParameter(ref m) if m == &["function", "symbol"])
        );
    }

    #[test]
    fn test_unknown_provider() {
        let registry = Registry::builtin();
        let err = build_url(&registry, "nope", "X", "key", &none()).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "provider", .. }));
    }

    #[test]
    fn test_build_does_not_touch_registry() {
        let registry = Registry::builtin();
        let before = registry.clone();
        let overrides = ParameterSet::from([("symbol", "X")]);
        build_url(&registry, "alpha_vantage", "GLOBAL_QUOTE", "K", &overrides).unwrap();
        assert_eq!(registry, before);
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://x/query?function=F&apikey=SECRET&symbol=S"),
            "https://x/query?function=F&apikey=***&symbol=S"
        );
        assert_eq!(redact("https://x/query?apikey="), "https://x/query?apikey=***");
        assert_eq!(redact("https://x/query"), "https://x/query");
    }

    #[test]
    fn test_param_from_str() {
        let p: Param = "time_from=20240101T0000".parse().unwrap();
        assert_eq!(p.key, "time_from");
        assert_eq!(p.value, "20240101T0000");

        let p: Param = "topics=a=b".parse().unwrap();
        assert_eq!(p.value, "a=b");

        assert!("symbol".parse::<Param>().is_err());
        assert!("=x".parse::<Param>().is_err());
    }
}
