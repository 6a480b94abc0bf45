use super::{FunctionConfig, ParameterSet, ProviderConfig, Registry};
use std::collections::BTreeMap as Map;

pub const ALPHA_VANTAGE: &str = "alpha_vantage";
pub const OPENAI: &str = "openai";

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Core stock time series sharing the `symbol`/`outputsize`/`datatype` contract.
const TIME_SERIES: [&str; 5] = [
    "TIME_SERIES_DAILY",
    "TIME_SERIES_WEEKLY",
    "TIME_SERIES_MONTHLY",
    "TIME_SERIES_WEEKLY_ADJUSTED",
    "TIME_SERIES_MONTHLY_ADJUSTED",
];

/// Company fundamentals keyed by `symbol`, JSON only.
const FUNDAMENTALS: [&str; 7] = [
    "OVERVIEW",
    "DIVIDENDS",
    "SPLITS",
    "INCOME_STATEMENT",
    "BALANCE_SHEET",
    "CASH_FLOW",
    "EARNINGS",
];

const COMMODITIES: [&str; 11] = [
    "WTI",
    "BRENT",
    "NATURAL_GAS",
    "COPPER",
    "ALUMINUM",
    "WHEAT",
    "CORN",
    "COTTON",
    "SUGAR",
    "COFFEE",
    "ALL_COMMODITIES",
];

const ECONOMIC_INDICATORS: [&str; 2] = ["REAL_GDP", "REAL_GDP_PER_CAPITA"];

const TECHNICAL_INDICATORS: [&str; 2] = ["ADX", "WILLR"];

fn func(
    required: &[&str],
    optional: &[&str],
    defaults: &[(&str, &str)],
    current_values: &[(&str, &str)],
) -> FunctionConfig {
    FunctionConfig {
        required: required.iter().map(|s| s.to_string()).collect(),
        optional: optional.iter().map(|s| s.to_string()).collect(),
        defaults: defaults.iter().copied().collect::<ParameterSet>(),
        current_values: current_values.iter().copied().collect::<ParameterSet>(),
    }
}

fn alpha_vantage() -> ProviderConfig {
    let mut functions = Map::from([
        (
            "NEWS_SENTIMENT".to_string(),
            func(
                &["function", "apikey"],
                &["tickers", "topics", "time_from", "time_to", "sort", "limit"],
                &[("sort", "LATEST"), ("limit", "50")],
                &[
                    ("function", "NEWS_SENTIMENT"),
                    ("topics", "technology,retail_wholesale,real_estate"),
                    ("tickers", "NVDA,AAPL,MSFT"),
                    ("time_from", "20250101T0000"),
                    ("time_to", "20250630T2359"),
                    ("limit", "100"),
                ],
            ),
        ),
        (
            "TIME_SERIES_DAILY_ADJUSTED".to_string(),
            func(
                &["function", "symbol", "apikey"],
                &["outputsize", "datatype"],
                &[("outputsize", "compact"), ("datatype", "json")],
                &[
                    ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                    ("symbol", "NVDA"),
                    ("outputsize", "full"),
                    ("datatype", "csv"),
                ],
            ),
        ),
        (
            "GLOBAL_QUOTE".to_string(),
            func(
                &["function", "symbol", "apikey"],
                &["datatype"],
                &[("datatype", "json")],
                &[("function", "GLOBAL_QUOTE"), ("symbol", "NVDA")],
            ),
        ),
        (
            "SYMBOL_SEARCH".to_string(),
            func(
                &["function", "keywords", "apikey"],
                &["datatype"],
                &[("datatype", "json")],
                &[("function", "SYMBOL_SEARCH"), ("keywords", "nvidia")],
            ),
        ),
        (
            "TIME_SERIES_INTRADAY".to_string(),
            func(
                &["function", "symbol", "interval", "apikey"],
                &["adjusted", "extended_hours", "month", "outputsize", "datatype"],
                &[("outputsize", "compact"), ("datatype", "json")],
                &[
                    ("function", "TIME_SERIES_INTRADAY"),
                    ("symbol", "NVDA"),
                    ("interval", "5min"),
                ],
            ),
        ),
        (
            "LISTING_STATUS".to_string(),
            func(
                &["function", "apikey"],
                &["date", "state", "datatype"],
                &[],
                &[("function", "LISTING_STATUS"), ("datatype", "csv")],
            ),
        ),
        (
            "EARNINGS_CALENDAR".to_string(),
            func(
                &["function", "apikey"],
                &["symbol", "horizon", "datatype"],
                &[],
                &[("function", "EARNINGS_CALENDAR"), ("datatype", "csv")],
            ),
        ),
        (
            "IPO_CALENDAR".to_string(),
            func(
                &["function", "apikey"],
                &["horizon", "datatype"],
                &[],
                &[
                    ("function", "IPO_CALENDAR"),
                    ("horizon", "12month"),
                    ("datatype", "csv"),
                ],
            ),
        ),
    ]);

    for name in TIME_SERIES {
        functions.insert(
            name.to_string(),
            func(
                &["function", "symbol", "apikey"],
                &["outputsize", "datatype"],
                &[("outputsize", "compact"), ("datatype", "json")],
                &[("function", name), ("symbol", "NVDA")],
            ),
        );
    }

    for name in FUNDAMENTALS {
        functions.insert(
            name.to_string(),
            func(
                &["function", "symbol", "apikey"],
                &[],
                &[],
                &[("function", name), ("symbol", "NVDA")],
            ),
        );
    }

    for name in COMMODITIES {
        functions.insert(
            name.to_string(),
            func(
                &["function", "apikey"],
                &["interval", "datatype"],
                &[("interval", "monthly"), ("datatype", "json")],
                &[("function", name), ("interval", "daily"), ("datatype", "csv")],
            ),
        );
    }

    for name in ECONOMIC_INDICATORS {
        functions.insert(
            name.to_string(),
            func(
                &["function", "apikey"],
                &["interval", "datatype"],
                &[("interval", "annual"), ("datatype", "json")],
                &[("function", name), ("interval", "quarterly"), ("datatype", "csv")],
            ),
        );
    }

    for name in TECHNICAL_INDICATORS {
        functions.insert(
            name.to_string(),
            func(
                &["function", "symbol", "interval", "time_period", "apikey"],
                &["month", "outputsize", "datatype"],
                &[("outputsize", "compact"), ("datatype", "json")],
                &[
                    ("function", name),
                    ("symbol", "NVDA"),
                    ("interval", "daily"),
                    ("time_period", "30"),
                    ("datatype", "csv"),
                ],
            ),
        );
    }

    ProviderConfig {
        base_url: ALPHA_VANTAGE_URL.to_string(),
        functions,
    }
}

fn openai() -> ProviderConfig {
    ProviderConfig {
        base_url: OPENAI_URL.to_string(),
        functions: Map::from([(
            "chat_completions".to_string(),
            func(
                &["model", "messages"],
                &["temperature", "max_tokens", "top_p"],
                &[("temperature", "0.7"), ("max_tokens", "1000")],
                &[("model", "gpt-4"), ("temperature", "0.5")],
            ),
        )]),
    }
}

impl Registry {
    /// The built-in table.
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        registry.insert_provider(ALPHA_VANTAGE, alpha_vantage());
        registry.insert_provider(OPENAI, openai());
        registry
    }
}
