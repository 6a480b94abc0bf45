use std::path::{Path, PathBuf};
use vantage_api::ParameterSet;

pub const CORE_STOCK: &str = "CORE_STOCK";
pub const FUNDAMENTAL_DATA: &str = "FUNDAMENTAL_DATA";
pub const COMMODITIES: &str = "COMMODITIES";
pub const ECONOMIC_INDICATORS: &str = "ECONOMIC_INDICATORS";
pub const TECHNICAL_INDICATORS: &str = "TECHNICAL_INDICATORS";
pub const SYMBOL_SEARCH: &str = "SYMBOL_SEARCH";

pub const NEWS_RAW: &str = "news_sentiment_data.json";
pub const NEWS_DAILY: &str = "daily_sentiment_timeseries.csv";
pub const NEWS_OVERALL: &str = "daily_overall_sentiment.csv";

/// Extension matching the merged `datatype`.
pub fn extension(params: &ParameterSet) -> &'static str {
    match params.get("datatype") {
        Some("csv") => "csv",
        _ => "json",
    }
}

/// `{out}/{group}/{FUNCTION}[_{SYMBOL}][_{OUTPUTSIZE}].{ext}`
///
/// The subject is `symbol`, or `keywords` for searches. Output size is only appended for
/// core stock series.
pub fn output_file(out: &Path, group: &str, function: &str, params: &ParameterSet) -> PathBuf {
    let mut stem = function.to_string();

    if let Some(subject) = params.get("symbol").or_else(|| params.get("keywords")) {
        stem.push('_');
        stem.push_str(subject);
    }

    if group == CORE_STOCK {
        if let Some(size) = params.get("outputsize") {
            stem.push('_');
            stem.push_str(size);
        }
    }

    out.join(group).join(format!("{stem}.{}", extension(params)))
}
