/// Extension methods for [`reqwest::Client`]; fetching JSON & CSV payloads.
pub mod client_ext;

/// Common date helpers shared by the schemas.
pub mod common;

/// Error taxonomy for the whole workspace.
pub mod error;

/// Deserialization schemas for upstream payloads. Includes:
/// 1. News & Sentiment [*source*]: "https://www.alphavantage.co/query?function=NEWS_SENTIMENT"
pub mod schema;

/// Provider → function → parameter table.
pub mod registry;

/// Daily (date, ticker) aggregation of news sentiment.
pub mod sentiment;

/// Merging, validating & serializing query strings.
pub mod url;

pub use crate::client_ext::{build_client, ClientVantageExt as Vantage, Table};
pub use crate::error::{Error, Result};
pub use crate::registry::{FunctionConfig, ParameterSet, ProviderConfig, Registry, ALPHA_VANTAGE, OPENAI};
pub use crate::url::{build_url, merge_parameters, redact, Param};
