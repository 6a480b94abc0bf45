use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::error;

/// Convert an Alpha Vantage `time_published` stamp to a `chrono::NaiveDate`, e.g.,
///             `20250628T101500`   -> `2025-06-28`
///
/// Only the first 8 characters (`YYYYMMDD`) are read.
pub fn convert_published_date(time_published: &str) -> Result<NaiveDate, String> {
    let Some(ymd) = time_published.get(..8) else {
        error!("timestamp too short; expected form YYYYMMDDTHHMMSS - received: {time_published}");
        return Err(format!("time_published \"{time_published}\" is shorter than YYYYMMDD"));
    };
    NaiveDate::parse_from_str(ymd, "%Y%m%d").map_err(|e| {
        error!("failed to parse date string; expected form YYYYMMDD - received: {ymd}");
        format!("time_published \"{time_published}\": {e}")
    })
}

/// Scores arrive as strings (`"0.245"`), though numbers are taken too; absent or `null`
/// becomes `None`.
pub fn de_opt_score<'de, D>(deserializer: D) -> Result<Option<ScoreField>, D::Error>
where
    D: Deserializer<'de>,
{
    // general deserialisation, followed by match statement (depending on type found)
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),

        Some(serde_json::Value::Number(num)) => match num.as_f64() {
            Some(f) => Ok(Some(ScoreField::Parsed(f))),
            None => Err(serde::de::Error::custom("unable to read score as f64")),
        },

        // keep the raw text; it is only judged once the record is actually used
        Some(serde_json::Value::String(s)) => Ok(Some(match s.trim().parse::<f64>() {
            Ok(f) => ScoreField::Parsed(f),
            Err(_) => ScoreField::Unparsable(s),
        })),

        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid type for score: {other}"
        ))),
    }
}

/// A score field as it came off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreField {
    Parsed(f64),
    Unparsable(String),
}

impl ScoreField {
    pub fn value(&self) -> Result<f64, String> {
        match self {
            ScoreField::Parsed(f) => Ok(*f),
            ScoreField::Unparsable(s) => Err(format!("\"{s}\" is not a number")),
        }
    }
}
