use crate::common::{de_opt_score, ScoreField};
use serde::Deserialize;
use std::fmt;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
////////////////////////////////////////////////////////////////////////////////////////////////////

// {
//      "items": "50",
//      "sentiment_score_definition": "x <= -0.35: Bearish; ...",
//      "relevance_score_definition": "0 < x <= 1, with a higher score indicating higher relevance.",
//      "feed": [
//          {
//              "title": "...",
//              "time_published": "20250628T101500",
//              "overall_sentiment_score": 0.182,
//              "overall_sentiment_label": "Somewhat-Bullish",
//              "ticker_sentiment": [
//                  {
//                      "ticker": "NVDA",
//                      "relevance_score": "0.412",
//                      "ticker_sentiment_score": "0.245",
//                      "ticker_sentiment_label": "Somewhat-Bullish"
//                  },
//                  ...
//              ]
//          },
//          ...
//      ]
// }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsFeed {
    pub items: Option<String>,
    pub sentiment_score_definition: Option<String>,
    pub relevance_score_definition: Option<String>,
    #[serde(default)]
    pub feed: Vec<Article>,
}

/// Fields read by the aggregator are optional here; their absence is reported per article
/// rather than failing the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub url: Option<String>,
    pub time_published: Option<String>,
    pub source: Option<String>,
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "de_opt_score")]
    pub overall_sentiment_score: Option<ScoreField>,
    pub overall_sentiment_label: Option<String>,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TickerSentiment {
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "de_opt_score")]
    pub relevance_score: Option<ScoreField>,
    #[serde(default, deserialize_with = "de_opt_score")]
    pub ticker_sentiment_score: Option<ScoreField>,
    pub ticker_sentiment_label: Option<String>,
}

/// Sentiment classes as labelled by the API.
///
/// Only the three plain classes feed the bullish/bearish/neutral counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SentimentLabel {
    Bearish,
    SomewhatBearish,
    Neutral,
    SomewhatBullish,
    Bullish,
    Other(String),
}

impl From<&str> for SentimentLabel {
    fn from(label: &str) -> Self {
        match label {
            "Bearish" => SentimentLabel::Bearish,
            "Somewhat-Bearish" => SentimentLabel::SomewhatBearish,
            "Neutral" => SentimentLabel::Neutral,
            "Somewhat-Bullish" => SentimentLabel::SomewhatBullish,
            "Bullish" => SentimentLabel::Bullish,
            other => SentimentLabel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Bearish => f.write_str("Bearish"),
            SentimentLabel::SomewhatBearish => f.write_str("Somewhat-Bearish"),
            SentimentLabel::Neutral => f.write_str("Neutral"),
            SentimentLabel::SomewhatBullish => f.write_str("Somewhat-Bullish"),
            SentimentLabel::Bullish => f.write_str("Bullish"),
            SentimentLabel::Other(s) => f.write_str(s),
        }
    }
}
