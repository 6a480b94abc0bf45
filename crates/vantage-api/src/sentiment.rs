use crate::common::{convert_published_date, ScoreField};
use crate::error::{Error, Result};
use crate::schema::news::{Article, SentimentLabel};
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap as Map, BTreeSet as Set};
use std::fmt;
use tracing::{debug, trace, warn};

/// One ticker's sentiment, as read from one article.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub sentiment_score: f64,
    pub relevance_score: f64,
    pub label: SentimentLabel,
}

/// Aggregate of every [`SentimentRecord`] sharing a (date, ticker).
///
/// Serializes as one CSV row; scores are rounded to 4 decimal places:
/// ```text
/// date,ticker,article_count,avg_sentiment_score,weighted_sentiment_score,avg_relevance_score,bullish_mentions,bearish_mentions,neutral_mentions,sentiment_ratio
/// 2025-06-28,NVDA,2,0.5,0.4,0.75,1,0,1,0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub ticker: String,
    pub article_count: usize,
    #[serde(serialize_with = "round4")]
    pub avg_sentiment_score: f64,
    #[serde(serialize_with = "round4")]
    pub weighted_sentiment_score: f64,
    #[serde(serialize_with = "round4")]
    pub avg_relevance_score: f64,
    #[serde(rename = "bullish_mentions")]
    pub bullish_count: usize,
    #[serde(rename = "bearish_mentions")]
    pub bearish_count: usize,
    #[serde(rename = "neutral_mentions")]
    pub neutral_count: usize,
    #[serde(serialize_with = "round4")]
    pub sentiment_ratio: f64,
}

impl DailyBucket {
    /// A day with no mentions: zero scores, zero counts.
    pub fn neutral(date: NaiveDate, ticker: impl Into<String>) -> Self {
        DailyBucket {
            date,
            ticker: ticker.into(),
            article_count: 0,
            avg_sentiment_score: 0.0,
            weighted_sentiment_score: 0.0,
            avg_relevance_score: 0.0,
            bullish_count: 0,
            bearish_count: 0,
            neutral_count: 0,
            sentiment_ratio: 0.0,
        }
    }

    pub fn from_records(date: NaiveDate, ticker: &str, records: &[SentimentRecord]) -> Self {
        if records.is_empty() {
            return Self::neutral(date, ticker);
        }

        let count = records.len() as f64;
        let score_sum: f64 = records.iter().map(|r| r.sentiment_score).sum();
        let relevance_sum: f64 = records.iter().map(|r| r.relevance_score).sum();
        let weighted_sum: f64 = records
            .iter()
            .map(|r| r.sentiment_score * r.relevance_score)
            .sum();

        let avg = score_sum / count;
        let weighted = if relevance_sum > 0.0 {
            weighted_sum / relevance_sum
        } else {
            avg
        };

        let tally = |label: SentimentLabel| records.iter().filter(|r| r.label == label).count();
        let bullish = tally(SentimentLabel::Bullish);
        let bearish = tally(SentimentLabel::Bearish);
        let neutral = tally(SentimentLabel::Neutral);

        DailyBucket {
            date,
            ticker: ticker.to_string(),
            article_count: records.len(),
            avg_sentiment_score: avg,
            weighted_sentiment_score: weighted,
            avg_relevance_score: relevance_sum / count,
            bullish_count: bullish,
            bearish_count: bearish,
            neutral_count: neutral,
            sentiment_ratio: (bullish as f64 - bearish as f64) / count,
        }
    }
}

fn round4<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10_000.0).round() / 10_000.0)
}

/// Date of `article`, or the reason it has none.
fn article_date(index: usize, article: &Article) -> Result<NaiveDate> {
    let stamp = article
        .time_published
        .as_deref()
        .ok_or_else(|| Error::malformed(index, "missing time_published"))?;
    convert_published_date(stamp).map_err(|reason| Error::malformed(index, reason))
}

/// Pull every target-ticker sentiment entry out of `articles`.
///
/// Fails on the first article that lacks a usable date, or on the first target entry that
/// lacks a score, a relevance or a label.
pub fn extract_records(articles: &[Article], targets: &Set<String>) -> Result<Vec<SentimentRecord>> {
    let mut records = vec![];

    for (index, article) in articles.iter().enumerate() {
        let date = article_date(index, article)?;

        for entry in &article.ticker_sentiment {
            let ticker = entry
                .ticker
                .as_deref()
                .ok_or_else(|| Error::malformed(index, "ticker_sentiment entry without ticker"))?;
            if !targets.contains(ticker) {
                continue;
            }

            let field = |name: &str, value: Option<&ScoreField>| -> Result<f64> {
                value
                    .ok_or_else(|| Error::malformed(index, format!("{ticker}: missing {name}")))?
                    .value()
                    .map_err(|e| Error::malformed(index, format!("{ticker}: {name} {e}")))
            };
            let sentiment_score =
                field("ticker_sentiment_score", entry.ticker_sentiment_score.as_ref())?;
            let relevance_score = field("relevance_score", entry.relevance_score.as_ref())?;
            let label = entry.ticker_sentiment_label.as_deref().ok_or_else(|| {
                Error::malformed(index, format!("{ticker}: missing ticker_sentiment_label"))
            })?;

            records.push(SentimentRecord {
                date,
                ticker: ticker.to_string(),
                sentiment_score,
                relevance_score,
                label: SentimentLabel::from(label),
            });
        }
    }

    trace!("extracted {} sentiment records", records.len());
    Ok(records)
}

/// Bucket target-ticker sentiment by (date, ticker).
///
/// Only (date, ticker) pairs with at least one record are produced; see [`densify()`] for a
/// gap-free calendar. Output is sorted by date, then ticker.
///
/// [`densify()`]: ./fn.densify.html
pub fn aggregate(articles: &[Article], targets: &Set<String>) -> Result<Vec<DailyBucket>> {
    let mut buckets: Map<(NaiveDate, String), Vec<SentimentRecord>> = Map::new();
    for record in extract_records(articles, targets)? {
        buckets
            .entry((record.date, record.ticker.clone()))
            .or_default()
            .push(record);
    }

    let output: Vec<DailyBucket> = buckets
        .iter()
        .map(|((date, ticker), records)| DailyBucket::from_records(*date, ticker, records))
        .collect();
    debug!("aggregated {} articles into {} daily buckets", articles.len(), output.len());
    Ok(output)
}

/// Inclusive calendar window requested from the feed, read from `time_from`/`time_to`
/// (`YYYYMMDDTHHMM`; only the date part is used).
///
/// `None` unless both bounds are given.
pub fn requested_window(
    time_from: Option<&str>,
    time_to: Option<&str>,
) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let (Some(from), Some(to)) = (time_from, time_to) else {
        return Ok(None);
    };
    let from = convert_published_date(from).map_err(Error::InvalidParam)?;
    let to = convert_published_date(to).map_err(Error::InvalidParam)?;
    if from > to {
        return Err(Error::InvalidParam(format!(
            "time_from {from} is after time_to {to}"
        )));
    }
    Ok(Some((from, to)))
}

/// Fill every calendar day of `window`, for every target ticker, with
/// [`DailyBucket::neutral()`] where no bucket exists.
///
/// Without a window, the span of the observed buckets is used. Buckets outside the window are
/// kept as they are.
///
/// [`DailyBucket::neutral()`]: ./struct.DailyBucket.html#method.neutral
pub fn densify(
    buckets: Vec<DailyBucket>,
    targets: &Set<String>,
    window: Option<(NaiveDate, NaiveDate)>,
) -> Vec<DailyBucket> {
    let observed = (
        buckets.iter().map(|b| b.date).min(),
        buckets.iter().map(|b| b.date).max(),
    );
    let (first, last) = match (window, observed) {
        (Some(window), _) => window,
        (None, (Some(first), Some(last))) => (first, last),
        (None, _) => return buckets,
    };

    let mut by_key: Map<(NaiveDate, String), DailyBucket> = buckets
        .into_iter()
        .map(|b| ((b.date, b.ticker.clone()), b))
        .collect();

    for date in first.iter_days().take_while(|d| *d <= last) {
        for ticker in targets {
            by_key
                .entry((date, ticker.clone()))
                .or_insert_with(|| DailyBucket::neutral(date, ticker.as_str()));
        }
    }

    by_key.into_values().collect()
}

/// Whole-feed sentiment of one day, irrespective of ticker.
///
/// ```text
/// date,article_count,overall_sentiment_avg
/// 2025-06-28,2,0.36
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyOverall {
    pub date: NaiveDate,
    pub article_count: usize,
    #[serde(serialize_with = "round4")]
    pub overall_sentiment_avg: f64,
}

/// Mean `overall_sentiment_score` of every article, per publication day, sorted by date.
///
/// Fails on the first article without a usable date or overall score.
pub fn daily_overall(articles: &[Article]) -> Result<Vec<DailyOverall>> {
    let mut days: Map<NaiveDate, Vec<f64>> = Map::new();
    for (index, article) in articles.iter().enumerate() {
        let date = article_date(index, article)?;
        let score = article
            .overall_sentiment_score
            .as_ref()
            .ok_or_else(|| Error::malformed(index, "missing overall_sentiment_score"))?
            .value()
            .map_err(|e| Error::malformed(index, format!("overall_sentiment_score {e}")))?;
        days.entry(date).or_default().push(score);
    }

    Ok(days
        .into_iter()
        .map(|(date, scores)| DailyOverall {
            date,
            article_count: scores.len(),
            overall_sentiment_avg: scores.iter().sum::<f64>() / scores.len() as f64,
        })
        .collect())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Feed overview
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Per-ticker figures over a feed.
///
/// `mentions` counts every target entry, which is also the total `article_count` across the
/// ticker's daily buckets. The `daily_*` figures are taken over those buckets (days with at
/// least one mention).
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSummary {
    pub mentions: usize,
    pub avg_sentiment_score: f64,
    pub days: usize,
    pub daily_score_mean: f64,
    /// Sample standard deviation; `None` with fewer than two days.
    pub daily_score_std: Option<f64>,
    pub mean_sentiment_ratio: f64,
}

impl TickerSummary {
    fn from_buckets(buckets: &[&DailyBucket]) -> Self {
        let days = buckets.len();
        let n = days as f64;
        let mentions: usize = buckets.iter().map(|b| b.article_count).sum();
        let score_sum: f64 = buckets
            .iter()
            .map(|b| b.avg_sentiment_score * b.article_count as f64)
            .sum();

        let daily_score_mean = buckets.iter().map(|b| b.avg_sentiment_score).sum::<f64>() / n;
        let daily_score_std = (days > 1).then(|| {
            let var = buckets
                .iter()
                .map(|b| (b.avg_sentiment_score - daily_score_mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            var.sqrt()
        });

        TickerSummary {
            mentions,
            avg_sentiment_score: score_sum / mentions as f64,
            days,
            daily_score_mean,
            daily_score_std,
            mean_sentiment_ratio: buckets.iter().map(|b| b.sentiment_ratio).sum::<f64>() / n,
        }
    }
}

/// Date coverage & label distribution of a feed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSummary {
    pub articles: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub by_year: Map<i32, usize>,
    pub labels: Map<String, usize>,
    /// Articles without an `overall_sentiment_label`; left out of `labels`.
    pub unlabelled: usize,
    pub tickers: Map<String, TickerSummary>,
}

impl FeedSummary {
    /// Days between the earliest & latest article.
    pub fn span_days(&self) -> i64 {
        match (self.earliest, self.latest) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }
}

/// Overview of `articles`.
///
/// Fails only where [`aggregate()`] would; a missing overall label is counted in
/// `unlabelled` instead.
///
/// [`aggregate()`]: ./fn.aggregate.html
pub fn summarize(articles: &[Article], targets: &Set<String>) -> Result<FeedSummary> {
    let mut summary = FeedSummary {
        articles: articles.len(),
        ..Default::default()
    };

    for (index, article) in articles.iter().enumerate() {
        let date = article_date(index, article)?;
        summary.earliest = Some(summary.earliest.map_or(date, |d| d.min(date)));
        summary.latest = Some(summary.latest.map_or(date, |d| d.max(date)));
        *summary.by_year.entry(date.year()).or_default() += 1;

        match article.overall_sentiment_label.as_deref() {
            Some(label) => *summary.labels.entry(label.to_string()).or_default() += 1,
            None => {
                warn!("article {index} has no overall_sentiment_label");
                summary.unlabelled += 1;
            }
        }
    }

    let buckets = aggregate(articles, targets)?;
    let mut per_ticker: Map<&str, Vec<&DailyBucket>> = Map::new();
    for bucket in &buckets {
        per_ticker.entry(bucket.ticker.as_str()).or_default().push(bucket);
    }
    summary.tickers = per_ticker
        .into_iter()
        .map(|(ticker, b)| (ticker.to_string(), TickerSummary::from_buckets(&b)))
        .collect();

    Ok(summary)
}

impl fmt::Display for FeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "articles: {}", self.articles)?;
        if let (Some(first), Some(last)) = (self.earliest, self.latest) {
            writeln!(f, "range: {first} to {last} ({} days)", self.span_days())?;
        }
        for (year, count) in &self.by_year {
            writeln!(f, "  {year}: {count} articles")?;
        }
        for (label, count) in &self.labels {
            let pct = *count as f64 / self.articles as f64 * 100.0;
            writeln!(f, "  {label}: {count} articles ({pct:.1}%)")?;
        }
        if self.unlabelled > 0 {
            writeln!(f, "  (unlabelled): {} articles", self.unlabelled)?;
        }
        for (ticker, t) in &self.tickers {
            let std = t.daily_score_std.map_or("n/a".to_string(), |s| format!("{s:.3}"));
            writeln!(
                f,
                "  {ticker}: {} mentions over {} days, avg sentiment {:.3}, daily mean {:.3}, std {std}, mean ratio {:.3}",
                t.mentions, t.days, t.avg_sentiment_score, t.daily_score_mean, t.mean_sentiment_ratio
            )?;
        }
        Ok(())
    }
}
