/// `NEWS_SENTIMENT` feed; articles with per-ticker sentiment.
pub mod news;
