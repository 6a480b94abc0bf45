use crate::error::{Error, Result};
use crate::url::redact;
use reqwest::{Client, StatusCode};
use std::future::Future;
use tracing::{debug, error, trace};

/// Top-level keys Alpha Vantage uses, with a `200 OK`, in place of data when a request is
/// rejected (bad key, bad parameters, rate limit).
const REJECTION_KEYS: [&str; 3] = ["Error Message", "Information", "Note"];

/// A CSV payload: header row plus records, every cell kept as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = rdr.headers()?.iter().map(String::from).collect();
        let rows = rdr
            .records()
            .map(|record| record.map(|r| r.iter().map(String::from).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Table { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decide whether a response carries data.
///
/// Non-2xx statuses are rejected outright; a 2xx JSON object whose only content is one of
/// the API's rejection messages is rejected too.
pub fn check_response(status: StatusCode, body: &str) -> Result<()> {
    if !status.is_success() {
        return Err(Error::Upstream {
            status,
            body: body.to_string(),
        });
    }

    if body.trim_start().starts_with('{') {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
            let rejected = map.len() <= 2
                && REJECTION_KEYS.iter().any(|key| map.contains_key(*key));
            if rejected {
                return Err(Error::Upstream {
                    status,
                    body: body.to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn build_client(user_agent: &str) -> Result<Client> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Add-on methods for [`reqwest::Client`].
///
/// Requests are issued one at a time; there is no retry.
///
/// [`reqwest::Client`]: https://docs.rs/reqwest/latest/reqwest/struct.Client.html
pub trait ClientVantageExt {
    /// GET `url`, returning its status & body once [`check_response()`] accepts it.
    ///
    /// [`check_response()`]: ./fn.check_response.html
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<(StatusCode, String)>> + Send;

    fn fetch_json<T>(&self, url: &str) -> impl Future<Output = Result<T>> + Send
    where
        T: serde::de::DeserializeOwned;

    fn fetch_csv(&self, url: &str) -> impl Future<Output = Result<Table>> + Send;
}

impl ClientVantageExt for Client {
    async fn fetch_text(&self, url: &str) -> Result<(StatusCode, String)> {
        let redacted = redact(url);
        trace!("GET {redacted}");

        let response = self.get(url).send().await.map_err(|e| {
            error!("failed fetching response from {redacted}");
            e
        })?;
        let status = response.status();
        let body = response.text().await?;
        debug!("{redacted} responded {status} ({} bytes)", body.len());

        check_response(status, &body).map_err(|e| {
            error!("{redacted} rejected: {e}");
            e
        })?;
        Ok((status, body))
    }

    async fn fetch_json<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let (status, body) = self.fetch_text(url).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("failed deserializing from {}: {e}", redact(url));
            Error::Upstream { status, body }
        })
    }

    async fn fetch_csv(&self, url: &str) -> Result<Table> {
        let (status, body) = self.fetch_text(url).await?;

        // a JSON body here is an error message, whatever the status said
        if body.trim_start().starts_with('{') {
            return Err(Error::Upstream { status, body });
        }
        Table::from_csv(&body)
    }
}
