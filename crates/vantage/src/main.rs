use anyhow::{bail, Result};
use clap::Parser;
use cli::{wire, Cli, Commands::*, TraceLevel};
use dotenv::{dotenv, var};
use paths::output_file;
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, error, info, subscriber, trace, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vantage_api::schema::news::NewsFeed;
use vantage_api::{self as api, build_url, merge_parameters, redact, ParameterSet, Registry, Vantage};
use vantage_util::{read_json, single_pb, write_csv_atomic, write_json_atomic, write_records_atomic};

mod cli;
mod paths;

fn preprocess(trace_level: Level) -> Result<()> {
    dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

/// Everything a fetching command needs, built once per run.
struct Session {
    registry: Registry,
    client: Client,
    api_key: String,
    out: PathBuf,
}

impl Session {
    fn new(registry: Registry, out: PathBuf) -> Result<Self> {
        let api_key = var("ALPHAVANTAGE_API_KEY").unwrap_or_else(|_| {
            warn!("ALPHAVANTAGE_API_KEY is not set; requests will be rejected upstream");
            String::new()
        });
        let user_agent = var("USER_AGENT")
            .unwrap_or_else(|_| format!("vantage/{}", env!("CARGO_PKG_VERSION")));
        let client = api::build_client(&user_agent)?;

        Ok(Session {
            registry,
            client,
            api_key,
            out,
        })
    }

    /// Fetch an Alpha Vantage function & save it under `group`, as CSV or JSON per the merged
    /// `datatype`.
    async fn fetch_to_file(
        &self,
        group: &str,
        function: &str,
        overrides: &ParameterSet,
    ) -> Result<PathBuf> {
        let provider = api::ALPHA_VANTAGE;
        let params = merge_parameters(&self.registry, provider, function, &self.api_key, overrides)?;
        let url = build_url(&self.registry, provider, function, &self.api_key, overrides)?;
        let path = output_file(&self.out, group, function, &params);

        let failed = |e: api::Error| {
            error!("{}", failure_message(function, &url, &e));
            e
        };

        if paths::extension(&params) == "csv" {
            let table = self.client.fetch_csv(&url).await.map_err(failed)?;
            write_csv_atomic(&path, &table.headers, &table.rows).await?;
            info!("{function}: {} rows saved to {}", table.len(), path.display());
        } else {
            let value: serde_json::Value = self.client.fetch_json(&url).await.map_err(failed)?;
            write_json_atomic(&path, &value).await?;
            info!("{function}: saved to {}", path.display());
        }

        Ok(path)
    }
}

/// Function name, redacted URL & HTTP status (when there is one) of a failed request.
fn failure_message(function: &str, url: &str, e: &api::Error) -> String {
    match e.status() {
        Some(status) => format!("{function} failed at {} ({status}): {e}", redact(url)),
        None => format!("{function} failed at {}: {e}", redact(url)),
    }
}

fn set(overrides: &mut ParameterSet, key: &str, value: Option<impl ToString>) {
    if let Some(value) = value {
        overrides.insert(key, value.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level)?;
    trace!("Command line input recorded: {cli:#?}");

    let mut registry = Registry::builtin();
    if let Some(path) = &cli.config {
        debug!("overlaying registry from {}", path.display());
        let overlay: Registry = read_json(path).await?;
        overlay.validate()?;
        registry.merge(overlay);
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> vantage <COMMAND>"
    match &cli.command {
        // "> vantage url GLOBAL_QUOTE -p symbol=AAPL"
        // print the request URL, key hidden unless asked for
        Url {
            function,
            params,
            provider,
            show_key,
        } => {
            let api_key = var("ALPHAVANTAGE_API_KEY").unwrap_or_default();
            let overrides: ParameterSet = params.iter().cloned().collect();
            let url = build_url(&registry, provider, function, &api_key, &overrides)?;
            if *show_key {
                println!("{url}");
            } else {
                println!("{}", redact(&url));
            }
        }

        // "> vantage list [--provider alpha_vantage]"
        // describe the registry
        List { provider } => {
            let providers: Vec<&str> = match provider {
                Some(name) => vec![registry.provider(name).map(|_| name.as_str())?],
                None => registry.providers().collect(),
            };

            for provider in providers {
                println!("{provider} ({})", registry.provider(provider)?.base_url);
                for function in registry.functions(provider)? {
                    let config = registry.function(provider, function)?;
                    let optional: Vec<&str> = config.optional.iter().map(String::as_str).collect();
                    println!(
                        "  {function:<32} required: {}  optional: {}",
                        config.required.join(","),
                        optional.join(",")
                    );

                    let undeclared = config.undeclared_keys();
                    if !undeclared.is_empty() {
                        warn!("{provider}/{function} stores undeclared parameters: {undeclared:?}");
                    }
                }
            }
        }

        ////////////////////////////////////////////////////////////////////////////////////////////////////

        // "> vantage fetch LISTING_STATUS -p state=delisted"
        // any function, saved under its provider's name
        Fetch { function, params } => {
            let session = Session::new(registry, cli.out.clone())?;
            let overrides: ParameterSet = params.iter().cloned().collect();
            session
                .fetch_to_file(api::ALPHA_VANTAGE, function, &overrides)
                .await?;
        }

        // ---------------------------------------------------------------------------
        // "> vantage stock [quote intraday daily daily-adjusted ...]"
        // core stock series, one request at a time
        Stock {
            functions,
            symbol,
            outputsize,
            datatype,
        } => {
            let session = Session::new(registry, cli.out.clone())?;
            let functions = match functions.is_empty() {
                true => vec![cli::StockFunction::DailyAdjusted],
                false => functions.clone(),
            };

            let mut failures = vec![];
            let pb = single_pb(functions.len() as u64)?;
            for stock_function in functions {
                let function = stock_function.function();
                pb.set_message(function);

                let config = session.registry.function(api::ALPHA_VANTAGE, function)?;
                let mut overrides = ParameterSet::new();
                set(&mut overrides, "symbol", symbol.as_ref());
                if config.is_declared("outputsize") {
                    set(&mut overrides, "outputsize", outputsize.as_ref().map(wire));
                }
                set(&mut overrides, "datatype", datatype.as_ref().map(wire));

                match session.fetch_to_file(paths::CORE_STOCK, function, &overrides).await {
                    Ok(path) => trace!("{function} saved to {}", path.display()),
                    Err(e) => {
                        error!("{function} failed: {e}");
                        failures.push(function);
                    }
                }
                pb.inc(1);
            }
            pb.finish_with_message("done");

            if !failures.is_empty() {
                bail!("failed fetching {failures:?}");
            }
        }

        // ---------------------------------------------------------------------------
        // "> vantage fundamental overview --symbol NVDA"
        Fundamental { kind, symbol } => {
            let session = Session::new(registry, cli.out.clone())?;
            let function = kind.function();

            let mut overrides = ParameterSet::new();
            if session.registry.function(api::ALPHA_VANTAGE, function)?.is_declared("symbol") {
                set(&mut overrides, "symbol", symbol.as_ref());
            } else if symbol.is_some() {
                warn!("{function} takes no symbol; ignoring it");
            }
            session
                .fetch_to_file(paths::FUNDAMENTAL_DATA, function, &overrides)
                .await?;
        }

        // ---------------------------------------------------------------------------
        // "> vantage commodity wti --interval monthly"
        Commodity {
            kind,
            interval,
            datatype,
        } => {
            let session = Session::new(registry, cli.out.clone())?;
            let mut overrides = ParameterSet::new();
            set(&mut overrides, "interval", interval.as_ref().map(wire));
            set(&mut overrides, "datatype", datatype.as_ref().map(wire));
            session
                .fetch_to_file(paths::COMMODITIES, kind.function(), &overrides)
                .await?;
        }

        // ---------------------------------------------------------------------------
        // "> vantage economic real-gdp --interval quarterly"
        Economic {
            kind,
            interval,
            datatype,
        } => {
            let session = Session::new(registry, cli.out.clone())?;
            let mut overrides = ParameterSet::new();
            set(&mut overrides, "interval", interval.as_ref().map(wire));
            set(&mut overrides, "datatype", datatype.as_ref().map(wire));
            session
                .fetch_to_file(paths::ECONOMIC_INDICATORS, kind.function(), &overrides)
                .await?;
        }

        // ---------------------------------------------------------------------------
        // "> vantage technical adx --symbol NVDA --interval daily --time-period 14"
        Technical {
            function,
            symbol,
            interval,
            time_period,
        } => {
            let session = Session::new(registry, cli.out.clone())?;
            let mut overrides = ParameterSet::new();
            set(&mut overrides, "symbol", symbol.as_ref());
            set(&mut overrides, "interval", interval.as_ref().map(wire));
            set(&mut overrides, "time_period", time_period.as_ref());
            session
                .fetch_to_file(paths::TECHNICAL_INDICATORS, function.function(), &overrides)
                .await?;
        }

        // ---------------------------------------------------------------------------
        // "> vantage search tesco"
        Search { keywords } => {
            let session = Session::new(registry, cli.out.clone())?;
            let overrides = ParameterSet::from([("keywords", keywords.as_str())]);
            session
                .fetch_to_file(paths::SYMBOL_SEARCH, "SYMBOL_SEARCH", &overrides)
                .await?;
        }

        ////////////////////////////////////////////////////////////////////////////////////////////////////

        // "> vantage sentiment --tickers NVDA,AAPL [--dense]"
        // raw feed to json, daily per-ticker aggregate to csv
        Sentiment {
            tickers,
            time_from,
            time_to,
            limit,
            sort,
            dense,
        } => {
            let session = Session::new(registry, cli.out.clone())?;
            let function = "NEWS_SENTIMENT";

            let mut overrides = ParameterSet::new();
            if !tickers.is_empty() {
                overrides.insert("tickers", tickers.join(","));
            }
            set(&mut overrides, "time_from", time_from.as_ref());
            set(&mut overrides, "time_to", time_to.as_ref());
            set(&mut overrides, "limit", limit.as_ref());
            set(&mut overrides, "sort", sort.as_ref().map(wire));

            let params = merge_parameters(
                &session.registry,
                api::ALPHA_VANTAGE,
                function,
                &session.api_key,
                &overrides,
            )?;
            let targets: BTreeSet<String> = params
                .get("tickers")
                .unwrap_or_default()
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if targets.is_empty() {
                warn!("no tickers requested; the daily series will be empty");
            }

            let url = build_url(
                &session.registry,
                api::ALPHA_VANTAGE,
                function,
                &session.api_key,
                &overrides,
            )?;
            info!("Fetching news sentiment for {targets:?}");
            let raw: serde_json::Value = session.client.fetch_json(&url).await.map_err(|e| {
                error!("{}", failure_message(function, &url, &e));
                e
            })?;
            write_json_atomic(session.out.join(paths::NEWS_RAW), &raw).await?;

            let feed: NewsFeed = serde_json::from_value(raw)?;
            if feed.feed.is_empty() {
                warn!("{function} returned no articles");
            }

            let mut buckets = api::sentiment::aggregate(&feed.feed, &targets)?;
            if *dense {
                let window = api::sentiment::requested_window(
                    params.get("time_from"),
                    params.get("time_to"),
                )?;
                buckets = api::sentiment::densify(buckets, &targets, window);
            }
            let csv_path = session.out.join(paths::NEWS_DAILY);
            write_records_atomic(&csv_path, &buckets).await?;
            info!("{} daily rows saved to {}", buckets.len(), csv_path.display());

            let summary = api::sentiment::summarize(&feed.feed, &targets)?;
            info!("news feed summary:\n{summary}");

            match api::sentiment::daily_overall(&feed.feed) {
                Ok(days) => {
                    let overall_path = session.out.join(paths::NEWS_OVERALL);
                    write_records_atomic(&overall_path, &days).await?;
                    info!("{} days of overall sentiment saved to {}", days.len(), overall_path.display());
                }
                Err(e) => warn!("skipping overall daily sentiment: {e}"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_failure_message_carries_status_and_hides_key() {
        let url = "https://www.alphavantage.co/query?function=NEWS_SENTIMENT&apikey=SECRET";

        let e = api::Error::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "slow down".to_string(),
        };
        let msg = failure_message("NEWS_SENTIMENT", url, &e);
        assert!(msg.starts_with("NEWS_SENTIMENT failed at "));
        assert!(msg.contains("apikey=***"));
        assert!(msg.contains("(429 Too Many Requests)"));
        assert!(!msg.contains("SECRET"));

        let e = api::Error::MissingParameter(vec!["tickers".to_string()]);
        let msg = failure_message("NEWS_SENTIMENT", url, &e);
        assert!(!msg.contains("(4"));
        assert!(msg.contains("Missing required parameters"));
    }
}
