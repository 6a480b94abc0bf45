use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vantage_api::{Param, ALPHA_VANTAGE};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, default_value = "INFO")]
    pub trace: TraceLevel,

    /// JSON registry overlaid on the built-in one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory results are written under
    #[arg(long, global = true, default_value = "./output")]
    pub out: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the request URL of a function, with its current values applied.
    Url {
        function: String,

        /// Extra `KEY=VALUE` parameters; these win over every stored value
        #[arg(short = 'p', long = "param")]
        params: Vec<Param>,

        #[arg(long, default_value = ALPHA_VANTAGE)]
        provider: String,

        /// Print the API key instead of `***`
        #[arg(long)]
        show_key: bool,
    },

    /// List the functions of every provider, or of one.
    List {
        #[arg(long)]
        provider: Option<String>,
    },

    /// Fetch any Alpha Vantage function; CSV when the merged `datatype` is csv, JSON otherwise.
    Fetch {
        function: String,

        #[arg(short = 'p', long = "param")]
        params: Vec<Param>,
    },

    /// Core stock series, fetched one after another.
    Stock {
        /// Defaults to `daily-adjusted`
        functions: Vec<StockFunction>,

        #[arg(long)]
        symbol: Option<String>,

        #[arg(long)]
        outputsize: Option<OutputSize>,

        #[arg(long)]
        datatype: Option<DataType>,
    },

    /// Company fundamentals, listings & calendars.
    Fundamental {
        kind: Fundamental,

        #[arg(long)]
        symbol: Option<String>,
    },

    Commodity {
        kind: Commodity,

        #[arg(long)]
        interval: Option<Interval>,

        #[arg(long)]
        datatype: Option<DataType>,
    },

    Economic {
        kind: Economic,

        #[arg(long)]
        interval: Option<Interval>,

        #[arg(long)]
        datatype: Option<DataType>,
    },

    Technical {
        function: Technical,

        #[arg(long)]
        symbol: Option<String>,

        #[arg(long)]
        interval: Option<Interval>,

        #[arg(long)]
        time_period: Option<u32>,
    },

    /// Best-matching symbols for `keywords`.
    Search { keywords: String },

    /// Fetch the news feed, then write it raw alongside a daily per-ticker sentiment series.
    Sentiment {
        /// Tickers to aggregate, comma separated
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// YYYYMMDDTHHMM
        #[arg(long)]
        time_from: Option<String>,

        /// YYYYMMDDTHHMM
        #[arg(long)]
        time_to: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        sort: Option<Sort>,

        /// Emit a row for every day & ticker in range, zero-filled where nothing was published
        #[arg(long)]
        dense: bool,
    },
}

/// Wire value of a `ValueEnum`, as Alpha Vantage expects it.
pub fn wire<T: ValueEnum>(value: &T) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum StockFunction {
    Quote,
    Intraday,
    Daily,
    DailyAdjusted,
    Weekly,
    WeeklyAdjusted,
    Monthly,
    MonthlyAdjusted,
}

impl StockFunction {
    pub fn function(self) -> &'static str {
        match self {
            StockFunction::Quote => "GLOBAL_QUOTE",
            StockFunction::Intraday => "TIME_SERIES_INTRADAY",
            StockFunction::Daily => "TIME_SERIES_DAILY",
            StockFunction::DailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
            StockFunction::Weekly => "TIME_SERIES_WEEKLY",
            StockFunction::WeeklyAdjusted => "TIME_SERIES_WEEKLY_ADJUSTED",
            StockFunction::Monthly => "TIME_SERIES_MONTHLY",
            StockFunction::MonthlyAdjusted => "TIME_SERIES_MONTHLY_ADJUSTED",
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fundamental {
    Overview,
    Dividends,
    Splits,
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    Earnings,
    EarningsCalendar,
    IpoCalendar,
    ListingStatus,
}

impl Fundamental {
    pub fn function(self) -> &'static str {
        match self {
            Fundamental::Overview => "OVERVIEW",
            Fundamental::Dividends => "DIVIDENDS",
            Fundamental::Splits => "SPLITS",
            Fundamental::IncomeStatement => "INCOME_STATEMENT",
            Fundamental::BalanceSheet => "BALANCE_SHEET",
            Fundamental::CashFlow => "CASH_FLOW",
            Fundamental::Earnings => "EARNINGS",
            Fundamental::EarningsCalendar => "EARNINGS_CALENDAR",
            Fundamental::IpoCalendar => "IPO_CALENDAR",
            Fundamental::ListingStatus => "LISTING_STATUS",
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Commodity {
    Wti,
    Brent,
    NaturalGas,
    Copper,
    Aluminum,
    Wheat,
    Corn,
    Cotton,
    Sugar,
    Coffee,
    All,
}

impl Commodity {
    pub fn function(self) -> &'static str {
        match self {
            Commodity::Wti => "WTI",
            Commodity::Brent => "BRENT",
            Commodity::NaturalGas => "NATURAL_GAS",
            Commodity::Copper => "COPPER",
            Commodity::Aluminum => "ALUMINUM",
            Commodity::Wheat => "WHEAT",
            Commodity::Corn => "CORN",
            Commodity::Cotton => "COTTON",
            Commodity::Sugar => "SUGAR",
            Commodity::Coffee => "COFFEE",
            Commodity::All => "ALL_COMMODITIES",
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Economic {
    RealGdp,
    RealGdpPerCapita,
}

impl Economic {
    pub fn function(self) -> &'static str {
        match self {
            Economic::RealGdp => "REAL_GDP",
            Economic::RealGdpPerCapita => "REAL_GDP_PER_CAPITA",
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Technical {
    Adx,
    Willr,
}

impl Technical {
    pub fn function(self) -> &'static str {
        match self {
            Technical::Adx => "ADX",
            Technical::Willr => "WILLR",
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interval {
    #[value(name = "1min")]
    Min1,
    #[value(name = "5min")]
    Min5,
    #[value(name = "15min")]
    Min15,
    #[value(name = "30min")]
    Min30,
    #[value(name = "60min")]
    Min60,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputSize {
    Compact,
    Full,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    Json,
    Csv,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum Sort {
    Latest,
    Earliest,
    Relevance,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}
