use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use weather_terminal::model::{ForecastKind, Unit};
use weather_terminal::parser::PARSER_KEYS;
use weather_terminal::pipeline::{ForecastOptions, OutputFormat, render, run_forecast};

#[derive(Parser, Debug)]
#[command(
    name = "weather-terminal",
    version,
    about = "Weather information from https://weather.com on your terminal"
)]
#[command(group(
    ArgGroup::new("forecast")
        .required(true)
        .args(["today", "fivedays", "tendays", "weekend"])
))]
struct Cli {
    /// Parser used to scrape the weather information
    #[arg(short, long, value_parser = PossibleValuesParser::new(PARSER_KEYS.iter().copied()))]
    parser: String,

    /// Area code to get the forecast for, as used in the provider's URLs
    #[arg(short, long = "areacode")]
    area_code: String,

    /// Unit used to display temperatures (Celsius or Fahrenheit)
    #[arg(short, long, value_parser = parse_unit)]
    unit: Option<Unit>,

    /// Forecast for the current day
    #[arg(long)]
    today: bool,

    /// Forecast for the next five days
    #[arg(long)]
    fivedays: bool,

    /// Forecast for the next ten days
    #[arg(long)]
    tendays: bool,

    /// Forecast for the weekend
    #[arg(long)]
    weekend: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print forecasts as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn kind(&self) -> ForecastKind {
        if self.today {
            ForecastKind::Today
        } else if self.fivedays {
            ForecastKind::FiveDays
        } else if self.tendays {
            ForecastKind::TenDays
        } else {
            ForecastKind::Weekend
        }
    }
}

fn parse_unit(value: &str) -> Result<Unit, String> {
    value.parse()
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let forecasts = run_forecast(&ForecastOptions {
        config_path: cli.config.clone(),
        parser: cli.parser.clone(),
        area_code: cli.area_code.clone(),
        kind: cli.kind(),
        unit: cli.unit,
    })?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    print!("{}", render(&forecasts, format)?);

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
