use crate::config::load_config;
use crate::fetch::{Fetcher, build_fetcher};
use crate::model::{Forecast, ForecastKind, Unit};
use crate::parser::{ForecastRequest, parser_for};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ForecastOptions {
    pub config_path: Option<PathBuf>,
    pub parser: String,
    pub area_code: String,
    pub kind: ForecastKind,
    /// Overrides `[display].unit` from the config when set.
    pub unit: Option<Unit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn run_forecast(options: &ForecastOptions) -> Result<Vec<Forecast>> {
    let loaded = load_config(options.config_path.as_deref())?;
    let fetcher = build_fetcher(&loaded)?;
    let unit = options.unit.unwrap_or(loaded.config.display.unit);
    forecast_with(fetcher.as_ref(), options, unit)
}

pub fn forecast_with(
    fetcher: &dyn Fetcher,
    options: &ForecastOptions,
    unit: Unit,
) -> Result<Vec<Forecast>> {
    let parser = parser_for(&options.parser)?;
    let request = ForecastRequest {
        kind: options.kind,
        area_code: options.area_code.clone(),
        unit,
    };

    info!(
        parser = parser.key(),
        kind = %request.kind,
        area = %request.area_code,
        source_unit = %parser.source_unit(),
        unit = %request.unit,
        "forecast start"
    );
    let forecasts = parser.run(fetcher, &request).with_context(|| {
        format!(
            "{} forecast failed for area {}",
            request.kind.label(),
            request.area_code
        )
    })?;
    info!(forecasts = forecasts.len(), "forecast complete");

    Ok(forecasts)
}

pub fn render(forecasts: &[Forecast], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(forecasts
            .iter()
            .map(|forecast| format!("{forecast}\n"))
            .collect()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(forecasts)? + "\n"),
    }
}
