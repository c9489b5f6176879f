use crate::error::WeatherError;
use crate::extract::RawFieldSet;
use crate::model::{Forecast, ForecastKind, SENTINEL, Temperature, Unit, today_label};
use crate::units::UnitConverter;
use regex::{Match, Regex};
use std::sync::LazyLock;
use tracing::debug;

// A sign counts only after whitespace; `L-58` reads as low 58.
static HIGH_LOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bH[a-z]*(?:\s+(?P<hs>-?\d+)|-?(?P<h>\d+)|\s*(?P<hd>--?))\D*?\bL[a-z]*(?:\s+(?P<ls>-?\d+)|-?(?P<l>\d+)|\s*(?P<ld>--?))",
    )
    .expect("invalid regex: high/low")
});

static VALUE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+|--").expect("invalid regex: value token"));

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+").expect("invalid regex: leading number"));

pub fn extract_high_low(text: &str) -> Option<(String, String)> {
    let caps = HIGH_LOW_RE.captures(text)?;
    let pick = |names: [&str; 3]| {
        names
            .into_iter()
            .find_map(|name| caps.name(name))
            .map(|m| m.as_str().to_string())
    };
    Some((pick(["hs", "h", "hd"])?, pick(["ls", "l", "ld"])?))
}

pub fn extract_row_high_low(text: &str) -> Option<(String, String)> {
    let mut values = VALUE_TOKEN_RE
        .find_iter(text)
        .map(|found| row_value(text, found));
    Some((values.next()?, values.next()?))
}

/// A `-` glued to a preceding digit or degree mark separates two values,
/// so `75°-58°` reads as 75 and 58.
fn row_value(text: &str, found: Match<'_>) -> String {
    let value = found.as_str();
    let glued = text[..found.start()]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit() || c == '\u{b0}');
    match value.strip_prefix('-') {
        Some(digits) if glued && digits.starts_with(|c: char| c.is_ascii_digit()) => {
            digits.to_string()
        }
        _ => value.to_string(),
    }
}

pub fn clean_number(text: &str) -> String {
    LEADING_NUMBER_RE
        .find(text.trim())
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| SENTINEL.to_string())
}

/// Splits a weekend header cell such as `SATOct 12` into `("SAT", "Oct 12")`.
///
/// The provider glues the short day name to the date, so the split is at a
/// fixed width of three characters rather than at a separator.
pub fn split_weekend_date_cell(cell: &str) -> (&str, &str) {
    let split_at = cell.char_indices().nth(3).map_or(cell.len(), |(i, _)| i);
    let (date, detail) = cell.split_at(split_at);
    (date, detail.trim())
}

/// Ancillary values of the current-conditions sidecar, read by position.
///
/// The provider lists them as wind, humidity, dew point, pressure and
/// visibility; rows carry no label we rely on, only their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    pub wind: String,
    pub humidity: String,
    pub dew_point: String,
    pub pressure: String,
    pub visibility: String,
}

impl Sidecar {
    pub const LEN: usize = 5;

    pub fn from_values(values: &[String]) -> Result<Self, WeatherError> {
        let [wind, humidity, dew_point, pressure, visibility, ..] = values else {
            return Err(WeatherError::parse(
                "sidecar",
                format!(
                    "expected at least {} ancillary values, found {}",
                    Self::LEN,
                    values.len()
                ),
            ));
        };
        Ok(Self {
            wind: wind.clone(),
            humidity: humidity.clone(),
            dew_point: dew_point.clone(),
            pressure: pressure.clone(),
            visibility: visibility.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ForecastBuilder {
    kind: ForecastKind,
    current_temp: Temperature,
    wind: String,
    humidity: String,
    dew_point: Option<String>,
    pressure: Option<String>,
    visibility: Option<String>,
    high_temp: Temperature,
    low_temp: Temperature,
    description: String,
    forecast_date: Option<String>,
}

impl ForecastBuilder {
    pub fn new(kind: ForecastKind) -> Self {
        Self {
            kind,
            current_temp: Temperature::Unavailable,
            wind: SENTINEL.to_string(),
            humidity: SENTINEL.to_string(),
            dew_point: None,
            pressure: None,
            visibility: None,
            high_temp: Temperature::Unavailable,
            low_temp: Temperature::Unavailable,
            description: String::new(),
            forecast_date: None,
        }
    }

    pub fn current_temp(mut self, temp: Temperature) -> Self {
        self.current_temp = temp;
        self
    }

    pub fn high_low(mut self, high: Temperature, low: Temperature) -> Self {
        self.high_temp = high;
        self.low_temp = low;
        self
    }

    pub fn wind(mut self, wind: impl Into<String>) -> Self {
        self.wind = wind.into();
        self
    }

    pub fn humidity(mut self, humidity: impl Into<String>) -> Self {
        self.humidity = humidity.into();
        self
    }

    pub fn sidecar(mut self, sidecar: Sidecar) -> Self {
        self.wind = sidecar.wind;
        self.humidity = sidecar.humidity;
        self.dew_point = Some(sidecar.dew_point);
        self.pressure = Some(sidecar.pressure);
        self.visibility = Some(sidecar.visibility);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn forecast_date(mut self, date: impl Into<String>) -> Self {
        self.forecast_date = Some(date.into());
        self
    }

    pub fn build(self) -> Forecast {
        Forecast {
            current_temp: self.current_temp,
            wind: self.wind,
            humidity: self.humidity,
            dew_point: self.dew_point,
            pressure: self.pressure,
            visibility: self.visibility,
            high_temp: self.high_temp,
            low_temp: self.low_temp,
            description: self.description.trim().to_string(),
            forecast_date: self.forecast_date.unwrap_or_else(today_label),
            kind: self.kind,
        }
    }
}

/// `fields` must carry `hilo`; a missing or garbled `temp` renders as `--`.
pub fn build_today(
    fields: &RawFieldSet,
    sidecar: Sidecar,
    converter: &UnitConverter,
    unit: Unit,
) -> Result<Forecast, WeatherError> {
    let hilo = fields
        .get("hilo")
        .ok_or_else(|| WeatherError::parse("today hi/lo", "no high/low field in current conditions"))?;
    let (high, low) = extract_high_low(hilo).ok_or_else(|| {
        WeatherError::parse("today hi/lo", format!("no H/L values in {hilo:?}"))
    })?;

    let current = fields.get("temp").map_or_else(|| SENTINEL.to_string(), |t| clean_number(t));
    let description = fields.get("description").map(String::as_str).unwrap_or_default();

    Ok(ForecastBuilder::new(ForecastKind::Today)
        .current_temp(converter.convert(&current, unit)?)
        .high_low(converter.convert(&high, unit)?, converter.convert(&low, unit)?)
        .sidecar(sidecar)
        .description(description)
        .build())
}

/// A row whose `temp` cannot be split into high and low fails the whole run.
pub fn build_rows(
    records: &[RawFieldSet],
    kind: ForecastKind,
    converter: &UnitConverter,
    unit: Unit,
) -> Result<Vec<Forecast>, WeatherError> {
    let mut forecasts = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let temp = record.get("temp").ok_or_else(|| {
            WeatherError::parse("row temp", format!("row {index} has no temp field"))
        })?;
        let (high, low) = extract_row_high_low(temp).ok_or_else(|| {
            WeatherError::parse(
                "row temp",
                format!("row {index}: no high/low values in {temp:?}"),
            )
        })?;

        let (date_time, day_detail) = match record.get("weather-cell") {
            Some(cell) => {
                let (date, detail) = split_weekend_date_cell(cell);
                (Some(date), Some(detail))
            }
            None => (
                record.get("date-time").map(String::as_str),
                record.get("day-detail").map(String::as_str),
            ),
        };

        let mut builder = ForecastBuilder::new(kind)
            .current_temp(converter.convert(&clean_number(temp), unit)?)
            .high_low(converter.convert(&high, unit)?, converter.convert(&low, unit)?)
            .description(record.get("description").map(String::as_str).unwrap_or_default());

        if let Some(wind) = record.get("wind") {
            builder = builder.wind(wind.as_str());
        }
        if let Some(humidity) = record.get("humidity") {
            builder = builder.humidity(humidity.as_str());
        }

        let date = [date_time, day_detail]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !date.is_empty() {
            builder = builder.forecast_date(date);
        }

        forecasts.push(builder.build());
    }

    debug!(%kind, rows = forecasts.len(), "built row forecasts");
    Ok(forecasts)
}
