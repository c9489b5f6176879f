use crate::error::WeatherError;
use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const SENTINEL: &str = "--";

const DATE_FORMAT: &str = "%a %b %d";

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").expect("invalid regex: decimal"));

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ForecastKind {
    Today,
    FiveDays,
    TenDays,
    Weekend,
}

impl ForecastKind {
    pub fn token(self) -> &'static str {
        match self {
            ForecastKind::Today => "today",
            ForecastKind::FiveDays => "5day",
            ForecastKind::TenDays => "10day",
            ForecastKind::Weekend => "weekend",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ForecastKind::Today => "today",
            ForecastKind::FiveDays => "five days",
            ForecastKind::TenDays => "ten days",
            ForecastKind::Weekend => "weekend",
        }
    }
}

impl fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "celsius" => Ok(Unit::Celsius),
            "fahrenheit" => Ok(Unit::Fahrenheit),
            other => Err(format!(
                "invalid unit {other:?}; expected Celsius or Fahrenheit"
            )),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Celsius => f.write_str("Celsius"),
            Unit::Fahrenheit => f.write_str("Fahrenheit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temperature {
    Degrees(f64),
    Unavailable,
}

impl Temperature {
    /// Accepts `-?digits[.digits]`; the sentinel (or any dash-only/empty
    /// string) becomes `Unavailable`. Exponents and `+` signs are rejected.
    pub fn parse(raw: &str) -> Result<Self, WeatherError> {
        let trimmed = raw.trim();
        if trimmed.chars().all(|c| c == '-') {
            return Ok(Temperature::Unavailable);
        }
        if !DECIMAL_RE.is_match(trimmed) {
            return Err(WeatherError::Conversion {
                value: raw.to_string(),
            });
        }
        trimmed
            .parse::<f64>()
            .map(Temperature::Degrees)
            .map_err(|_| WeatherError::Conversion {
                value: raw.to_string(),
            })
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Degrees(value) if value.fract() == 0.0 => write!(f, "{value:.0}"),
            Temperature::Degrees(value) => write!(f, "{value:.1}"),
            Temperature::Unavailable => f.write_str(SENTINEL),
        }
    }
}

impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Temperature::Degrees(value) => serializer.serialize_f64(*value),
            Temperature::Unavailable => serializer.serialize_str(SENTINEL),
        }
    }
}

/// One forecast period. Only built through `ForecastBuilder`; read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub(crate) current_temp: Temperature,
    pub(crate) wind: String,
    pub(crate) humidity: String,
    pub(crate) dew_point: Option<String>,
    pub(crate) pressure: Option<String>,
    pub(crate) visibility: Option<String>,
    pub(crate) high_temp: Temperature,
    pub(crate) low_temp: Temperature,
    pub(crate) description: String,
    pub(crate) forecast_date: String,
    pub(crate) kind: ForecastKind,
}

impl Forecast {
    pub fn current_temp(&self) -> Temperature {
        self.current_temp
    }

    pub fn wind(&self) -> &str {
        &self.wind
    }

    pub fn humidity(&self) -> &str {
        &self.humidity
    }

    pub fn dew_point(&self) -> Option<&str> {
        self.dew_point.as_deref()
    }

    pub fn pressure(&self) -> Option<&str> {
        self.pressure.as_deref()
    }

    pub fn visibility(&self) -> Option<&str> {
        self.visibility.as_deref()
    }

    pub fn high_temp(&self) -> Temperature {
        self.high_temp
    }

    pub fn low_temp(&self) -> Temperature {
        self.low_temp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn forecast_date(&self) -> &str {
        &self.forecast_date
    }

    pub fn kind(&self) -> ForecastKind {
        self.kind
    }
}

pub fn today_label() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const OFFSET: &str = "    ";

        writeln!(f)?;
        writeln!(f, ">> {}", self.forecast_date)?;
        if self.kind == ForecastKind::Today {
            writeln!(
                f,
                "{OFFSET}Current temperature: {}\u{b0}",
                self.current_temp
            )?;
        }
        writeln!(
            f,
            "{OFFSET}High {}\u{b0} / Low {}\u{b0} ({})",
            self.high_temp, self.low_temp, self.description
        )?;
        writeln!(
            f,
            "{OFFSET}Wind: {} / Humidity: {}",
            self.wind, self.humidity
        )?;

        if self.kind == ForecastKind::Today {
            writeln!(
                f,
                "{OFFSET}Dew Point: {} / Pressure: {} / Visibility: {}",
                self.dew_point.as_deref().unwrap_or(SENTINEL),
                self.pressure.as_deref().unwrap_or(SENTINEL),
                self.visibility.as_deref().unwrap_or(SENTINEL)
            )?;
            writeln!(f)?;
            writeln!(
                f,
                "{OFFSET}NB: Dew Point, Pressure, and Visibility will be displayed as though temperature values were in Fahrenheit"
            )
        } else {
            writeln!(
                f,
                "{OFFSET}Dew Point: Not available / Pressure: Not available / Visibility: Not available"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: ForecastKind) -> Forecast {
        Forecast {
            current_temp: Temperature::Degrees(72.0),
            wind: "5 mph".to_string(),
            humidity: "40%".to_string(),
            dew_point: Some("47\u{b0}".to_string()),
            pressure: Some("30.05 in".to_string()),
            visibility: Some("10.0 mi".to_string()),
            high_temp: Temperature::Degrees(80.0),
            low_temp: Temperature::Unavailable,
            description: "Sunny".to_string(),
            forecast_date: "Sat Oct 12".to_string(),
            kind,
        }
    }

    #[test]
    fn today_rendering_includes_ancillary_block_and_disclaimer() {
        let text = sample(ForecastKind::Today).to_string();
        let expected = "\n>> Sat Oct 12\n    Current temperature: 72\u{b0}\n    High 80\u{b0} / Low --\u{b0} (Sunny)\n    Wind: 5 mph / Humidity: 40%\n    Dew Point: 47\u{b0} / Pressure: 30.05 in / Visibility: 10.0 mi\n\n    NB: Dew Point, Pressure, and Visibility will be displayed as though temperature values were in Fahrenheit\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn multi_day_rendering_marks_ancillary_values_unavailable() {
        let text = sample(ForecastKind::FiveDays).to_string();
        assert!(!text.contains("Current temperature"));
        assert!(text.contains("    High 80\u{b0} / Low --\u{b0} (Sunny)\n"));
        assert!(text.ends_with(
            "    Dew Point: Not available / Pressure: Not available / Visibility: Not available\n"
        ));
        assert!(!text.contains("NB:"));
    }

    #[test]
    fn temperature_parse_handles_sentinel_and_numbers() {
        assert_eq!(Temperature::parse("--").ok(), Some(Temperature::Unavailable));
        assert_eq!(Temperature::parse(" 58 ").ok(), Some(Temperature::Degrees(58.0)));
        assert_eq!(Temperature::parse("-40").ok(), Some(Temperature::Degrees(-40.0)));
        assert_eq!(Temperature::parse("71.5").ok(), Some(Temperature::Degrees(71.5)));
        for malformed in ["warm", "1e5", "+72", "7.", ".5", "inf", "NaN"] {
            assert!(
                matches!(
                    Temperature::parse(malformed),
                    Err(WeatherError::Conversion { .. })
                ),
                "{malformed} should be rejected"
            );
        }
    }

    #[test]
    fn temperature_display_drops_integral_fraction() {
        assert_eq!(Temperature::Degrees(22.0).to_string(), "22");
        assert_eq!(Temperature::Degrees(22.5).to_string(), "22.5");
        assert_eq!(Temperature::Unavailable.to_string(), "--");
    }

    #[test]
    fn unit_parsing_is_case_insensitive() {
        assert_eq!("Celsius".parse::<Unit>(), Ok(Unit::Celsius));
        assert_eq!("FAHRENHEIT".parse::<Unit>(), Ok(Unit::Fahrenheit));
        assert!("kelvin".parse::<Unit>().is_err());
    }

    #[test]
    fn kind_tokens_match_provider_paths() {
        assert_eq!(ForecastKind::Today.token(), "today");
        assert_eq!(ForecastKind::FiveDays.token(), "5day");
        assert_eq!(ForecastKind::TenDays.token(), "10day");
        assert_eq!(ForecastKind::Weekend.token(), "weekend");
    }
}
