use crate::builder::{Sidecar, build_rows, build_today};
use crate::error::WeatherError;
use crate::extract::{
    DocumentExtractor, FieldMapper, RawFieldSet, element_text, parse_selector, select_first,
};
use crate::fetch::Fetcher;
use crate::model::{Forecast, ForecastKind, Unit};
use crate::units::UnitConverter;
use scraper::{ElementRef, Html};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub kind: ForecastKind,
    pub area_code: String,
    pub unit: Unit,
}

pub trait WeatherParser: Send + Sync {
    fn key(&self) -> &'static str;

    fn source_unit(&self) -> Unit;

    fn parse(
        &self,
        kind: ForecastKind,
        document: &str,
        unit: Unit,
    ) -> Result<Vec<Forecast>, WeatherError>;

    fn run(
        &self,
        fetcher: &dyn Fetcher,
        request: &ForecastRequest,
    ) -> Result<Vec<Forecast>, WeatherError> {
        let document = fetcher.fetch(request.kind, &request.area_code)?;
        let forecasts = self.parse(request.kind, &document, request.unit)?;
        info!(
            parser = self.key(),
            kind = %request.kind,
            area = %request.area_code,
            forecasts = forecasts.len(),
            "parsed forecast page"
        );
        Ok(forecasts)
    }
}

pub const PARSER_KEYS: &[&str] = &[WeatherComParser::KEY];

pub fn parser_for(key: &str) -> Result<Box<dyn WeatherParser>, WeatherError> {
    let parser: Box<dyn WeatherParser> = match key {
        WeatherComParser::KEY => Box::new(WeatherComParser::new()),
        other => return Err(WeatherError::UnknownParser(other.to_string())),
    };
    Ok(parser)
}

/// Where a forecast kind lives in the page and how its fields are named.
///
/// `criteria` pairs a raw field (also its CSS class) with the tag carrying it;
/// `renames` maps raw names onto the ones `builder` reads.
#[derive(Debug)]
struct Layout {
    container: &'static str,
    criteria: &'static [(&'static str, &'static str)],
    renames: &'static [(&'static str, &'static str)],
}

impl Layout {
    fn extract(&self, container: ElementRef<'_>) -> Result<Vec<RawFieldSet>, WeatherError> {
        let records = DocumentExtractor::new(self.criteria)?.extract(container);
        if self.renames.is_empty() {
            return Ok(records);
        }

        let mapper = self
            .renames
            .iter()
            .fold(FieldMapper::new(), |mapper, (from, to)| mapper.remap_key(from, to));
        Ok(mapper.remap(&records))
    }
}

const TODAY_LAYOUT: Layout = Layout {
    container: "section.today_nowcard-container",
    criteria: &[
        ("today_nowcard-temp", "div"),
        ("today_nowcard-phrase", "div"),
        ("today_nowcard-hilo", "div"),
    ],
    renames: &[
        ("today_nowcard-temp", "temp"),
        ("today_nowcard-phrase", "description"),
        ("today_nowcard-hilo", "hilo"),
    ],
};

const TODAY_SIDECAR: &str = "div.today_nowcard-sidecar";

const MULTI_DAY_LAYOUT: Layout = Layout {
    container: "table.twc-table > tbody",
    criteria: &[
        ("date-time", "span"),
        ("day-detail", "span"),
        ("description", "td"),
        ("temp", "td"),
        ("wind", "td"),
        ("humidity", "td"),
    ],
    renames: &[],
};

const WEEKEND_LAYOUT: Layout = Layout {
    container: "article.ls-mod div div",
    criteria: &[
        ("weather-cell", "header"),
        ("temp", "p"),
        ("weather-phrase", "h3"),
        ("wind-conditions", "p"),
        ("humidity", "p"),
    ],
    renames: &[
        ("weather-phrase", "description"),
        ("wind-conditions", "wind"),
    ],
};

fn layout_for(kind: ForecastKind) -> &'static Layout {
    match kind {
        ForecastKind::Today => &TODAY_LAYOUT,
        ForecastKind::FiveDays | ForecastKind::TenDays => &MULTI_DAY_LAYOUT,
        ForecastKind::Weekend => &WEEKEND_LAYOUT,
    }
}

#[derive(Debug, Clone)]
pub struct WeatherComParser {
    converter: UnitConverter,
}

impl Default for WeatherComParser {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherComParser {
    pub const KEY: &'static str = "weather_com";

    pub fn new() -> Self {
        Self {
            converter: UnitConverter::new(Unit::Fahrenheit),
        }
    }

    fn container<'a>(
        doc: &'a Html,
        kind: ForecastKind,
        layout: &Layout,
    ) -> Result<ElementRef<'a>, WeatherError> {
        select_first(doc, layout.container)?.ok_or_else(|| {
            WeatherError::parse(
                "container",
                format!(
                    "no {} element on the {} page",
                    layout.container,
                    kind.label()
                ),
            )
        })
    }

    fn today(&self, doc: &Html, unit: Unit) -> Result<Vec<Forecast>, WeatherError> {
        let container = Self::container(doc, ForecastKind::Today, &TODAY_LAYOUT)?;
        let records = TODAY_LAYOUT.extract(container)?;
        let fields = records.first().ok_or_else(|| {
            WeatherError::parse(
                "today conditions",
                "could not parse weather forecast for today",
            )
        })?;

        let sidecar = Sidecar::from_values(&sidecar_values(container)?)?;
        Ok(vec![build_today(fields, sidecar, &self.converter, unit)?])
    }

    /// Five- and ten-day pages share one table layout, and the weekend page
    /// uses the same row routine once its fields are renamed.
    fn rows(
        &self,
        doc: &Html,
        kind: ForecastKind,
        unit: Unit,
    ) -> Result<Vec<Forecast>, WeatherError> {
        let layout = layout_for(kind);
        let container = Self::container(doc, kind, layout)?;
        let records = layout.extract(container)?;
        if records.is_empty() {
            return Err(WeatherError::parse(
                "forecast rows",
                format!("no rows found on the {} page", kind.label()),
            ));
        }
        debug!(%kind, rows = records.len(), "extracted forecast rows");

        build_rows(&records, kind, &self.converter, unit)
    }
}

impl WeatherParser for WeatherComParser {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn source_unit(&self) -> Unit {
        self.converter.source()
    }

    fn parse(
        &self,
        kind: ForecastKind,
        document: &str,
        unit: Unit,
    ) -> Result<Vec<Forecast>, WeatherError> {
        let doc = Html::parse_document(document);
        match kind {
            ForecastKind::Today => self.today(&doc, unit),
            ForecastKind::FiveDays | ForecastKind::TenDays | ForecastKind::Weekend => {
                self.rows(&doc, kind, unit)
            }
        }
    }
}

fn sidecar_values(container: ElementRef<'_>) -> Result<Vec<String>, WeatherError> {
    let sidecar_selector = parse_selector(TODAY_SIDECAR)?;
    let sidecar = container
        .select(&sidecar_selector)
        .next()
        .ok_or_else(|| WeatherError::parse("sidecar", "no ancillary conditions table"))?;

    let rows = parse_selector("table tbody tr")?;
    let value_span = parse_selector("td span")?;
    let value_cell = parse_selector("td")?;

    let values = sidecar
        .select(&rows)
        .filter_map(|row| {
            row.select(&value_span)
                .next()
                .or_else(|| row.select(&value_cell).next())
                .map(element_text)
        })
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Temperature;

    const TODAY_PAGE: &str = r#"<html><body>
        <section class="today_nowcard-container">
          <div class="today_nowcard-section today_nowcard-condition">
            <div class="today_nowcard-temp"><span>72</span><sup>&deg;F</sup></div>
            <div class="today_nowcard-phrase">Sunny</div>
            <div class="today_nowcard-hilo"><span>H</span> <span>80&deg;</span> <span>L</span> <span>60&deg;</span></div>
          </div>
          <div class="today_nowcard-sidecar">
            <table><tbody>
              <tr><th>Wind</th><td><span>5 mph</span></td></tr>
              <tr><th>Humidity</th><td><span>40%</span></td></tr>
              <tr><th>Dew Point</th><td><span>47&deg;</span></td></tr>
              <tr><th>Pressure</th><td><span>30.05 in</span></td></tr>
              <tr><th>Visibility</th><td><span>10.0 mi</span></td></tr>
            </tbody></table>
          </div>
        </section>
    </body></html>"#;

    #[test]
    fn registry_knows_weather_com_only() {
        assert_eq!(parser_for("weather_com").unwrap().key(), "weather_com");
        assert!(matches!(
            parser_for("accuweather"),
            Err(WeatherError::UnknownParser(key)) if key == "accuweather"
        ));
        assert_eq!(PARSER_KEYS, &["weather_com"]);
    }

    #[test]
    fn today_page_in_fahrenheit() {
        let parser = WeatherComParser::new();
        let forecasts = parser
            .parse(ForecastKind::Today, TODAY_PAGE, Unit::Fahrenheit)
            .unwrap();

        assert_eq!(forecasts.len(), 1);
        let today = &forecasts[0];
        assert_eq!(today.current_temp(), Temperature::Degrees(72.0));
        assert_eq!(today.high_temp(), Temperature::Degrees(80.0));
        assert_eq!(today.low_temp(), Temperature::Degrees(60.0));
        assert_eq!(today.description(), "Sunny");
        assert_eq!(today.wind(), "5 mph");
        assert_eq!(today.humidity(), "40%");
        assert_eq!(today.pressure(), Some("30.05 in"));
        assert_eq!(today.kind(), ForecastKind::Today);
    }

    #[test]
    fn today_page_with_short_sidecar_fails() {
        let page = TODAY_PAGE
            .replace("<tr><th>Pressure</th><td><span>30.05 in</span></td></tr>", "")
            .replace("<tr><th>Visibility</th><td><span>10.0 mi</span></td></tr>", "");
        let err = WeatherComParser::new()
            .parse(ForecastKind::Today, &page, Unit::Fahrenheit)
            .unwrap_err();
        assert!(matches!(err, WeatherError::Parse { stage: "sidecar", .. }));
    }

    #[test]
    fn page_without_container_fails() {
        let err = WeatherComParser::new()
            .parse(ForecastKind::FiveDays, "<html><body><p>nothing</p></body></html>", Unit::Celsius)
            .unwrap_err();
        assert!(matches!(err, WeatherError::Parse { stage: "container", .. }));
    }

    #[test]
    fn empty_table_fails() {
        let page = r#"<table class="twc-table"><tbody><tr><td class="precip">0%</td></tr></tbody></table>"#;
        let err = WeatherComParser::new()
            .parse(ForecastKind::TenDays, page, Unit::Fahrenheit)
            .unwrap_err();
        assert!(matches!(err, WeatherError::Parse { stage: "forecast rows", .. }));
    }

    #[test]
    fn weekend_fields_are_renamed_before_building() {
        let page = r#"<article class="ls-mod"><div class="module"><div class="days">
            <div class="day"><header class="weather-cell"><span>SAT</span><span>Oct 12</span></header>
              <h3 class="weather-phrase">Showers</h3><p class="temp">61&deg; 49&deg;</p>
              <p class="wind-conditions">W 12 mph</p><p class="humidity">70%</p></div>
        </div></div></article>"#;
        let forecasts = WeatherComParser::new()
            .parse(ForecastKind::Weekend, page, Unit::Fahrenheit)
            .unwrap();

        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].forecast_date(), "SAT Oct 12");
        assert_eq!(forecasts[0].description(), "Showers");
        assert_eq!(forecasts[0].wind(), "W 12 mph");
        assert_eq!(forecasts[0].kind(), ForecastKind::Weekend);
    }
}
