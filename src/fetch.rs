use crate::config::{FetchMode, LoadedConfig, resolve_path};
use crate::error::WeatherError;
use crate::model::ForecastKind;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use scraper::{Html, Selector};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const NOT_FOUND_TITLE: &str = "404 Not Found";

pub trait Fetcher {
    fn fetch(&self, kind: ForecastKind, area_code: &str) -> Result<String, WeatherError>;
}

pub fn build_fetcher(loaded: &LoadedConfig) -> Result<Box<dyn Fetcher>> {
    match loaded.config.fetch.mode {
        FetchMode::Http => Ok(Box::new(HttpFetcher::new(loaded)?)),
        FetchMode::File => Ok(Box::new(FileFetcher::new(loaded)?)),
    }
}

/// `{base_url}/weather/{token}/l/{area}`
pub fn page_url(base_url: &Url, kind: ForecastKind, area_code: &str) -> Result<Url, WeatherError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| WeatherError::Fetch(format!("base url {base_url} cannot hold a path")))?
        .pop_if_empty()
        .extend(["weather", kind.token(), "l", area_code]);
    Ok(url)
}

/// Pages served with a `404 Not Found` title count as missing even on a 200.
fn ensure_found(location: &str, body: String) -> Result<String, WeatherError> {
    let doc = Html::parse_document(&body);
    let is_missing = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            doc.select(&selector)
                .next()
                .map(|title| title.text().collect::<String>().trim() == NOT_FOUND_TITLE)
        })
        .unwrap_or(false);

    if is_missing {
        return Err(WeatherError::NotFound {
            url: location.to_string(),
        });
    }
    Ok(body)
}

#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    retry_attempts: u8,
    retry_backoff_ms: u64,
}

impl HttpFetcher {
    pub fn new(loaded: &LoadedConfig) -> Result<Self> {
        let fetch = &loaded.config.fetch;

        let mut headers = HeaderMap::new();
        for (k, v) in &fetch.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name {k}"))?;
            let value =
                HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
            headers.insert(name, value);
        }
        let user_agent = fetch.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        let client = Client::builder()
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = Url::parse(&loaded.config.provider.base_url)
            .with_context(|| format!("invalid base_url {}", loaded.config.provider.base_url))?;

        Ok(Self {
            client,
            base_url,
            retry_attempts: fetch.retry_attempts,
            retry_backoff_ms: fetch.retry_backoff_ms,
        })
    }

    fn get_with_retries(&self, url: &Url) -> Result<String, WeatherError> {
        let attempts = self.retry_attempts.max(1);

        for attempt in 1..=attempts {
            match self.client.get(url.as_str()).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(WeatherError::NotFound {
                            url: url.to_string(),
                        });
                    }
                    if status.is_success() {
                        return resp.text().map_err(|err| {
                            WeatherError::Fetch(format!("failed to read body from {url}: {err}"))
                        });
                    }
                    if attempt == attempts {
                        return Err(WeatherError::Fetch(format!(
                            "request to {url} failed with status {status}"
                        )));
                    }
                    warn!(%url, %status, attempt, "request failed; retrying");
                }
                Err(err) => {
                    if attempt == attempts {
                        return Err(WeatherError::Fetch(format!(
                            "request to {url} failed: {err}"
                        )));
                    }
                    warn!(%url, attempt, error = %err, "request errored; retrying");
                }
            }

            std::thread::sleep(Duration::from_millis(self.retry_backoff_ms));
        }

        Err(WeatherError::Fetch(format!(
            "request to {url} failed after retries"
        )))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, kind: ForecastKind, area_code: &str) -> Result<String, WeatherError> {
        let url = page_url(&self.base_url, kind, area_code)?;
        let body = self.get_with_retries(&url)?;
        info!(%url, bytes = body.len(), "fetched page");
        ensure_found(url.as_str(), body)
    }
}

#[derive(Debug)]
pub struct FileFetcher {
    pages_dir: PathBuf,
}

impl FileFetcher {
    pub fn new(loaded: &LoadedConfig) -> Result<Self> {
        let pages_dir = loaded
            .config
            .fetch
            .pages_dir
            .as_ref()
            .context("fetch.pages_dir missing for file mode")?;
        Ok(Self {
            pages_dir: resolve_path(loaded.path.as_deref(), pages_dir)?,
        })
    }

    pub fn from_dir(pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
        }
    }

    pub fn page_path(&self, kind: ForecastKind, area_code: &str) -> PathBuf {
        self.pages_dir
            .join(kind.token())
            .join(format!("{area_code}.html"))
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, kind: ForecastKind, area_code: &str) -> Result<String, WeatherError> {
        let path = self.page_path(kind, area_code);
        let location = path.display().to_string();
        if !path.is_file() {
            return Err(WeatherError::NotFound { url: location });
        }

        let body = std::fs::read_to_string(&path)
            .map_err(|err| WeatherError::Fetch(format!("failed to read {location}: {err}")))?;
        debug!(file = %location, bytes = body.len(), "loaded page from disk");
        ensure_found(&location, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_follows_provider_template() {
        let base = Url::parse("https://weather.com").unwrap();
        let url = page_url(&base, ForecastKind::FiveDays, "USNY0996").unwrap();
        assert_eq!(url.as_str(), "https://weather.com/weather/5day/l/USNY0996");

        let nested = Url::parse("http://localhost:8080/mirror/").unwrap();
        let url = page_url(&nested, ForecastKind::Weekend, "SWXX0043").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/mirror/weather/weekend/l/SWXX0043");
    }

    #[test]
    fn not_found_title_is_reported() {
        let page = "<html><head><title> 404 Not Found </title></head><body></body></html>";
        let err = ensure_found("https://weather.com/x", page.to_string()).unwrap_err();
        assert!(matches!(err, WeatherError::NotFound { .. }));

        let ok = "<html><head><title>Weather</title></head></html>";
        assert!(ensure_found("https://weather.com/x", ok.to_string()).is_ok());
    }

    #[test]
    fn missing_page_file_is_not_found() {
        let fetcher = FileFetcher::from_dir("/definitely/not/here");
        let err = fetcher.fetch(ForecastKind::Today, "XX").unwrap_err();
        assert!(matches!(err, WeatherError::NotFound { url } if url.ends_with("today/XX.html")));
    }
}
