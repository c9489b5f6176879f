use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("could not find the area that you searched for ({url})")]
    NotFound { url: String },

    #[error("parse error at {stage}: {message}")]
    Parse { stage: &'static str, message: String },

    #[error("cannot convert temperature value {value:?}")]
    Conversion { value: String },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("unknown parser {0}")]
    UnknownParser(String),
}

impl WeatherError {
    pub fn parse(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            stage,
            message: message.into(),
        }
    }
}
