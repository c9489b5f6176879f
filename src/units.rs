use crate::error::WeatherError;
use crate::model::{Temperature, Unit};

pub fn f2c(temp_f: f64) -> f64 {
    (temp_f - 32.0) * 5.0 / 9.0
}

pub fn c2f(temp_c: f64) -> f64 {
    temp_c * 9.0 / 5.0 + 32.0
}

#[derive(Debug, Clone, Copy)]
pub struct UnitConverter {
    source: Unit,
}

impl UnitConverter {
    pub fn new(source: Unit) -> Self {
        Self { source }
    }

    pub fn source(&self) -> Unit {
        self.source
    }

    /// Parses `raw` and converts it to `dest`.
    ///
    /// The `--` sentinel passes through as `Temperature::Unavailable` for every
    /// destination. Converted values are rounded to the nearest integer.
    pub fn convert(&self, raw: &str, dest: Unit) -> Result<Temperature, WeatherError> {
        Ok(self.convert_temperature(Temperature::parse(raw)?, dest))
    }

    pub fn convert_temperature(&self, temp: Temperature, dest: Unit) -> Temperature {
        let Temperature::Degrees(value) = temp else {
            return temp;
        };
        if dest == self.source {
            return temp;
        }

        let converted = match dest {
            Unit::Celsius => f2c(value),
            Unit::Fahrenheit => c2f(value),
        };
        // `+ 0.0` turns a rounded -0 into 0
        Temperature::Degrees(converted.round() + 0.0)
    }
}
