use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub source: WeatherSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    pub display: String,
}
