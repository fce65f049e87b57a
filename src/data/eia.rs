//! EIA v2 API integration for hourly fuel-type generation.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::DateRange;
use crate::error::AppError;

const BASE_URL: &str = "https://api.eia.gov/v2/electricity/rto/fuel-type-data/data/";

/// Grid operator whose data is queried. Fixed: multi-respondent support is
/// out of scope.
pub const RESPONDENT: &str = "PJM";

/// Page cap on a single request. One bounded page, no pagination.
const PAGE_LENGTH: usize = 5000;

/// One long-format record from `response.data`.
///
/// Unknown fields (respondent echo, units, etc.) are ignored; `value` arrives
/// as `null` when the respondent reported nothing for that hour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    /// Hour timestamp, `2024-06-01T00`.
    pub period: String,
    /// Fuel-type code (`SUN`, `WND`, `NG`, ...).
    pub fueltype: String,
    /// Human-readable fuel-type label, when present.
    #[serde(rename = "type-name")]
    pub type_name: Option<String>,
    /// Generation magnitude; `None` means the source reported null.
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    data: Vec<RawRecord>,
}

/// Anything that can produce a page of hourly generation records.
///
/// The real implementation is `EiaClient`; tests inject fakes (including a
/// call-counting fake that proves no fetch happens for an invalid range).
pub trait GenerationSource {
    fn fetch_hourly(&self, range: &DateRange) -> Result<Vec<RawRecord>, AppError>;
}

pub struct EiaClient {
    client: Client,
    api_key: String,
}

impl EiaClient {
    /// Read the API key from the environment (`.env` honored).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("EIA_API_KEY")
            .map_err(|_| AppError::Config("Missing EIA_API_KEY in environment (.env).".into()))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }
}

impl GenerationSource for EiaClient {
    fn fetch_hourly(&self, range: &DateRange) -> Result<Vec<RawRecord>, AppError> {
        let start = range.start_bound();
        let end = range.end_bound();
        let length = PAGE_LENGTH.to_string();

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("frequency", "hourly"),
                ("data[0]", "value"),
                ("facets[respondent][]", RESPONDENT),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("sort[0][column]", "period"),
                ("sort[0][direction]", "desc"),
                ("offset", "0"),
                ("length", length.as_str()),
            ])
            .send()
            .map_err(|e| AppError::Fetch {
                status: None,
                message: format!("EIA request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                status: Some(status.as_u16()),
                message: format!("EIA request failed with status {status}."),
            });
        }

        // An absent or malformed body is the same failure as a bad status:
        // nothing downstream may render a partial chart from it.
        let body: ApiResponse = resp.json().map_err(|e| AppError::Fetch {
            status: None,
            message: format!("Failed to parse EIA response: {e}"),
        })?;

        Ok(body.response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_records_and_ignores_unknown_fields() {
        let body = r#"{
            "response": {
                "total": "3",
                "data": [
                    {"period": "2024-06-01T00", "respondent": "PJM",
                     "respondent-name": "PJM Interconnection, LLC",
                     "fueltype": "SUN", "type-name": "Solar",
                     "value": 10.0, "value-units": "megawatthours"},
                    {"period": "2024-06-01T00", "fueltype": "WND",
                     "type-name": "Wind", "value": 5},
                    {"period": "2024-06-01T01", "fueltype": "SUN", "value": null}
                ]
            },
            "request": {"command": "/v2/electricity/rto/fuel-type-data/data/"}
        }"#;

        let decoded: ApiResponse = serde_json::from_str(body).unwrap();
        let records = decoded.response.data;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].fueltype, "SUN");
        assert_eq!(records[0].type_name.as_deref(), Some("Solar"));
        assert_eq!(records[0].value, Some(10.0));
        assert_eq!(records[1].value, Some(5.0));
        assert_eq!(records[2].value, None);
    }

    #[test]
    fn missing_data_key_is_a_decode_error() {
        let body = r#"{"response": {"total": "0"}}"#;
        assert!(serde_json::from_str::<ApiResponse>(body).is_err());
    }
}
