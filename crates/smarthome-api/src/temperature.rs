use std::time::Duration;

use smarthome_common::{Error, Result, TemperatureReading};
use tracing::debug;
use url::Url;

/// HTTP client for the temperature API.
#[derive(Clone)]
pub struct TemperatureClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TemperatureClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid temperature api url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "temperature api url cannot be a base: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /temperature?location=<location>`
    pub async fn by_location(&self, location: &str) -> Result<TemperatureReading> {
        let mut url = self.endpoint(&["temperature"])?;
        url.query_pairs_mut().append_pair("location", location);
        self.fetch(url).await
    }

    /// `GET /temperature/<sensor_id>`
    pub async fn by_sensor_id(&self, sensor_id: &str) -> Result<TemperatureReading> {
        let url = self.endpoint(&["temperature", sensor_id])?;
        self.fetch(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!(
                    "temperature api url cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<TemperatureReading> {
        debug!("fetching temperature from {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("temperature api request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "temperature api returned {status}"
            )));
        }

        response
            .json::<TemperatureReading>()
            .await
            .map_err(|e| Error::Upstream(format!("invalid temperature api response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reading_json(sensor_id: &str, location: &str, value: f64) -> serde_json::Value {
        serde_json::json!({
            "sensorId": sensor_id,
            "sensorType": "temperature",
            "location": location,
            "value": value,
            "unit": "°C",
            "status": "Comfortable",
            "timestamp": "2024-05-01T10:00:00Z",
            "description": format!("Temperature in {location}: {value}°C (Comfortable)"),
        })
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = TemperatureClient::new("not a url", Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn endpoint_appends_segments_after_base_path() {
        let client =
            TemperatureClient::new("http://localhost:8081/api/", Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["temperature", "Living Room"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/api/temperature/Living%20Room");
    }

    #[tokio::test]
    async fn fetches_reading_by_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/temperature"))
            .and(query_param("location", "Living Room"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reading_json("1", "Living Room", 21.5)),
            )
            .mount(&server)
            .await;

        let client = TemperatureClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let reading = client.by_location("Living Room").await.unwrap();
        assert_eq!(reading.sensor_id, "1");
        assert_eq!(reading.value, 21.5);
    }

    #[tokio::test]
    async fn fetches_reading_by_sensor_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/temperature/2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reading_json("2", "Bedroom", 17.0)),
            )
            .mount(&server)
            .await;

        let client = TemperatureClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let reading = client.by_sensor_id("2").await.unwrap();
        assert_eq!(reading.location, "Bedroom");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TemperatureClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = client.by_location("Kitchen").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn malformed_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = TemperatureClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = client.by_sensor_id("1").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
