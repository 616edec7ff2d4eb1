//! LightUpPi backend client
//!
//! Every endpoint lives under `<base>/LightUpPi/` and is a GET with query
//! parameters. Responses are decoded once, here, into `Ok(payload)` or a
//! [`SyncError`]: a non-2xx status or an undecodable body is a transport
//! error, and a JSON object carrying a top-level `error` field is an
//! application error even when the status is 200.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::io::{HttpClient, HttpResponse};
use crate::model::{AlarmPatch, Collection, NewAlarm, StationForm};

const BASE_PATH: &str = "LightUpPi";

/// Typed access to the LightUpPi HTTP endpoints
pub struct LightUpApi {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for LightUpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightUpApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LightUpApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created LightUpApi for {}", base_url);
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an endpoint, e.g. `http://pi/LightUpPi/getAlarm`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, BASE_PATH, endpoint)
    }

    /// Call an endpoint and decode the envelope
    pub async fn call(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let response = self.http.get(&url, &query).await?;
        decode_response(endpoint, &response)
    }

    /// Fetch every item of a collection (`get<Name>?id=all`)
    pub async fn fetch_all<C: Collection>(&self) -> Result<Vec<C::Item>> {
        let mut payload = self
            .call(C::ENDPOINT, &[("id", "all".to_string())])
            .await?;
        let items = payload.get_mut(C::FIELD).map(Value::take).ok_or_else(|| {
            SyncError::Transport(format!(
                "{} response has no '{}' field",
                C::ENDPOINT,
                C::FIELD
            ))
        })?;
        serde_json::from_value(items).map_err(|e| {
            SyncError::Transport(format!("Decoding '{}' from {}: {}", C::FIELD, C::ENDPOINT, e))
        })
    }

    pub async fn add_alarm(&self, alarm: &NewAlarm) -> Result<()> {
        self.call("addAlarm", &alarm.query_pairs()).await.map(drop)
    }

    pub async fn edit_alarm(&self, id: i64, patch: &AlarmPatch) -> Result<()> {
        let mut query = vec![("id", id.to_string())];
        query.extend(patch.query_pairs());
        self.call("editAlarm", &query).await.map(drop)
    }

    pub async fn delete_alarm(&self, id: i64) -> Result<()> {
        self.call("deleteAlarm", &[("id", id.to_string())])
            .await
            .map(drop)
    }

    pub async fn add_station(&self, form: &StationForm) -> Result<()> {
        self.call(
            "addStation",
            &[("name", form.name.clone()), ("url", form.url.clone())],
        )
        .await
        .map(drop)
    }

    pub async fn delete_station(&self, id: i64) -> Result<()> {
        self.call("deleteStation", &[("id", id.to_string())])
            .await
            .map(drop)
    }

    /// Check the backend is up. `ping` answers 200 with an empty body.
    pub async fn ping(&self) -> Result<()> {
        let url = self.endpoint_url("ping");
        let response = self.http.get(&url, &[]).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(SyncError::Transport(format!(
                "ping returned status {}",
                response.status
            )))
        }
    }
}

/// Turn a raw response into the JSON payload or a classified error
pub fn decode_response(endpoint: &str, response: &HttpResponse) -> Result<Value> {
    if !response.is_success() {
        return Err(SyncError::Transport(format!(
            "{} returned status {}",
            endpoint, response.status
        )));
    }

    let payload: Value = serde_json::from_str(&response.body).map_err(|e| {
        SyncError::Transport(format!("{} returned invalid JSON: {}", endpoint, e))
    })?;

    if let Some(error) = payload.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(SyncError::Application(message));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MockHttpClient;
    use crate::model::{Alarms, Stations, Weekdays};

    const BASE: &str = "http://lightup.local/";

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    fn query_is(query: &[(&str, &str)], expected: &[(&str, &str)]) -> bool {
        query == expected
    }

    fn api_with(mock: MockHttpClient) -> LightUpApi {
        LightUpApi::new(BASE, Arc::new(mock))
    }

    #[test]
    fn endpoint_url_strips_trailing_slash() {
        let api = api_with(MockHttpClient::new());
        assert_eq!(
            api.endpoint_url("getAlarm"),
            "http://lightup.local/LightUpPi/getAlarm"
        );
    }

    #[test]
    fn decode_success_payload() {
        let payload = decode_response("getAlarm", &ok(r#"{"alarms": []}"#)).unwrap();
        assert!(payload["alarms"].as_array().unwrap().is_empty());
    }

    #[test]
    fn decode_error_field_is_application_error() {
        let err = decode_response(
            "getAlarm",
            &ok(r#"{"error": "The 'id' argument is required for 'getAlarm'"}"#),
        )
        .unwrap_err();
        match err {
            SyncError::Application(msg) => {
                assert_eq!(msg, "The 'id' argument is required for 'getAlarm'")
            }
            other => panic!("expected SyncError::Application, got {other:?}"),
        }
    }

    #[test]
    fn decode_non_string_error_field_is_still_application_error() {
        let err = decode_response("editAlarm", &ok(r#"{"error": {"code": 3}}"#)).unwrap_err();
        assert!(err.is_application());
        assert!(err.to_string().contains("\"code\":3"));
    }

    #[test]
    fn decode_non_2xx_is_transport_error() {
        let response = HttpResponse {
            status: 500,
            body: r#"{"alarms": []}"#.to_string(),
        };
        let err = decode_response("getAlarm", &response).unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        assert!(err.to_string().contains("status 500"));
    }

    #[test]
    fn decode_garbage_is_transport_error() {
        let err = decode_response("getAlarm", &ok("<html>oops</html>")).unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }

    #[tokio::test]
    async fn fetch_all_alarms_requests_id_all() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, query| {
                url.to_string() == "http://lightup.local/LightUpPi/getAlarm"
                    && query_is(query, &[("id", "all")])
            })
            .times(1)
            .returning(|_, _| {
                Box::pin(async {
                    Ok(ok(r#"{
                        "dataType": "All alarms",
                        "size": 1,
                        "alarms": [{
                            "id": 4, "hour": 7, "minute": 30, "enabled": true,
                            "label": "Test", "timestamp": 1, "monday": true
                        }]
                    }"#))
                })
            });

        let alarms = api_with(mock).fetch_all::<Alarms>().await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].id, 4);
        assert!(alarms[0].days.monday);
        assert!(!alarms[0].days.tuesday);
    }

    #[tokio::test]
    async fn fetch_all_stations() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, _| url.ends_with("/LightUpPi/getStation"))
            .returning(|_, _| {
                Box::pin(async {
                    Ok(ok(
                        r#"{"stations": [{"id": 1, "name": "Radio", "url": "http://radio/stream"}]}"#,
                    ))
                })
            });

        let stations = api_with(mock).fetch_all::<Stations>().await.unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].name, "Radio");
    }

    #[tokio::test]
    async fn fetch_all_missing_field_is_transport_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .returning(|_, _| Box::pin(async { Ok(ok(r#"{"dataType": "All alarms"}"#)) }));

        let err = api_with(mock).fetch_all::<Alarms>().await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        assert!(err.to_string().contains("no 'alarms' field"));
    }

    #[tokio::test]
    async fn fetch_all_propagates_connection_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_, _| {
            Box::pin(async { Err(SyncError::Transport("connection refused".to_string())) })
        });

        let err = api_with(mock).fetch_all::<Stations>().await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }

    #[tokio::test]
    async fn add_alarm_sends_form_fields() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, query| {
                url.ends_with("/addAlarm")
                    && query.contains(&("hour", "7"))
                    && query.contains(&("minute", "30"))
                    && query.contains(&("saturday", "true"))
                    && query.contains(&("monday", "false"))
                    && query.contains(&("label", "Test"))
            })
            .times(1)
            .returning(|_, _| {
                Box::pin(async { Ok(ok(r#"{"dataType": "Add alarm", "id": 9, "success": true}"#)) })
            });

        let alarm = NewAlarm {
            hour: 7,
            minute: 30,
            days: Weekdays::from_array([false, false, false, false, false, true, false]),
            label: "Test".to_string(),
        };
        tokio_test::assert_ok!(api_with(mock).add_alarm(&alarm).await);
    }

    #[tokio::test]
    async fn edit_alarm_sends_id_and_patch() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, query| {
                url.ends_with("/editAlarm") && query_is(query, &[("id", "3"), ("enabled", "false")])
            })
            .times(1)
            .returning(|_, _| {
                Box::pin(async { Ok(ok(r#"{"dataType": "Edit alarm", "id": 3, "success": true}"#)) })
            });

        tokio_test::assert_ok!(api_with(mock).edit_alarm(3, &AlarmPatch::enabled(false)).await);
    }

    #[tokio::test]
    async fn edit_missing_alarm_reports_backend_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_, _| {
            Box::pin(async {
                Ok(ok(
                    r#"{"dataType": "Edit alarm", "id": 42, "success": false, "error": "This alarm does not exists"}"#,
                ))
            })
        });

        let err = tokio_test::assert_err!(
            api_with(mock)
                .edit_alarm(42, &AlarmPatch::enabled(true))
                .await
        );
        assert!(err.is_application());
    }

    #[tokio::test]
    async fn delete_and_add_station_endpoints() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, query| url.ends_with("/deleteStation") && query_is(query, &[("id", "5")]))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(ok(r#"{"success": true}"#)) }));
        mock.expect_get()
            .withf(|url, query| {
                url.ends_with("/addStation")
                    && query_is(
                        query,
                        &[("name", "Jazz FM"), ("url", "http://jazz/stream?a=1&b=2")],
                    )
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(ok(r#"{"success": true}"#)) }));

        let api = api_with(mock);
        tokio_test::assert_ok!(api.delete_station(5).await);
        tokio_test::assert_ok!(
            api.add_station(&StationForm::new("Jazz FM", "http://jazz/stream?a=1&b=2"))
                .await
        );
    }

    #[tokio::test]
    async fn ping_accepts_empty_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, query| url.ends_with("/LightUpPi/ping") && query.is_empty())
            .returning(|_, _| Box::pin(async { Ok(ok("")) }));

        tokio_test::assert_ok!(api_with(mock).ping().await);
    }

    #[tokio::test]
    async fn ping_rejects_error_status() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 404,
                    body: String::new(),
                })
            })
        });

        assert!(api_with(mock).ping().await.is_err());
    }
}
