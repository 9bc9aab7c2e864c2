//! Blocking HTTP client for the district admin REST API.
//!
//! # Responsibility
//! - Map each `DistrictRemote` call onto one admin API request.
//! - Convert transport faults and non-success responses into `RemoteError`.
//!
//! # Invariants
//! - Every request is bounded by the configured timeout.
//! - Path segments carrying user values are percent-encoded.
//! - Response bodies are never required on success; a missing or
//!   undecodable acknowledgement body yields an ack without district id.

use crate::config::ClientConfig;
use crate::model::district::District;
use crate::sync::remote::{DistrictRemote, RemoteAck, RemoteError, RemoteResult};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const PATH_PREFIX: &[&str] = &["api", "admin", "districts"];

#[derive(Debug, Serialize)]
struct AddChildBody<'a> {
    #[serde(rename = "District")]
    district: &'a str,
    #[serde(rename = "Panchayath", skip_serializing_if = "Option::is_none")]
    panchayath: Option<&'a str>,
    #[serde(rename = "PinCode", skip_serializing_if = "Option::is_none")]
    pincode: Option<&'a str>,
}

/// `DistrictRemote` backed by the admin REST API.
#[derive(Debug, Clone)]
pub struct HttpDistrictRemote {
    client: Client,
    base_url: Url,
}

impl HttpDistrictRemote {
    /// Builds a client from a validated config.
    ///
    /// # Errors
    /// - `client` error when the base URL cannot be used as a base or the
    ///   HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> RemoteResult<Self> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|err| RemoteError::client(format!("invalid api base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::client(format!(
                "api base url cannot be a base: {}",
                config.api_base_url
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| RemoteError::client(format!("failed to build http client: {err}")))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        endpoint_url(&self.base_url, segments)
    }

    fn add_child(&self, body: &AddChildBody<'_>) -> RemoteResult<RemoteAck> {
        let url = self.endpoint(&["add"])?;
        debug!("event=http_request module=sync method=POST path={}", url.path());
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(transport_error)?;
        read_ack(response)
    }

    fn delete(&self, segments: &[&str]) -> RemoteResult<RemoteAck> {
        let url = self.endpoint(segments)?;
        debug!("event=http_request module=sync method=DELETE path={}", url.path());
        let response = self.client.delete(url).send().map_err(transport_error)?;
        read_ack(response)
    }
}

impl DistrictRemote for HttpDistrictRemote {
    fn remote_id(&self) -> &str {
        "http"
    }

    fn add_panchayath(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck> {
        self.add_child(&AddChildBody {
            district: district_name,
            panchayath: Some(value),
            pincode: None,
        })
    }

    fn add_pincode(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck> {
        self.add_child(&AddChildBody {
            district: district_name,
            panchayath: None,
            pincode: Some(value),
        })
    }

    fn delete_panchayath(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck> {
        self.delete(&["delete", district_id, value])
    }

    fn delete_pincode(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck> {
        self.delete(&["delete", district_id, "pincode", value])
    }

    fn delete_district(&self, district_id: &str) -> RemoteResult<()> {
        self.delete(&["delete", district_id]).map(|_| ())
    }

    fn list_districts(&self) -> RemoteResult<Vec<District>> {
        let url = self.endpoint(&["list"])?;
        debug!("event=http_request module=sync method=GET path={}", url.path());
        let response = self.client.get(url).send().map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(transport_error)?;
        parse_listing(status, &body)
    }
}

fn endpoint_url(base: &Url, segments: &[&str]) -> RemoteResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| RemoteError::client("api base url cannot be a base"))?;
        path.pop_if_empty();
        path.extend(PATH_PREFIX);
        path.extend(segments);
    }
    Ok(url)
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::transport(format!("request timed out: {err}"))
    } else {
        RemoteError::transport(err.to_string())
    }
}

fn read_ack(response: Response) -> RemoteResult<RemoteAck> {
    let status = response.status().as_u16();
    let body = response.text().map_err(transport_error)?;
    parse_ack(status, &body)
}

/// Interprets one add/delete response.
fn parse_ack(status: u16, body: &str) -> RemoteResult<RemoteAck> {
    if !(200..300).contains(&status) {
        return Err(rejection(status, body));
    }
    let district_id = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| record_id(&value));
    Ok(RemoteAck { district_id })
}

/// Interprets the listing response. `null` means no districts.
fn parse_listing(status: u16, body: &str) -> RemoteResult<Vec<District>> {
    if !(200..300).contains(&status) {
        return Err(rejection(status, body));
    }
    serde_json::from_str::<Option<Vec<District>>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|err| RemoteError::invalid_response(format!("invalid district listing: {err}")))
}

fn rejection(status: u16, body: &str) -> RemoteError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("request failed with status {status}"));
    RemoteError::rejected(status, message)
}

fn record_id(value: &Value) -> Option<String> {
    let direct = value.get("_id").and_then(Value::as_str);
    let nested = || {
        ["district", "data"]
            .iter()
            .find_map(|key| value.get(key)?.get("_id")?.as_str())
    };
    direct.or_else(nested).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{endpoint_url, parse_ack, parse_listing, AddChildBody, HttpDistrictRemote};
    use crate::config::ClientConfig;
    use crate::sync::remote::{REMOTE_ERROR_INVALID_RESPONSE, REMOTE_ERROR_REJECTED};
    use reqwest::Url;

    fn base(raw: &str) -> Url {
        Url::parse(raw).expect("test url should parse")
    }

    #[test]
    fn endpoints_follow_admin_api_layout() {
        let url = endpoint_url(&base("https://admin.example.com"), &["list"]).expect("url");
        assert_eq!(url.as_str(), "https://admin.example.com/api/admin/districts/list");

        let url = endpoint_url(&base("https://admin.example.com/"), &["delete", "65a1"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://admin.example.com/api/admin/districts/delete/65a1"
        );
    }

    #[test]
    fn endpoints_keep_base_path_and_encode_values() {
        let url = endpoint_url(
            &base("http://localhost:5000/backend"),
            &["delete", "65a1", "pincode", "68 20/01"],
        )
        .expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/backend/api/admin/districts/delete/65a1/pincode/68%2020%2F01"
        );
    }

    #[test]
    fn add_body_uses_admin_field_names() {
        let body = AddChildBody {
            district: "Ernakulam",
            panchayath: None,
            pincode: Some("682001"),
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert_eq!(json, r#"{"District":"Ernakulam","PinCode":"682001"}"#);
    }

    #[test]
    fn ack_extracts_record_id_from_known_shapes() {
        let top = parse_ack(201, r#"{"_id":"a1"}"#).expect("ack");
        assert_eq!(top.district_id.as_deref(), Some("a1"));

        let nested = parse_ack(200, r#"{"message":"ok","district":{"_id":"b2"}}"#).expect("ack");
        assert_eq!(nested.district_id.as_deref(), Some("b2"));

        let data = parse_ack(200, r#"{"data":{"_id":"c3"}}"#).expect("ack");
        assert_eq!(data.district_id.as_deref(), Some("c3"));

        let empty = parse_ack(204, "").expect("empty body is still success");
        assert!(empty.district_id.is_none());
    }

    #[test]
    fn rejection_prefers_backend_message() {
        let err = parse_ack(400, r#"{"message":"Panchayath already exists"}"#)
            .expect_err("400 must fail");
        assert_eq!(err.code, REMOTE_ERROR_REJECTED);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "Panchayath already exists");

        let err = parse_ack(502, "<html>bad gateway</html>").expect_err("502 must fail");
        assert!(err.retryable);
        assert!(err.message.contains("502"));
    }

    #[test]
    fn listing_accepts_null_and_rejects_garbage() {
        assert!(parse_listing(200, "null").expect("null listing").is_empty());

        let listing = parse_listing(
            200,
            r#"[{"_id":"1","District":"Kollam","Panchayaths":["Alappad"],"PinCodes":[]}]"#,
        )
        .expect("listing");
        assert_eq!(listing.len(), 1);
        assert!(listing[0].panchayaths.contains("Alappad"));

        let err = parse_listing(200, "{not json").expect_err("garbage must fail");
        assert_eq!(err.code, REMOTE_ERROR_INVALID_RESPONSE);
    }

    #[test]
    fn client_builds_from_validated_config() {
        let config = ClientConfig::new("http://localhost:5000")
            .validated()
            .expect("config");
        HttpDistrictRemote::new(&config).expect("client should build");
    }
}
