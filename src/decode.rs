use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::{ApiClientError, RequestBody, ResponseBody, Result};

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";

pub(crate) fn build_default_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let (name, value) = parse_header(name, value)?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Overlays request-level headers on the defaults; request-level wins.
pub(crate) fn merge_headers(defaults: &HeaderMap, overrides: &[(String, String)]) -> Result<HeaderMap> {
    let mut merged = defaults.clone();
    for (name, value) in overrides {
        let (name, value) = parse_header(name, value)?;
        merged.insert(name, value);
    }
    Ok(merged)
}

/// Encodes the request body, defaulting a JSON content type for JSON bodies.
pub(crate) fn encode_body(body: RequestBody, headers: &mut HeaderMap) -> Result<Vec<u8>> {
    match body {
        RequestBody::Bytes(bytes) => Ok(bytes),
        RequestBody::Text(text) => Ok(text.into_bytes()),
        RequestBody::Json(value) => {
            let encoded = serde_json::to_vec(&value)?;
            default_json_content_type(headers);
            Ok(encoded)
        }
    }
}

fn default_json_content_type(headers: &mut HeaderMap) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }
}

/// Decodes a response body according to its declared content type.
pub(crate) fn decode_body(status: u16, headers: &HeaderMap, body: &[u8]) -> Result<ResponseBody> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains(JSON_CONTENT_TYPE));

    if !is_json {
        return Ok(ResponseBody::Text(String::from_utf8_lossy(body).into_owned()));
    }

    serde_json::from_slice(body)
        .map(ResponseBody::Json)
        .map_err(|err| ApiClientError::MalformedResponse {
            status,
            message: format!("invalid JSON body: {err}"),
        })
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| ApiClientError::InvalidHeader(format!("'{name}': {err}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|err| ApiClientError::InvalidHeader(format!("value for '{name}': {err}")))?;
    Ok((header_name, header_value))
}
