//! Invocation event and result types exchanged with AWS Lambda when the
//! Assure360 app runs behind API Gateway.
//!
//! An [`InvocationEvent`] is turned into a plain [`http::Request`] that any
//! router can answer, and the router's [`http::Response`] is folded back into
//! the [`InvocationResult`] shape the calling gateway expects. Both REST API
//! (payload v1) and HTTP API (payload v2) proxy integrations are understood.

use std::collections::{BTreeMap, HashMap};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use http::{Method, Request, Response};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Bytes that may not appear raw in a URI path. REST API events carry the
/// path already decoded, so `%` is escaped as well.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Gateway integration that produced an event, which decides the shape of the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOrigin {
    /// API Gateway REST API proxy integration (payload format 1.0).
    RestApi,
    /// API Gateway HTTP API proxy integration (payload format 2.0).
    HttpApi,
}

/// Inbound invocation event.
///
/// The variants are untagged and tried in declaration order: REST API events
/// are recognised by their `httpMethod` field, HTTP API events by `rawPath`
/// plus `requestContext.http.method`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum InvocationEvent {
    RestApi(RestApiEvent),
    HttpApi(HttpApiEvent),
}

/// API Gateway REST API proxy event.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApiEvent {
    pub http_method: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_base64_encoded: bool,
}

/// API Gateway HTTP API proxy event.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiEvent {
    pub raw_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub raw_query_string: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cookies: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_base64_encoded: bool,
    pub request_context: HttpApiRequestContext,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HttpApiRequestContext {
    pub http: HttpApiDescription,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HttpApiDescription {
    pub method: String,
}

impl InvocationEvent {
    /// Returns which gateway integration sent the event.
    pub fn origin(&self) -> RequestOrigin {
        match self {
            InvocationEvent::RestApi(_) => RequestOrigin::RestApi,
            InvocationEvent::HttpApi(_) => RequestOrigin::HttpApi,
        }
    }

    /// Returns the HTTP method carried by the event.
    pub fn method(&self) -> &str {
        match self {
            InvocationEvent::RestApi(event) => &event.http_method,
            InvocationEvent::HttpApi(event) => &event.request_context.http.method,
        }
    }

    /// Returns the request path carried by the event.
    pub fn path(&self) -> &str {
        match self {
            InvocationEvent::RestApi(event) => event.path.as_deref().unwrap_or("/"),
            InvocationEvent::HttpApi(event) => &event.raw_path,
        }
    }

    /// Synthesizes the HTTP request described by the event.
    pub fn into_request(self) -> Result<Request<Bytes>, EventError> {
        match self {
            InvocationEvent::RestApi(event) => rest_api_request(event),
            InvocationEvent::HttpApi(event) => http_api_request(event),
        }
    }
}

/// Result handed back to the gateway for a single invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl InvocationResult {
    /// Folds an HTTP response into the result shape expected by `origin`.
    ///
    /// REST API results carry repeated headers in `multiValueHeaders`; HTTP API
    /// results move `set-cookie` values into `cookies` and join any other
    /// repeated header with `, `. Bodies that are not valid UTF-8 are base64
    /// encoded.
    pub fn from_response(origin: RequestOrigin, response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &parts.headers {
            grouped
                .entry(name.as_str().to_owned())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let mut headers = BTreeMap::new();
        let mut multi_value_headers = BTreeMap::new();
        let mut cookies = Vec::new();
        for (name, values) in grouped {
            match origin {
                RequestOrigin::HttpApi if name == SET_COOKIE.as_str() => cookies.extend(values),
                RequestOrigin::HttpApi => {
                    headers.insert(name, values.join(", "));
                }
                RequestOrigin::RestApi => match <[String; 1]>::try_from(values) {
                    Ok([value]) => {
                        headers.insert(name, value);
                    }
                    Err(values) => {
                        multi_value_headers.insert(name, values);
                    }
                },
            }
        }

        let (body, is_base64_encoded) = match String::from_utf8(body.to_vec()) {
            Ok(text) => (text, false),
            Err(err) => (BASE64.encode(err.as_bytes()), true),
        };

        Self {
            status_code: parts.status.as_u16(),
            headers,
            multi_value_headers,
            cookies,
            body,
            is_base64_encoded,
        }
    }

    /// Returns the raw body bytes, undoing base64 encoding when present.
    pub fn decoded_body(&self) -> Result<Bytes, EventError> {
        if self.is_base64_encoded {
            Ok(Bytes::from(BASE64.decode(&self.body)?))
        } else {
            Ok(Bytes::from(self.body.clone()))
        }
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        let body = self.decoded_body()?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Errors raised while translating between events, requests and results.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("invalid http method: {0}")]
    InvalidMethod(String),
    #[error("invalid header {0}")]
    InvalidHeader(String),
    #[error("invalid query string parameters: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to build request: {0}")]
    Http(#[from] http::Error),
    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),
}

fn rest_api_request(event: RestApiEvent) -> Result<Request<Bytes>, EventError> {
    // multi-value parameters are a superset of the single-value ones when present
    let query = if event.multi_value_query_string_parameters.is_empty() {
        encode_query(
            event
                .query_string_parameters
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect(),
        )?
    } else {
        encode_query(
            event
                .multi_value_query_string_parameters
                .iter()
                .flat_map(|(key, values)| {
                    values
                        .iter()
                        .map(move |value| (key.as_str(), value.as_str()))
                })
                .collect(),
        )?
    };

    let mut headers = HeaderMap::new();
    for (name, values) in &event.multi_value_headers {
        let header = header_name(name)?;
        for value in values {
            headers.append(header.clone(), header_value(name, value)?);
        }
    }
    for (name, value) in &event.headers {
        let header = header_name(name)?;
        if !headers.contains_key(&header) {
            headers.insert(header, header_value(name, value)?);
        }
    }

    let path = event
        .path
        .as_deref()
        .map(|path| utf8_percent_encode(path, PATH_ENCODE_SET).to_string());

    let body = decode_body(event.body, event.is_base64_encoded)?;
    build_request(
        &event.http_method,
        path.as_deref(),
        &query,
        headers,
        body,
    )
}

fn http_api_request(event: HttpApiEvent) -> Result<Request<Bytes>, EventError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &event.headers {
        headers.insert(header_name(name)?, header_value(name, value)?);
    }
    if !event.cookies.is_empty() {
        let cookies = event.cookies.join("; ");
        headers.insert(COOKIE, header_value(COOKIE.as_str(), &cookies)?);
    }

    let body = decode_body(event.body, event.is_base64_encoded)?;
    build_request(
        &event.request_context.http.method,
        Some(&event.raw_path),
        &event.raw_query_string,
        headers,
        body,
    )
}

fn build_request(
    method: &str,
    path: Option<&str>,
    query: &str,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Request<Bytes>, EventError> {
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| EventError::InvalidMethod(method.to_owned()))?;

    let mut uri = match path {
        Some(path) if path.starts_with('/') => path.to_owned(),
        Some(path) => format!("/{path}"),
        None => "/".to_owned(),
    };
    if !query.is_empty() {
        uri.push('?');
        uri.push_str(query);
    }

    let mut request = Request::builder().method(method).uri(uri).body(body)?;
    *request.headers_mut() = headers;
    Ok(request)
}

/// Orders parameters by key; values of a repeated key keep their event order.
fn encode_query(mut pairs: Vec<(&str, &str)>) -> Result<String, EventError> {
    pairs.sort_by(|left, right| left.0.cmp(right.0));
    Ok(serde_urlencoded::to_string(pairs)?)
}

fn decode_body(body: Option<String>, is_base64_encoded: bool) -> Result<Bytes, EventError> {
    match body {
        None => Ok(Bytes::new()),
        Some(body) if is_base64_encoded => Ok(Bytes::from(BASE64.decode(body)?)),
        Some(body) => Ok(Bytes::from(body)),
    }
}

fn header_name(name: &str) -> Result<HeaderName, EventError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| EventError::InvalidHeader(name.to_owned()))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, EventError> {
    HeaderValue::from_str(value).map_err(|_| EventError::InvalidHeader(name.to_owned()))
}

/// Gateways send `null` for absent maps and flags.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
