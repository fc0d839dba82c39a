//! The seam that performs a single HTTP attempt.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use super::options::RequestBody;

/// A fully resolved request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
  pub method: Method,
  pub url: Url,
  pub headers: Vec<(String, String)>,
  pub body: Option<RequestBody>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
  /// The server could not be reached at all
  #[error("connection failed: {0}")]
  Connect(String),
  #[error("{0}")]
  Other(String),
}

impl TransportError {
  pub fn is_connect(&self) -> bool {
    matches!(self, TransportError::Connect(_))
  }
}

#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport. Session cookies are kept in the client's
/// cookie store and sent with every request.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().cookie_store(true).build()?;
    Ok(Self { client })
  }

  fn headers(request: &TransportRequest) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    if !matches!(request.body, Some(RequestBody::File { .. })) {
      headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    for (name, value) in &request.headers {
      let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| TransportError::Other(format!("invalid header name '{}': {}", name, e)))?;
      let value = HeaderValue::from_str(value)
        .map_err(|e| TransportError::Other(format!("invalid header value for '{}': {}", name, e)))?;
      headers.insert(name, value);
    }
    Ok(headers)
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
    let headers = Self::headers(&request)?;
    let mut builder = self
      .client
      .request(request.method.clone(), request.url.clone())
      .headers(headers);

    builder = match request.body {
      None => builder,
      Some(RequestBody::Json(value)) => builder.body(value.to_string()),
      Some(RequestBody::File { file_name, bytes }) => {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        builder.multipart(reqwest::multipart::Form::new().part("file", part))
      }
    };

    let response = builder.send().await.map_err(map_reqwest_error)?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(map_reqwest_error)?;

    Ok(TransportResponse {
      status,
      body: body.to_vec(),
    })
  }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
  if e.is_connect() {
    TransportError::Connect(e.to_string())
  } else {
    TransportError::Other(e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn request(body: Option<RequestBody>, headers: Vec<(&str, &str)>) -> TransportRequest {
    TransportRequest {
      method: Method::POST,
      url: Url::parse("http://localhost/book").unwrap(),
      headers: headers
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
      body,
    }
  }

  #[test]
  fn test_json_content_type_by_default() {
    let body = Some(RequestBody::Json(json!({})));
    let headers = ReqwestTransport::headers(&request(body, vec![])).unwrap();
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
  }

  #[test]
  fn test_custom_headers_override_defaults() {
    let headers = ReqwestTransport::headers(&request(
      None,
      vec![("content-type", "text/plain"), ("x-request-id", "42")],
    ))
    .unwrap();
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    assert_eq!(headers.get("x-request-id").unwrap(), "42");
  }

  #[test]
  fn test_file_body_leaves_content_type_to_multipart() {
    let body = RequestBody::File {
      file_name: "cover.png".to_string(),
      bytes: vec![1, 2, 3],
    };
    let headers = ReqwestTransport::headers(&request(Some(body), vec![])).unwrap();
    assert!(headers.get(CONTENT_TYPE).is_none());
  }

  #[test]
  fn test_invalid_header_is_rejected() {
    let err = ReqwestTransport::headers(&request(None, vec![("bad header", "x")])).unwrap_err();
    assert!(matches!(err, TransportError::Other(_)));
  }
}
