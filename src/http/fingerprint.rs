//! Request identity and URL construction.

use reqwest::Method;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use super::options::RequestBody;

/// Deterministic identity of a logical request, derived from
/// method + path + query parameters + body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
  pub fn compute(
    path: &str,
    method: &Method,
    params: &BTreeMap<String, Value>,
    body: Option<&RequestBody>,
  ) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(path.as_bytes());
    hasher.update(b"|");
    // BTreeMap serializes in key order, so insertion order never matters
    hasher.update(Value::from(serde_json::Map::from_iter(params.clone())).to_string());
    hasher.update(b"|");
    match body {
      None => hasher.update(b"{}"),
      Some(RequestBody::Json(value)) => hasher.update(value.to_string()),
      Some(RequestBody::File { file_name, bytes }) => {
        hasher.update(b"file:");
        hasher.update(file_name.as_bytes());
        hasher.update(b":");
        hasher.update(bytes);
      }
    }
    Self(hex::encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Append `path` to `base` and encode non-null `params` as the query string.
pub fn build_url(
  base: &Url,
  path: &str,
  params: &BTreeMap<String, Value>,
) -> Result<Url, url::ParseError> {
  let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
  let mut url = Url::parse(&joined)?;

  let present: Vec<(&String, String)> = params
    .iter()
    .filter_map(|(key, value)| param_to_string(value).map(|v| (key, v)))
    .collect();

  if !present.is_empty() {
    let mut pairs = url.query_pairs_mut();
    for (key, value) in present {
      pairs.append_pair(key, &value);
    }
  }

  Ok(url)
}

fn param_to_string(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}
