//! Serde types for the book-management endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A book record as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
  #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover: Option<String>,
  #[serde(rename = "publishAt", default, skip_serializing_if = "Option::is_none")]
  pub publish_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stock: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  // Anything else the backend sends back
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// Filters and paging for the book list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub current: Option<u32>,
  #[serde(rename = "pageSize", skip_serializing_if = "Option::is_none")]
  pub page_size: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
}

/// One page of books.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookPage {
  #[serde(default, alias = "data")]
  pub list: Vec<Book>,
  #[serde(default)]
  pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
  pub name: String,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
  #[serde(rename = "_id")]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub role: String,
  #[serde(default)]
  pub status: String,
  #[serde(rename = "nickName", default)]
  pub nick_name: String,
  pub token: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_book_keeps_unknown_fields() {
    let book: Book = serde_json::from_value(json!({
      "_id": "b1",
      "name": "Dune",
      "author": "Frank Herbert",
      "publishAt": "1965-08-01",
      "stock": 3,
      "isbn": "978-0441013593"
    }))
    .unwrap();

    assert_eq!(book.id.as_deref(), Some("b1"));
    assert_eq!(book.publish_at.as_deref(), Some("1965-08-01"));
    assert_eq!(book.extra.get("isbn"), Some(&json!("978-0441013593")));
  }

  #[test]
  fn test_new_book_serializes_without_id() {
    let book = Book {
      name: "Dune".to_string(),
      stock: Some(2),
      ..Book::default()
    };
    assert_eq!(serde_json::to_value(&book).unwrap(), json!({"name": "Dune", "stock": 2}));
  }

  #[test]
  fn test_query_omits_unset_filters() {
    let query = BookQuery {
      current: Some(1),
      page_size: Some(20),
      ..BookQuery::default()
    };
    assert_eq!(serde_json::to_value(&query).unwrap(), json!({"current": 1, "pageSize": 20}));
  }

  #[test]
  fn test_login_response() {
    let res: LoginResponse = serde_json::from_value(json!({
      "_id": "u1",
      "name": "admin",
      "role": "admin",
      "status": "on",
      "nickName": "Admin",
      "token": null
    }))
    .unwrap();
    assert_eq!(res.nick_name, "Admin");
    assert_eq!(res.token, None);
  }
}
