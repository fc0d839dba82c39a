use serde_json::{json, Value};

use super::types::{Book, BookPage, BookQuery, LoginRequest, LoginResponse};
use crate::http::{HttpClient, HttpError, RequestOptions};

/// Book and session endpoints of the backend.
#[derive(Clone)]
pub struct BookApi {
  http: HttpClient,
}

impl BookApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  pub fn http(&self) -> &HttpClient {
    &self.http
  }

  pub async fn create(&self, book: &Book) -> Result<Option<Value>, HttpError> {
    self
      .http
      .post("/book", book, RequestOptions::new().show_success(true).show_loading(true))
      .await
  }

  pub async fn list(&self, query: &BookQuery) -> Result<Option<BookPage>, HttpError> {
    self.http.get("/book/list", query, RequestOptions::new()).await
  }

  pub async fn get(&self, id: &str) -> Result<Option<Book>, HttpError> {
    self
      .http
      .get(&format!("/book/{}", id), &(), RequestOptions::new())
      .await
  }

  /// Apply a partial update; only the fields present in `changes` are sent.
  pub async fn update(&self, id: &str, changes: &Value) -> Result<Option<Value>, HttpError> {
    self
      .http
      .put(&format!("/book/{}", id), changes, RequestOptions::new().show_success(true))
      .await
  }

  pub async fn delete(&self, id: &str) -> Result<Option<Value>, HttpError> {
    self
      .http
      .delete(&format!("/book/{}", id), RequestOptions::new().show_success(true))
      .await
  }

  pub async fn search(&self, keyword: &str) -> Result<Option<Vec<Book>>, HttpError> {
    self
      .http
      .get("/book/search", &json!({ "keyword": keyword }), RequestOptions::new())
      .await
  }

  pub async fn login(
    &self,
    request: &LoginRequest,
    show_loading: bool,
  ) -> Result<Option<LoginResponse>, HttpError> {
    self
      .http
      .post(
        "/api/login",
        request,
        RequestOptions::new()
          .show_loading(show_loading)
          .throw_error(false)
          .no_cache(),
      )
      .await
  }

  pub async fn logout(&self) -> Result<Option<Value>, HttpError> {
    self
      .http
      .post("/api/logout", &json!({}), RequestOptions::new().show_loading(true).no_cache())
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::testing::{RecordingNotifier, ScriptedTransport, Step};
  use crate::http::{ClientSettings, RequestBody};
  use crate::i18n::Locale;
  use reqwest::Method;
  use std::sync::Arc;
  use url::Url;

  fn api(steps: Vec<Step>) -> (BookApi, Arc<ScriptedTransport>, Arc<RecordingNotifier>) {
    let transport = ScriptedTransport::new(steps);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = ClientSettings {
      locale: Locale::En,
      ..ClientSettings::default()
    };
    let base = Url::parse("http://books.test").unwrap();
    let http =
      HttpClient::with_transport(base, settings, transport.clone()).with_notifier(notifier.clone());
    (BookApi::new(http), transport, notifier)
  }

  #[tokio::test]
  async fn test_list_sends_query() {
    let (api, transport, _) = api(vec![Step::ok(json!({
      "list": [{"_id": "b1", "name": "Dune"}],
      "total": 1
    }))]);

    let query = BookQuery {
      current: Some(2),
      page_size: Some(10),
      ..BookQuery::default()
    };
    let page = api.list(&query).await.unwrap().unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.list[0].name, "Dune");
    assert_eq!(
      transport.requests()[0].url.as_str(),
      "http://books.test/book/list?current=2&pageSize=10"
    );
  }

  #[tokio::test]
  async fn test_search_encodes_keyword() {
    let (api, transport, _) = api(vec![Step::ok(json!([]))]);
    let books = api.search("war & peace").await.unwrap().unwrap();
    assert!(books.is_empty());
    assert_eq!(
      transport.requests()[0].url.as_str(),
      "http://books.test/book/search?keyword=war+%26+peace"
    );
  }

  #[tokio::test]
  async fn test_create_shows_success() {
    let (api, transport, notifier) =
      api(vec![Step::envelope(200, "Created", json!({"_id": "b9"}))]);
    let book = Book {
      name: "Dune".to_string(),
      ..Book::default()
    };

    let created = api.create(&book).await.unwrap();
    assert_eq!(created, Some(json!({"_id": "b9"})));
    assert_eq!(notifier.successes(), vec!["Created".to_string()]);

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.body, Some(RequestBody::Json(json!({"name": "Dune"}))));
  }

  #[tokio::test]
  async fn test_update_and_delete_paths() {
    let (api, transport, notifier) = api(vec![Step::ok(json!(null)), Step::ok(json!(null))]);

    api.update("b1", &json!({"stock": 4})).await.unwrap();
    api.delete("b1").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::PUT);
    assert_eq!(requests[0].url.path(), "/book/b1");
    assert_eq!(requests[1].method, Method::DELETE);
    assert_eq!(requests[1].url.path(), "/book/b1");
    assert_eq!(notifier.successes().len(), 2);
  }

  #[tokio::test]
  async fn test_failed_login_resolves_none() {
    let (api, _, notifier) = api(vec![Step::envelope(400, "Wrong password", json!(null))]);
    let request = LoginRequest {
      name: "admin".to_string(),
      password: "nope".to_string(),
    };

    let res = api.login(&request, false).await.unwrap();
    assert_eq!(res, None);
    assert_eq!(notifier.errors(), vec!["Wrong password".to_string()]);
    assert_eq!(api.http().loading().count(), 0);
  }
}
