//! Typed endpoint wrappers built on [`crate::http::HttpClient`].

mod book;
mod types;

pub use book::BookApi;
pub use types::{Book, BookPage, BookQuery, LoginRequest, LoginResponse};
