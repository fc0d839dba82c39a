//! Client library for the Libris book-management backend.

pub mod api;
pub mod config;
pub mod http;
pub mod i18n;
pub mod logging;
