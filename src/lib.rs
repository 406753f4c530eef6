pub mod config;
pub mod http;
pub mod models;
pub mod service;
pub mod sqlite;
pub mod store;
