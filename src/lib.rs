pub mod app;
pub mod config;
pub mod error;
pub mod listing;
pub mod models;
pub mod movies_db;
pub mod pages;
pub mod proxy_client;
