pub mod app_state;
pub mod cache;
pub mod comparison;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod sitemap;
pub mod slug;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
