pub mod config;
pub mod database;
pub mod gateway;
pub mod handlers;
pub mod helpers;

pub use database::Database;
