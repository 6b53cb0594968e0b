pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod types;
