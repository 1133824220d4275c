pub mod config;
pub mod display;
pub mod error;
pub mod flow;
pub mod models;
pub mod parse;
pub mod period;
pub mod portal;
pub mod setup;
pub mod vocabulary;

pub use error::{AppError, Result};
