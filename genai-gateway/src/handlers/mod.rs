//! HTTP handlers for the GenAI gateway.

pub mod generate;
pub mod health;
mod upload;

pub use upload::UploadForm;
