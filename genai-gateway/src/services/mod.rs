pub mod content;
pub mod metrics;
pub mod providers;
