pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod html;
pub mod pipeline;
pub mod processing;
pub mod render;
pub mod routing;
pub mod search;
pub mod templates;
pub mod types;
