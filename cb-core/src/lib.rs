pub mod builder;
pub mod configuration;
pub mod error;
pub mod provider_client;
pub mod reqwest_helpers;
pub mod template_service;
pub mod templates;

pub use error::TemplateError;
