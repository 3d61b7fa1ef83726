pub mod api_error;
pub mod app;
pub mod chartbrew_client;
