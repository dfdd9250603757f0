pub mod app_data;
pub mod progress;
