pub mod admin;
pub mod api_key;
pub mod image;
pub mod settings;
