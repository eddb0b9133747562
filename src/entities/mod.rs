pub mod prelude;

pub mod admin_users;
pub mod api_keys;
pub mod api_requests;
pub mod image_files;
pub mod settings;
