pub use super::admin_users::Entity as AdminUsers;
pub use super::api_keys::Entity as ApiKeys;
pub use super::api_requests::Entity as ApiRequests;
pub use super::image_files::Entity as ImageFiles;
pub use super::settings::Entity as Settings;
