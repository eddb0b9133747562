pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{ApiKeyUsage, AuthError, AuthService, IssuedApiKey};
pub use auth_service_impl::SeaOrmAuthService;

pub mod image_service;
pub use image_service::{CatalogueSummary, ImageError, ImageService};

pub mod session;
pub use session::{AdminIdentity, SessionManager};

pub mod settings;
pub use settings::{RuntimeSettings, SettingsError, SettingsForm, SettingsService};
