pub const VALID_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

pub mod session {
    pub const COOKIE_NAME: &str = "shufflr-session";

    pub const TTL_HOURS: i64 = 24;

    /// Configured secrets are padded or truncated to this many bytes before
    /// HKDF expands them into the cookie signing and encryption keys.
    pub const SECRET_LEN: usize = 32;
}

pub mod headers {
    pub const API_KEY: &str = "X-API-Key";

    pub const BEARER_PREFIX: &str = "Bearer ";
}

pub mod settings {
    pub const REQUIRE_API_KEY_FOR_IMAGES: &str = "require_api_key_for_images";

    pub const DEFAULT_IMAGE_COUNT: &str = "default_image_count";

    pub const MAX_IMAGE_COUNT: &str = "max_image_count";

    pub const CORS_ENABLED: &str = "cors_enabled";

    pub const CORS_ORIGINS: &str = "cors_origins";
}

pub mod limits {
    pub const MIN_USERNAME_LEN: usize = 3;

    pub const MIN_PASSWORD_LEN: usize = 6;

    pub const MAX_KEY_NAME_LEN: usize = 100;

    pub const MAX_FILENAME_LEN: usize = 255;

    /// Raw API tokens are this many random bytes, hex encoded.
    pub const API_TOKEN_BYTES: usize = 32;
}
