use serde::Serialize;

/// Error envelope shared by every JSON error response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageLink {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct RandomImagesResponse {
    pub images: Vec<ImageLink>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub image_count: u64,
}
