use super::ApiError;

pub fn validate_id(id: i32, what: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {what} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Toggle forms post the target state as `"true"` or `"false"`.
#[must_use]
pub fn parse_enabled_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

pub fn validate_required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}
