use crate::error::ApiError;

/// Maximum text length for a speak request
const MAX_TEXT_LENGTH: usize = 5000;

/// Validate a speak request before a session is started for it.
pub fn validate_speak_request(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::InvalidInput("Text cannot be empty".to_string()));
    }
    if text.len() > MAX_TEXT_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Text too long (max {} characters)",
            MAX_TEXT_LENGTH
        )));
    }

    Ok(())
}
