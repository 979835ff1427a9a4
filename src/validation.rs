use axum::http::StatusCode;

/// Trims `value` and checks it is non-empty and at most `max_len`
/// characters.
pub fn required_text(
    field: &str,
    value: &str,
    max_len: Option<usize>,
) -> Result<String, (StatusCode, String)> {
    let value = value.trim();
    if value.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{field} is required")));
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("{field} must be at most {max} characters"),
            ));
        }
    }
    Ok(value.to_string())
}

pub fn normalize_email(email: &str) -> Result<String, (StatusCode, String)> {
    required_text("email", email, None).map(|e| e.to_lowercase())
}
