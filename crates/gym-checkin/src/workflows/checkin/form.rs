use serde::Deserialize;

use crate::workflows::membership::MemberId;

pub const DNI_MAX_LENGTH: usize = 20;
pub const DNI_PLACEHOLDER: &str = "Enter your DNI here";

/// Body of the kiosk form post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckInForm {
    #[serde(default)]
    pub dni: String,
    #[serde(rename = "csrfmiddlewaretoken", default)]
    pub csrf_token: String,
}

/// Body of the JSON check-in endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub dni: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DniError {
    #[error("This field is required.")]
    Required,
    #[error("Ensure this value has at most {max} characters (it has {actual}).")]
    TooLong { max: usize, actual: usize },
}

/// Trims surrounding whitespace and enforces the kiosk's length limit.
pub fn validate_dni(raw: &str) -> Result<MemberId, DniError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DniError::Required);
    }

    let actual = trimmed.chars().count();
    if actual > DNI_MAX_LENGTH {
        return Err(DniError::TooLong {
            max: DNI_MAX_LENGTH,
            actual,
        });
    }

    Ok(MemberId(trimmed.to_string()))
}
