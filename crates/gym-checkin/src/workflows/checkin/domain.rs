use chrono::NaiveDate;
use serde::Serialize;

use crate::workflows::membership::{MemberRecord, MembershipApiError};

pub const IDLE_WELCOME: &str = "Welcome to the gym";
pub const ENJOY_WORKOUT: &str = "enjoy your workout";
pub const NO_CLASSES_LEFT: &str = "no classes remaining, renew membership";

/// A class pack holding this many classes before the check-in triggers the low-balance alert.
pub const LOW_BALANCE_THRESHOLD: u32 = 2;

pub(crate) fn welcome(display_name: &str) -> String {
    format!("Welcome, {display_name}!")
}

pub(crate) fn classes_remaining(remaining: u32) -> String {
    match remaining {
        1 => "1 class remaining".to_string(),
        n => format!("{n} classes remaining"),
    }
}

pub(crate) fn low_balance_alert(remaining: u32) -> String {
    match remaining {
        1 => "Only 1 class left, renew soon!".to_string(),
        n => format!("Only {n} classes left, renew soon!"),
    }
}

/// Outcomes of a check-in that the kiosk reports as an error line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckInError {
    #[error("could not reach the membership service")]
    Unreachable,
    #[error("the membership service returned invalid data")]
    InvalidPayload,
    #[error("member not found")]
    NotFound,
    #[error("failed to update classes")]
    UpdateFailed,
    #[error("failed to process membership")]
    MembershipUnrecognized,
}

impl From<&MembershipApiError> for CheckInError {
    fn from(value: &MembershipApiError) -> Self {
        match value {
            MembershipApiError::InvalidPayload(_) => Self::InvalidPayload,
            MembershipApiError::Unreachable(_)
            | MembershipApiError::Rejected { .. }
            | MembershipApiError::Client(_) => Self::Unreachable,
        }
    }
}

/// Member block shown under the welcome line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDisplay {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub plan_label: String,
    pub remaining_classes: Option<u32>,
    pub expires_on: Option<NaiveDate>,
}

impl MemberDisplay {
    pub(crate) fn from_record(member: &MemberRecord, plan_label: String) -> Self {
        Self {
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            plan_label,
            remaining_classes: member.remaining_classes(),
            expires_on: member.expires_on(),
        }
    }
}

/// Everything the kiosk page renders after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInResult {
    pub welcome_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_balance_alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberDisplay>,
    pub reload: bool,
}

impl CheckInResult {
    /// Page state before anyone submits a DNI.
    pub fn idle() -> Self {
        Self {
            welcome_message: IDLE_WELCOME.to_string(),
            classes_message: None,
            error_message: None,
            low_balance_alert: None,
            member: None,
            reload: false,
        }
    }

    /// Lookup failed: no welcome, only the error line.
    pub fn failed(error: CheckInError) -> Self {
        Self {
            welcome_message: String::new(),
            classes_message: None,
            error_message: Some(error.to_string()),
            low_balance_alert: None,
            member: None,
            reload: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_page_does_not_reload() {
        let result = CheckInResult::idle();
        assert_eq!(result.welcome_message, IDLE_WELCOME);
        assert!(!result.reload);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn failed_result_clears_welcome() {
        let result = CheckInResult::failed(CheckInError::NotFound);
        assert!(result.welcome_message.is_empty());
        assert_eq!(result.error_message.as_deref(), Some("member not found"));
        assert!(result.reload);
    }

    #[test]
    fn remaining_messages_pluralize() {
        assert_eq!(classes_remaining(1), "1 class remaining");
        assert_eq!(classes_remaining(0), "0 classes remaining");
        assert_eq!(classes_remaining(11), "11 classes remaining");
    }

    #[test]
    fn api_errors_map_onto_lookup_failures() {
        let unreachable = MembershipApiError::Unreachable("timed out".to_string());
        let invalid = MembershipApiError::InvalidPayload("eof".to_string());
        assert_eq!(CheckInError::from(&unreachable), CheckInError::Unreachable);
        assert_eq!(CheckInError::from(&invalid), CheckInError::InvalidPayload);
    }
}
