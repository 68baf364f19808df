use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Shown when the API omits a member's name.
pub const NAME_PLACEHOLDER: &str = "Member";

/// Plan label displayed for members without a membership.
pub const NO_MEMBERSHIP_LABEL: &str = "No membership";

/// National identity number typed at the kiosk; the member key on the remote API.
/// Numeric DNIs sent by the API are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle the API uses to address a member record. Numeric ids are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Number(i64),
    Text(String),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            TextOrNumber::Number(value) => value.to_string(),
            TextOrNumber::Text(value) => value,
        }
    }
}

impl<'de> Deserialize<'de> for MemberId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        TextOrNumber::deserialize(deserializer).map(|raw| MemberId(raw.into_text()))
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        TextOrNumber::deserialize(deserializer).map(|raw| RecordId(raw.into_text()))
    }
}

/// Member record as served by `GET /api/socios/`.
///
/// Plan and expiry fields stay as raw JSON until they are read, so one malformed membership
/// surfaces as [`PlanError`] (or an unknown expiry) for that member instead of failing the
/// whole list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberRecord {
    pub dni: MemberId,
    #[serde(rename = "id", default)]
    pub record_id: Option<RecordId>,
    #[serde(rename = "nombre", default)]
    pub first_name: Option<String>,
    #[serde(rename = "apellido", default)]
    pub last_name: Option<String>,
    #[serde(rename = "tipo_mensualidad", default)]
    membership: Option<Value>,
    #[serde(rename = "clases_restantes", default)]
    remaining_classes: Option<Value>,
    #[serde(rename = "fecha_vencimiento", default)]
    expiry: Option<Value>,
}

impl MemberRecord {
    pub fn new(dni: impl Into<String>) -> Self {
        Self {
            dni: MemberId(dni.into()),
            record_id: None,
            first_name: None,
            last_name: None,
            membership: None,
            remaining_classes: None,
            expiry: None,
        }
    }

    pub fn with_record_id(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(RecordId(id.into()));
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_plan_label(mut self, label: impl Into<String>) -> Self {
        self.membership = Some(serde_json::json!({ "tipo": label.into() }));
        self
    }

    pub fn with_remaining_classes(mut self, remaining: i64) -> Self {
        self.remaining_classes = Some(Value::from(remaining));
        self
    }

    pub fn with_expiry(mut self, expires_on: NaiveDate) -> Self {
        self.expiry = Some(Value::from(expires_on.format("%Y-%m-%d").to_string()));
        self
    }

    /// Membership expiry date; `None` when absent or not a recognizable date.
    pub fn expires_on(&self) -> Option<NaiveDate> {
        self.expiry.as_ref().and_then(Value::as_str).and_then(parse_date)
    }

    /// First and last name joined, with [`NAME_PLACEHOLDER`] standing in for missing parts.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or(NAME_PLACEHOLDER);
        match self.last_name.as_deref() {
            Some(last) => format!("{first} {last}"),
            None => first.to_string(),
        }
    }

    /// Resolves the membership plan, failing on data the kiosk cannot interpret.
    pub fn plan(&self) -> Result<MembershipPlan, PlanError> {
        let Some(membership) = &self.membership else {
            return Ok(MembershipPlan::None);
        };

        let fields = membership.as_object().ok_or(PlanError::NotAnObject)?;
        let label = fields
            .get("tipo")
            .and_then(Value::as_str)
            .map(str::trim)
            .ok_or(PlanError::MissingLabel)?;

        match PlanKind::classify(label) {
            Some(PlanKind::ClassPack) => Ok(MembershipPlan::ClassPack {
                label: label.to_string(),
                remaining: self.checked_remaining()?,
            }),
            Some(PlanKind::Unlimited) => Ok(MembershipPlan::Unlimited {
                label: label.to_string(),
            }),
            None => Err(PlanError::UnknownLabel(label.to_string())),
        }
    }

    /// Plan label as sent by the API, even when the plan itself is not recognized.
    pub fn plan_label(&self) -> Option<&str> {
        self.membership
            .as_ref()
            .and_then(|membership| membership.get("tipo"))
            .and_then(Value::as_str)
    }

    /// Remaining classes when the API reports an integer; negative counts read as zero.
    pub fn remaining_classes(&self) -> Option<u32> {
        self.checked_remaining().ok().flatten()
    }

    pub(crate) fn set_remaining_classes(&mut self, remaining: u32) {
        self.remaining_classes = Some(Value::from(remaining));
    }

    fn checked_remaining(&self) -> Result<Option<u32>, PlanError> {
        let Some(raw) = &self.remaining_classes else {
            return Ok(None);
        };
        if raw.is_null() {
            return Ok(None);
        }

        let count = raw
            .as_i64()
            .ok_or_else(|| PlanError::InvalidRemaining(raw.to_string()))?;
        u32::try_from(count.max(0))
            .map(Some)
            .map_err(|_| PlanError::InvalidRemaining(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanKind {
    ClassPack,
    Unlimited,
}

impl PlanKind {
    /// `"12 clases"` style labels are class packs; `"Pase Libre"` is unlimited.
    fn classify(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("pase libre") {
            return Some(Self::Unlimited);
        }

        let mut parts = label.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(count), Some(unit), None)
                if unit.eq_ignore_ascii_case("clases")
                    && count.parse::<u32>().map(|n| n > 0).unwrap_or(false) =>
            {
                Some(Self::ClassPack)
            }
            _ => None,
        }
    }
}

/// Membership plan after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipPlan {
    ClassPack {
        label: String,
        remaining: Option<u32>,
    },
    Unlimited {
        label: String,
    },
    None,
}

impl MembershipPlan {
    pub fn label(&self) -> &str {
        match self {
            MembershipPlan::ClassPack { label, .. } | MembershipPlan::Unlimited { label } => {
                label.as_str()
            }
            MembershipPlan::None => NO_MEMBERSHIP_LABEL,
        }
    }
}

/// Membership data the kiosk refuses to interpret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("tipo_mensualidad is not an object")]
    NotAnObject,
    #[error("tipo_mensualidad has no textual tipo")]
    MissingLabel,
    #[error("unknown membership type '{0}'")]
    UnknownLabel(String),
    #[error("clases_restantes is not a class count: {0}")]
    InvalidRemaining(String),
}

/// Body of `POST /api/registrar-ingreso/`. Names are sent as the API knows them, never as
/// the display placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitRecord {
    #[serde(rename = "dni_socio")]
    pub dni: MemberId,
    #[serde(rename = "fecha_ingreso")]
    pub checked_in_at: DateTime<Local>,
    #[serde(rename = "clases_restantes_al_ingresar")]
    pub remaining_classes: Option<u32>,
    #[serde(rename = "nombre_socio")]
    pub first_name: Option<String>,
    #[serde(rename = "apellido_socio")]
    pub last_name: Option<String>,
}

impl VisitRecord {
    pub fn for_member(member: &MemberRecord, checked_in_at: DateTime<Local>) -> Self {
        Self {
            dni: member.dni.clone(),
            checked_in_at,
            remaining_classes: member.remaining_classes(),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
        }
    }
}

/// Accepts a plain `YYYY-MM-DD` date or a timestamp whose date part is wanted.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|at| at.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|at| at.date())
        })
}
