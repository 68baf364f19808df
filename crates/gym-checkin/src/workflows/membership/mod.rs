//! Membership records and the remote API that owns them.

pub mod client;
pub mod domain;
pub mod parser;

pub use client::{HttpMembershipApi, MembershipApi, MembershipApiError};
pub use domain::{
    MemberId, MemberRecord, MembershipPlan, PlanError, RecordId, VisitRecord, NAME_PLACEHOLDER,
    NO_MEMBERSHIP_LABEL,
};
pub use parser::{parse_member_list, MemberListError};
