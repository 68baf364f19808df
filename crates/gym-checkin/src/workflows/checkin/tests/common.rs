use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::workflows::checkin::CheckInProcessor;
use crate::workflows::membership::{
    MemberRecord, MembershipApi, MembershipApiError, RecordId, VisitRecord,
};

pub(super) enum ListBehavior {
    Members(Vec<MemberRecord>),
    Unreachable,
    InvalidPayload,
}

/// In-memory membership API that records every write it receives.
pub(super) struct FakeMembershipApi {
    list: ListBehavior,
    patch_fails: bool,
    visit_fails: bool,
    patches: Mutex<Vec<(RecordId, u32)>>,
    visits: Mutex<Vec<VisitRecord>>,
}

impl FakeMembershipApi {
    fn with_list(list: ListBehavior) -> Self {
        Self {
            list,
            patch_fails: false,
            visit_fails: false,
            patches: Mutex::new(Vec::new()),
            visits: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn with_members(members: Vec<MemberRecord>) -> Self {
        Self::with_list(ListBehavior::Members(members))
    }

    pub(super) fn unreachable() -> Self {
        Self::with_list(ListBehavior::Unreachable)
    }

    pub(super) fn invalid_payload() -> Self {
        Self::with_list(ListBehavior::InvalidPayload)
    }

    pub(super) fn failing_patch(mut self) -> Self {
        self.patch_fails = true;
        self
    }

    pub(super) fn failing_visit(mut self) -> Self {
        self.visit_fails = true;
        self
    }

    pub(super) fn patches(&self) -> Vec<(RecordId, u32)> {
        self.patches.lock().expect("patch mutex poisoned").clone()
    }

    pub(super) fn visits(&self) -> Vec<VisitRecord> {
        self.visits.lock().expect("visit mutex poisoned").clone()
    }
}

#[async_trait]
impl MembershipApi for FakeMembershipApi {
    async fn list_members(&self) -> Result<Vec<MemberRecord>, MembershipApiError> {
        match &self.list {
            ListBehavior::Members(members) => Ok(members.clone()),
            ListBehavior::Unreachable => Err(MembershipApiError::Unreachable(
                "connection refused".to_string(),
            )),
            ListBehavior::InvalidPayload => Err(MembershipApiError::InvalidPayload(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }

    async fn patch_remaining_classes(
        &self,
        record_id: &RecordId,
        remaining: u32,
    ) -> Result<(), MembershipApiError> {
        self.patches
            .lock()
            .expect("patch mutex poisoned")
            .push((record_id.clone(), remaining));
        if self.patch_fails {
            return Err(MembershipApiError::Rejected {
                operation: "remaining classes update",
                status: 500,
            });
        }
        Ok(())
    }

    async fn record_visit(&self, visit: &VisitRecord) -> Result<(), MembershipApiError> {
        self.visits
            .lock()
            .expect("visit mutex poisoned")
            .push(visit.clone());
        if self.visit_fails {
            return Err(MembershipApiError::Unreachable("timed out".to_string()));
        }
        Ok(())
    }
}

pub(super) fn fixed_clock() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .earliest()
        .expect("valid local time")
}

pub(super) fn class_pack_member(dni: &str, remaining: i64) -> MemberRecord {
    MemberRecord::new(dni)
        .with_record_id("41")
        .with_name("Ana", "Gómez")
        .with_plan_label("12 clases")
        .with_remaining_classes(remaining)
        .with_expiry(NaiveDate::from_ymd_opt(2025, 4, 30).expect("valid date"))
}

pub(super) fn unlimited_member(dni: &str) -> MemberRecord {
    MemberRecord::new(dni)
        .with_record_id("42")
        .with_name("Bruno", "Díaz")
        .with_plan_label("Pase Libre")
        .with_remaining_classes(6)
}

pub(super) fn build_processor(
    api: FakeMembershipApi,
) -> (CheckInProcessor<FakeMembershipApi>, Arc<FakeMembershipApi>) {
    let api = Arc::new(api);
    let processor = CheckInProcessor::new(api.clone()).with_clock(fixed_clock);
    (processor, api)
}
