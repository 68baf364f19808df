use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, error, info, instrument, warn};

use super::domain::{
    classes_remaining, low_balance_alert, welcome, CheckInError, CheckInResult, MemberDisplay,
    ENJOY_WORKOUT, LOW_BALANCE_THRESHOLD, NO_CLASSES_LEFT,
};
use crate::workflows::membership::{
    MemberId, MemberRecord, MembershipApi, MembershipPlan, VisitRecord,
};

/// Source of the timestamp stamped on visit records.
pub type Clock = fn() -> DateTime<Local>;

/// Looks a member up, applies their plan, and logs the visit.
///
/// Holds no mutable state, so one instance serves every request. The remote API offers no
/// compare-and-swap: two kiosks checking in the same member at once can both decrement from
/// the same count.
pub struct CheckInProcessor<A> {
    api: Arc<A>,
    clock: Clock,
}

/// What the member's plan did to this check-in.
#[derive(Debug, Default)]
struct PlanOutcome {
    plan_label: String,
    classes_message: Option<String>,
    low_balance_alert: Option<String>,
    error: Option<CheckInError>,
}

impl PlanOutcome {
    fn message(plan_label: &str, message: &str) -> Self {
        Self {
            plan_label: plan_label.to_string(),
            classes_message: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn failed(plan_label: String, error: CheckInError) -> Self {
        Self {
            plan_label,
            error: Some(error),
            ..Self::default()
        }
    }
}

impl<A> CheckInProcessor<A>
where
    A: MembershipApi + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            clock: Local::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs one check-in. Failures become the result's error line; this never errors.
    #[instrument(name = "check_in", skip_all, fields(dni = %dni))]
    pub async fn process(&self, dni: &MemberId) -> CheckInResult {
        match self.check_in(dni).await {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "check-in rejected");
                CheckInResult::failed(error)
            }
        }
    }

    async fn check_in(&self, dni: &MemberId) -> Result<CheckInResult, CheckInError> {
        let members = self.api.list_members().await.map_err(|err| {
            error!(error = %err, "failed to fetch member list");
            CheckInError::from(&err)
        })?;
        debug!(members = members.len(), "member list fetched");

        let mut member = members
            .into_iter()
            .find(|member| &member.dni == dni)
            .ok_or(CheckInError::NotFound)?;

        let outcome = self.apply_plan(&mut member).await;
        self.record_visit(&member).await;

        let display_name = member.display_name();
        Ok(CheckInResult {
            welcome_message: welcome(&display_name),
            classes_message: outcome.classes_message,
            error_message: outcome.error.map(|error| error.to_string()),
            low_balance_alert: outcome.low_balance_alert,
            member: Some(MemberDisplay::from_record(&member, outcome.plan_label)),
            reload: true,
        })
    }

    async fn apply_plan(&self, member: &mut MemberRecord) -> PlanOutcome {
        let plan = match member.plan() {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "membership data is malformed");
                let label = member.plan_label().unwrap_or("Unknown").to_string();
                return PlanOutcome::failed(label, CheckInError::MembershipUnrecognized);
            }
        };

        match &plan {
            MembershipPlan::ClassPack {
                label,
                remaining: Some(remaining),
            } if *remaining > 0 => self.consume_class(member, label, *remaining).await,
            MembershipPlan::Unlimited { label } => PlanOutcome::message(label, ENJOY_WORKOUT),
            MembershipPlan::ClassPack { label, .. } => PlanOutcome::message(label, NO_CLASSES_LEFT),
            MembershipPlan::None => PlanOutcome {
                plan_label: plan.label().to_string(),
                ..PlanOutcome::default()
            },
        }
    }

    async fn consume_class(
        &self,
        member: &mut MemberRecord,
        label: &str,
        remaining: u32,
    ) -> PlanOutcome {
        let low_balance = remaining == LOW_BALANCE_THRESHOLD;
        // The alert follows the count the member actually holds after this attempt.
        let update_failed = || PlanOutcome {
            low_balance_alert: low_balance.then(|| low_balance_alert(remaining)),
            ..PlanOutcome::failed(label.to_string(), CheckInError::UpdateFailed)
        };

        let Some(record_id) = member.record_id.clone() else {
            error!("member record has no id, cannot update remaining classes");
            return update_failed();
        };

        let updated = remaining - 1;
        if let Err(err) = self.api.patch_remaining_classes(&record_id, updated).await {
            error!(error = %err, %record_id, "failed to update remaining classes");
            return update_failed();
        }

        member.set_remaining_classes(updated);
        info!(%record_id, remaining = updated, "class consumed");

        PlanOutcome {
            plan_label: label.to_string(),
            classes_message: Some(classes_remaining(updated)),
            low_balance_alert: low_balance.then(|| low_balance_alert(updated)),
            error: None,
        }
    }

    /// Best effort: a failed write is logged and never reaches the member.
    async fn record_visit(&self, member: &MemberRecord) {
        let visit = VisitRecord::for_member(member, (self.clock)());
        match self.api.record_visit(&visit).await {
            Ok(()) => debug!("visit recorded"),
            Err(err) => error!(error = %err, "failed to record visit"),
        }
    }
}
