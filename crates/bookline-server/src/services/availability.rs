//! Availability ledger: per-identity weekly scheduling windows plus the
//! presence signal layered on top.

use serde::Deserialize;
use time::Time;
use tracing::info;
use uuid::Uuid;

use bookline_core::{
    AvailabilityPatch, AvailabilityRule, AvailabilityUpdateType, BookingType, CallerContext,
    CoreError, DomainEvent, PresenceStatus, Result,
};
use bookline_notify::EventSink;
use bookline_storage::{DynAvailabilityStore, StorageError};

/// Fields of a rule as submitted by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDraft {
    pub day_of_week: u8,
    pub start_time: Time,
    pub end_time: Time,
    pub booking_type: BookingType,
    #[serde(default = "default_is_available")]
    pub is_available: bool,
}

fn default_is_available() -> bool {
    true
}

#[derive(Clone)]
pub struct AvailabilityLedger {
    store: DynAvailabilityStore,
    events: EventSink,
}

impl AvailabilityLedger {
    pub fn new(store: DynAvailabilityStore, events: EventSink) -> Self {
        Self { store, events }
    }

    /// Rules for the caller's identity, ordered by `(day, start_time)`.
    pub async fn list(&self, ctx: &CallerContext) -> Result<Vec<AvailabilityRule>> {
        Ok(self.store.list_for_identity(ctx.identity_id).await?)
    }

    /// Create one rule and announce the schedule change.
    pub async fn create(&self, ctx: &CallerContext, draft: RuleDraft) -> Result<AvailabilityRule> {
        let rule = AvailabilityRule::new(
            ctx.identity_id,
            draft.day_of_week,
            draft.start_time,
            draft.end_time,
            draft.booking_type,
            draft.is_available,
        )?;
        self.store
            .insert(rule.clone())
            .await
            .map_err(window_conflict)?;
        self.events.dispatch(DomainEvent::availability_changed(
            ctx.identity_id,
            Some(rule.clone()),
            AvailabilityUpdateType::ScheduleChanged,
        ));
        Ok(rule)
    }

    /// Patch an owned rule, re-validating changed fields. A patch that
    /// would land the rule on another rule's exact window is rejected
    /// like a duplicate create.
    pub async fn update(
        &self,
        ctx: &CallerContext,
        rule_id: Uuid,
        patch: AvailabilityPatch,
    ) -> Result<AvailabilityRule> {
        let mut rule = self.owned_rule(ctx, rule_id).await?;
        rule.apply(&patch)?;
        self.store
            .update(rule.clone())
            .await
            .map_err(window_conflict)?;
        self.events.dispatch(DomainEvent::availability_changed(
            ctx.identity_id,
            Some(rule.clone()),
            AvailabilityUpdateType::ScheduleChanged,
        ));
        Ok(rule)
    }

    /// Remove an owned rule. The event carries no rule; subscribers
    /// refetch rather than patch.
    pub async fn delete(&self, ctx: &CallerContext, rule_id: Uuid) -> Result<()> {
        self.owned_rule(ctx, rule_id).await?;
        self.store.remove(rule_id).await?;
        self.events.dispatch(DomainEvent::availability_changed(
            ctx.identity_id,
            None,
            AvailabilityUpdateType::ScheduleChanged,
        ));
        Ok(())
    }

    /// Atomically replace the identity's whole rule set.
    ///
    /// Emits a single bulk event regardless of how many rules were
    /// submitted, to avoid fan-out storms.
    pub async fn replace_all(
        &self,
        ctx: &CallerContext,
        drafts: Vec<RuleDraft>,
    ) -> Result<Vec<AvailabilityRule>> {
        let mut rules = Vec::with_capacity(drafts.len());
        for draft in drafts {
            rules.push(AvailabilityRule::new(
                ctx.identity_id,
                draft.day_of_week,
                draft.start_time,
                draft.end_time,
                draft.booking_type,
                draft.is_available,
            )?);
        }
        self.store
            .replace_all(ctx.identity_id, rules.clone())
            .await
            .map_err(window_conflict)?;
        info!(identity_id = %ctx.identity_id, rules = rules.len(), "availability replaced");
        self.events.dispatch(DomainEvent::availability_changed(
            ctx.identity_id,
            None,
            AvailabilityUpdateType::BulkUpdate,
        ));
        Ok(rules)
    }

    /// Presence signal: touches no rule rows, only emits.
    pub async fn set_presence(&self, ctx: &CallerContext, status: PresenceStatus) -> Result<()> {
        self.events.dispatch(DomainEvent::availability_changed(
            ctx.identity_id,
            None,
            status.update_type(),
        ));
        Ok(())
    }

    async fn owned_rule(&self, ctx: &CallerContext, rule_id: Uuid) -> Result<AvailabilityRule> {
        let rule = self
            .store
            .get(rule_id)
            .await?
            .ok_or_else(|| CoreError::not_found("availability rule", rule_id.to_string()))?;
        if !rule.is_owned_by(ctx.identity_id) {
            return Err(CoreError::forbidden("availability.not_owner"));
        }
        Ok(rule)
    }
}

/// Identical-window collisions surface as a field-level validation
/// error on every write path, not just create.
fn window_conflict(err: StorageError) -> CoreError {
    match err {
        StorageError::AlreadyExists { .. } => CoreError::validation(
            "time_window",
            "an identical window already exists for this day",
        ),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookline_core::events::AvailabilityChangedEvent;
    use bookline_storage::memory::MemoryStore;
    use std::sync::Arc;
    use time::macros::time;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn ledger() -> (AvailabilityLedger, UnboundedReceiver<DomainEvent>) {
        let store = Arc::new(MemoryStore::new());
        let (events, rx) = EventSink::capture();
        (AvailabilityLedger::new(store, events), rx)
    }

    fn ctx() -> CallerContext {
        CallerContext::new(Uuid::new_v4(), Uuid::new_v4())
    }

    fn draft(day: u8, start: Time, end: Time) -> RuleDraft {
        RuleDraft {
            day_of_week: day,
            start_time: start,
            end_time: end,
            booking_type: BookingType::Consultation,
            is_available: true,
        }
    }

    fn availability_event(event: DomainEvent) -> AvailabilityChangedEvent {
        match event {
            DomainEvent::AvailabilityChanged(e) => e,
            other => panic!("unexpected event: {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_create_emits_schedule_changed_with_rule() {
        let (ledger, mut rx) = ledger();
        let ctx = ctx();
        let rule = ledger
            .create(&ctx, draft(1, time!(09:00), time!(12:00)))
            .await
            .unwrap();

        let event = availability_event(rx.try_recv().unwrap());
        assert_eq!(event.identity_id, ctx.identity_id);
        assert_eq!(event.update_type, AvailabilityUpdateType::ScheduleChanged);
        assert_eq!(event.rule.unwrap().id, rule.id);
    }

    #[tokio::test]
    async fn test_invalid_window_writes_nothing_and_emits_nothing() {
        let (ledger, mut rx) = ledger();
        let ctx = ctx();
        let result = ledger
            .create(&ctx, draft(3, time!(17:00), time!(09:00)))
            .await;
        assert!(matches!(result, Err(CoreError::InvalidTimeRange { .. })));
        assert!(ledger.list(&ctx).await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_identical_window_rejected_overlap_allowed() {
        let (ledger, _rx) = ledger();
        let ctx = ctx();
        ledger
            .create(&ctx, draft(1, time!(09:00), time!(12:00)))
            .await
            .unwrap();

        let result = ledger
            .create(&ctx, draft(1, time!(09:00), time!(12:00)))
            .await;
        assert!(matches!(result, Err(CoreError::Validation { .. })));

        // Overlapping-but-distinct windows coexist
        ledger
            .create(&ctx, draft(1, time!(10:00), time!(11:00)))
            .await
            .unwrap();
        assert_eq!(ledger.list(&ctx).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_patch_onto_identical_window_rejected_without_event() {
        let (ledger, mut rx) = ledger();
        let ctx = ctx();
        ledger
            .create(&ctx, draft(1, time!(09:00), time!(12:00)))
            .await
            .unwrap();
        let movable = ledger
            .create(&ctx, draft(1, time!(10:00), time!(11:00)))
            .await
            .unwrap();
        while rx.try_recv().is_ok() {}

        let patch = AvailabilityPatch {
            start_time: Some(time!(09:00)),
            end_time: Some(time!(12:00)),
            ..Default::default()
        };
        let result = ledger.update(&ctx, movable.id, patch).await;
        assert!(
            matches!(result, Err(CoreError::Validation { ref field, .. }) if field == "time_window")
        );
        assert!(rx.try_recv().is_err());

        // The rule keeps its previous window
        let rules = ledger.list(&ctx).await.unwrap();
        assert!(rules.iter().any(|r| r.id == movable.id && r.start_time == time!(10:00)));
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicate_windows_in_submission() {
        let (ledger, mut rx) = ledger();
        let ctx = ctx();
        ledger
            .create(&ctx, draft(0, time!(07:00), time!(08:00)))
            .await
            .unwrap();
        while rx.try_recv().is_ok() {}

        let duplicated = vec![
            draft(1, time!(09:00), time!(12:00)),
            draft(1, time!(09:00), time!(12:00)),
        ];
        let result = ledger.replace_all(&ctx, duplicated).await;
        assert!(
            matches!(result, Err(CoreError::Validation { ref field, .. }) if field == "time_window")
        );
        assert!(rx.try_recv().is_err());

        // Previous rule set survives the rejected bulk
        let rules = ledger.list(&ctx).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].day_of_week, 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_require_ownership() {
        let (ledger, mut rx) = ledger();
        let owner = ctx();
        let stranger = ctx();
        let rule = ledger
            .create(&owner, draft(2, time!(08:00), time!(10:00)))
            .await
            .unwrap();
        let _ = rx.try_recv();

        let patch = AvailabilityPatch {
            is_available: Some(false),
            ..Default::default()
        };
        let result = ledger.update(&stranger, rule.id, patch.clone()).await;
        assert!(matches!(result, Err(CoreError::Forbidden(_))));
        let result = ledger.delete(&stranger, rule.id).await;
        assert!(matches!(result, Err(CoreError::Forbidden(_))));
        assert!(rx.try_recv().is_err());

        let updated = ledger.update(&owner, rule.id, patch).await.unwrap();
        assert!(!updated.is_available);
        ledger.delete(&owner, rule.id).await.unwrap();
        assert!(ledger.list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_event_carries_no_rule() {
        let (ledger, mut rx) = ledger();
        let ctx = ctx();
        let rule = ledger
            .create(&ctx, draft(5, time!(14:00), time!(16:00)))
            .await
            .unwrap();
        let _ = rx.try_recv();

        ledger.delete(&ctx, rule.id).await.unwrap();
        let event = availability_event(rx.try_recv().unwrap());
        assert!(event.rule.is_none());
    }

    #[tokio::test]
    async fn test_replace_all_round_trips_and_emits_once() {
        let (ledger, mut rx) = ledger();
        let ctx = ctx();
        ledger
            .create(&ctx, draft(0, time!(07:00), time!(08:00)))
            .await
            .unwrap();
        let _ = rx.try_recv();

        let submitted = vec![
            draft(1, time!(09:00), time!(12:00)),
            draft(2, time!(10:00), time!(13:00)),
            draft(3, time!(11:00), time!(14:00)),
        ];
        let replaced = ledger.replace_all(&ctx, submitted).await.unwrap();
        assert_eq!(replaced.len(), 3);

        let listed = ledger.list(&ctx).await.unwrap();
        assert_eq!(listed, replaced);

        let event = availability_event(rx.try_recv().unwrap());
        assert_eq!(event.update_type, AvailabilityUpdateType::BulkUpdate);
        assert!(rx.try_recv().is_err(), "exactly one event for the bulk");
    }

    #[tokio::test]
    async fn test_presence_mapping_is_verbatim() {
        let (ledger, mut rx) = ledger();
        let ctx = ctx();
        let cases = [
            (PresenceStatus::Online, AvailabilityUpdateType::WentOnline),
            (PresenceStatus::Available, AvailabilityUpdateType::WentOnline),
            (PresenceStatus::Offline, AvailabilityUpdateType::WentOffline),
            (PresenceStatus::Busy, AvailabilityUpdateType::StatusChanged),
        ];
        for (status, expected) in cases {
            ledger.set_presence(&ctx, status).await.unwrap();
            let event = availability_event(rx.try_recv().unwrap());
            assert_eq!(event.update_type, expected);
            assert!(event.rule.is_none());
        }
    }
}
