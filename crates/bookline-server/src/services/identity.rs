//! Identity resolver: maps a user to exactly one current identity and
//! owns every write to the `is_active` marker.

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use bookline_core::{
    creation_cooldown_remaining, CallerContext, CoreError, Identity, IdentityRole,
    IdentitySwitchRecord, IdentityVisibility, Result,
};
use bookline_storage::{DynIdentityStore, StorageError};

/// Resolves and maintains the user's current identity.
///
/// The `is_active` marker is only ever written here, through the
/// store's atomic `activate_exclusive`; no other code path touches it.
#[derive(Clone)]
pub struct IdentityResolver {
    store: DynIdentityStore,
}

impl IdentityResolver {
    pub fn new(store: DynIdentityStore) -> Self {
        Self { store }
    }

    /// The identity the user is currently acting as.
    ///
    /// If no identity is marked active, deterministically activates the
    /// oldest one and persists that choice, so a user with at least one
    /// identity always resolves. Calling twice with no intervening
    /// switch returns the same identity.
    pub async fn resolve_active(&self, user_id: Uuid) -> Result<Identity> {
        let identities = self.store.list_for_user(user_id).await?;
        if let Some(active) = identities.iter().find(|i| i.is_active) {
            return Ok(active.clone());
        }
        // Self-healing: fall back to the oldest identity and mark it.
        let oldest = identities
            .first()
            .ok_or_else(|| CoreError::not_found("identity", user_id.to_string()))?;
        debug!(%user_id, identity_id = %oldest.id, "no active identity, healing to oldest");
        let record = IdentitySwitchRecord::new(user_id, None, oldest.id);
        let healed = self
            .store
            .activate_exclusive(user_id, oldest.id, record)
            .await?;
        Ok(healed)
    }

    /// Resolve the user into a caller context for downstream services.
    pub async fn caller_context(&self, user_id: Uuid) -> Result<CallerContext> {
        let identity = self.resolve_active(user_id).await?;
        Ok(CallerContext::new(user_id, identity.id))
    }

    /// All identities the user owns, oldest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Identity>> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    /// Make `target_identity_id` the user's current identity.
    ///
    /// The switch audit record, the clearing of the previous marker,
    /// and the new marker land in one atomic write set.
    pub async fn switch(&self, user_id: Uuid, target_identity_id: Uuid) -> Result<Identity> {
        let target = self
            .store
            .get(target_identity_id)
            .await?
            .ok_or_else(|| CoreError::not_found("identity", target_identity_id.to_string()))?;
        if !target.is_owned_by(user_id) {
            return Err(CoreError::forbidden("identity.not_owner"));
        }
        if !target.is_verified() {
            return Err(CoreError::NotVerified);
        }
        if !target.activatable {
            return Err(CoreError::NotActivatable);
        }

        let from = self
            .store
            .list_for_user(user_id)
            .await?
            .into_iter()
            .find(|i| i.is_active)
            .map(|i| i.id);
        let record = IdentitySwitchRecord::new(user_id, from, target_identity_id);
        let switched = self
            .store
            .activate_exclusive(user_id, target_identity_id, record)
            .await?;
        info!(%user_id, identity_id = %target_identity_id, "identity switched");
        Ok(switched)
    }

    /// Create a new identity for the user, rate-limited to one per 72
    /// hours. Starts inactive and pending verification.
    pub async fn create(
        &self,
        user_id: Uuid,
        alias: impl Into<String>,
        role: IdentityRole,
        visibility: IdentityVisibility,
    ) -> Result<Identity> {
        let alias = alias.into();
        let existing = self.store.list_for_user(user_id).await?;
        if let Some(newest) = existing.iter().map(|i| i.created_at).max() {
            if let Some(hours) = creation_cooldown_remaining(newest, OffsetDateTime::now_utc()) {
                return Err(CoreError::CooldownActive {
                    retry_after_hours: hours,
                });
            }
        }

        let identity = Identity::new(user_id, alias.clone(), role, visibility)?;
        match self.store.insert(identity.clone()).await {
            Ok(()) => {
                info!(%user_id, identity_id = %identity.id, alias = %identity.alias, "identity created");
                Ok(identity)
            }
            Err(StorageError::AlreadyExists { .. }) => Err(CoreError::DuplicateAlias(alias)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an identity. The sole remaining identity and the
    /// currently active one cannot be removed.
    pub async fn delete(&self, user_id: Uuid, identity_id: Uuid) -> Result<()> {
        let identities = self.store.list_for_user(user_id).await?;
        let target = identities
            .iter()
            .find(|i| i.id == identity_id)
            .ok_or_else(|| CoreError::not_found("identity", identity_id.to_string()))?;
        if identities.len() == 1 {
            return Err(CoreError::forbidden("identity.sole_identity"));
        }
        if target.is_active {
            return Err(CoreError::forbidden("identity.currently_active"));
        }
        self.store.remove(identity_id).await?;
        info!(%user_id, %identity_id, "identity removed");
        Ok(())
    }

    /// Switch audit records for the user, newest first.
    pub async fn switch_history(&self, user_id: Uuid) -> Result<Vec<IdentitySwitchRecord>> {
        Ok(self.store.switch_history(user_id).await?)
    }
}
