//! Explicit caller context passed into every domain operation.
//!
//! Every service call takes a `CallerContext` naming the authenticated
//! user and the identity they are currently acting as. There is no
//! ambient "current identity" accessor; authorization inputs are always
//! visible in the operation signature.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated principal and their resolved current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// The authenticated user
    pub user_id: Uuid,
    /// The identity the user is presently acting as
    pub identity_id: Uuid,
}

impl CallerContext {
    pub fn new(user_id: Uuid, identity_id: Uuid) -> Self {
        Self {
            user_id,
            identity_id,
        }
    }

    /// Whether the caller is acting as the given identity.
    pub fn acts_as(&self, identity_id: Uuid) -> bool {
        self.identity_id == identity_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acts_as() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ctx = CallerContext::new(Uuid::new_v4(), me);
        assert!(ctx.acts_as(me));
        assert!(!ctx.acts_as(other));
    }
}
