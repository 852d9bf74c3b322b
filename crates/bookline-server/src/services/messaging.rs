//! Messaging thread engine: lazily-paired two-party threads, read
//! tracking, and soft-deleted messages.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use bookline_core::{CallerContext, CoreError, DomainEvent, Message, MessageThread, Result};
use bookline_notify::EventSink;
use bookline_storage::{DynIdentityStore, DynMessageStore};

/// A thread as listed for the caller, with their unread flag.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    #[serde(flatten)]
    pub thread: MessageThread,
    pub unread: bool,
}

#[derive(Clone)]
pub struct MessagingEngine {
    store: DynMessageStore,
    identities: DynIdentityStore,
    events: EventSink,
}

impl MessagingEngine {
    pub fn new(store: DynMessageStore, identities: DynIdentityStore, events: EventSink) -> Self {
        Self {
            store,
            identities,
            events,
        }
    }

    /// Append a message to the pair's thread, creating the thread on
    /// first contact. Never creates a second thread for the same pair.
    /// The recipient must be an existing identity; otherwise the pair
    /// lookup would mint a thread addressed to nobody.
    pub async fn send(
        &self,
        ctx: &CallerContext,
        recipient_identity_id: Uuid,
        body: impl Into<String>,
    ) -> Result<Message> {
        if recipient_identity_id == ctx.identity_id {
            return Err(CoreError::validation(
                "recipient_id",
                "cannot message yourself",
            ));
        }
        self.identities
            .get(recipient_identity_id)
            .await?
            .ok_or_else(|| CoreError::not_found("identity", recipient_identity_id.to_string()))?;
        let mut thread = self
            .store
            .find_or_create_thread(ctx.identity_id, recipient_identity_id)
            .await?;
        let message = Message::new(thread.id, ctx.identity_id, body)?;
        self.store.insert_message(message.clone()).await?;
        thread.last_message_at = message.sent_at;
        self.store.update_thread(thread).await?;
        debug!(message_id = %message.id, thread_id = %message.thread_id, "message sent");
        self.events
            .dispatch(DomainEvent::message_sent(message.clone()));
        Ok(message)
    }

    /// Caller's threads, latest activity first, with unread flags.
    pub async fn threads(&self, ctx: &CallerContext) -> Result<Vec<ThreadSummary>> {
        let threads = self
            .store
            .list_threads_for_identity(ctx.identity_id)
            .await?;
        Ok(threads
            .into_iter()
            .map(|thread| {
                let unread = thread.has_unread(ctx.identity_id);
                ThreadSummary { thread, unread }
            })
            .collect())
    }

    /// Active messages of a thread, oldest first; participants only.
    pub async fn messages(&self, ctx: &CallerContext, thread_id: Uuid) -> Result<Vec<Message>> {
        self.participant_thread(ctx, thread_id).await?;
        Ok(self.store.list_messages(thread_id).await?)
    }

    /// Stamp the caller's read marker on the thread.
    pub async fn mark_read(&self, ctx: &CallerContext, thread_id: Uuid) -> Result<()> {
        let mut thread = self.participant_thread(ctx, thread_id).await?;
        thread.mark_read(ctx.identity_id)?;
        self.store.update_thread(thread).await?;
        Ok(())
    }

    /// Soft-delete the caller's own message; recoverable, excluded from
    /// future reads.
    pub async fn delete_message(&self, ctx: &CallerContext, message_id: Uuid) -> Result<()> {
        let mut message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or_else(|| CoreError::not_found("message", message_id.to_string()))?;
        // NotFound for non-senders so message existence is not leaked
        if message.sender_identity_id != ctx.identity_id {
            return Err(CoreError::not_found("message", message_id.to_string()));
        }
        message.mark_deleted();
        self.store.update_message(message).await?;
        Ok(())
    }

    async fn participant_thread(
        &self,
        ctx: &CallerContext,
        thread_id: Uuid,
    ) -> Result<MessageThread> {
        let thread = self
            .store
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| CoreError::not_found("thread", thread_id.to_string()))?;
        if !thread.has_participant(ctx.identity_id) {
            return Err(CoreError::not_found("thread", thread_id.to_string()));
        }
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookline_core::{Identity, IdentityRole, IdentityVisibility};
    use bookline_storage::memory::MemoryStore;
    use bookline_storage::IdentityStore;
    use std::sync::Arc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn engine() -> (MessagingEngine, Arc<MemoryStore>, UnboundedReceiver<DomainEvent>) {
        let store = Arc::new(MemoryStore::new());
        let (events, rx) = EventSink::capture();
        (
            MessagingEngine::new(store.clone(), store.clone(), events),
            store,
            rx,
        )
    }

    async fn participant(store: &Arc<MemoryStore>) -> CallerContext {
        let identity = Identity::new(
            Uuid::new_v4(),
            Uuid::new_v4().to_string(),
            IdentityRole::User,
            IdentityVisibility::Public,
        )
        .unwrap();
        store.insert(identity.clone()).await.unwrap();
        CallerContext::new(identity.owner_user_id, identity.id)
    }

    #[tokio::test]
    async fn test_send_creates_thread_and_emits() {
        let (engine, store, mut rx) = engine();
        let alice = participant(&store).await;
        let bob = participant(&store).await;

        let message = engine.send(&alice, bob.identity_id, "hi bob").await.unwrap();
        match rx.try_recv().unwrap() {
            DomainEvent::MessageSent(e) => {
                assert_eq!(e.thread_id, message.thread_id);
                assert_eq!(e.message.id, message.id);
            }
            other => panic!("unexpected event: {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_send_to_unknown_recipient_creates_nothing() {
        let (engine, store, mut rx) = engine();
        let alice = participant(&store).await;

        let result = engine.send(&alice, Uuid::new_v4(), "anyone there?").await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));

        // No orphan thread, no event
        assert!(engine.threads(&alice).await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pairing_is_idempotent_in_both_directions() {
        let (engine, store, _rx) = engine();
        let alice = participant(&store).await;
        let bob = participant(&store).await;

        let first = engine.send(&alice, bob.identity_id, "hi").await.unwrap();
        let reply = engine.send(&bob, alice.identity_id, "hey").await.unwrap();
        assert_eq!(first.thread_id, reply.thread_id);

        assert_eq!(engine.threads(&alice).await.unwrap().len(), 1);
        assert_eq!(engine.threads(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_self_message_rejected() {
        let (engine, store, _rx) = engine();
        let alice = participant(&store).await;
        let result = engine.send(&alice, alice.identity_id, "note to self").await;
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_unread_flag_follows_read_marker() {
        let (engine, store, _rx) = engine();
        let alice = participant(&store).await;
        let bob = participant(&store).await;
        let message = engine.send(&alice, bob.identity_id, "hi").await.unwrap();

        let threads = engine.threads(&bob).await.unwrap();
        assert!(threads[0].unread);

        engine.mark_read(&bob, message.thread_id).await.unwrap();
        let threads = engine.threads(&bob).await.unwrap();
        assert!(!threads[0].unread);
    }

    #[tokio::test]
    async fn test_outsiders_get_not_found() {
        let (engine, store, _rx) = engine();
        let alice = participant(&store).await;
        let bob = participant(&store).await;
        let outsider = participant(&store).await;
        let message = engine.send(&alice, bob.identity_id, "secret").await.unwrap();

        let result = engine.messages(&outsider, message.thread_id).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        let result = engine.mark_read(&outsider, message.thread_id).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        let result = engine.delete_message(&outsider, message.id).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_soft_deleted_message_leaves_reads() {
        let (engine, store, _rx) = engine();
        let alice = participant(&store).await;
        let bob = participant(&store).await;
        let kept = engine.send(&alice, bob.identity_id, "keep").await.unwrap();
        let gone = engine.send(&alice, bob.identity_id, "oops").await.unwrap();

        engine.delete_message(&alice, gone.id).await.unwrap();
        let messages = engine.messages(&bob, kept.thread_id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_recipient_cannot_delete_senders_message() {
        let (engine, store, _rx) = engine();
        let alice = participant(&store).await;
        let bob = participant(&store).await;
        let message = engine.send(&alice, bob.identity_id, "mine").await.unwrap();

        let result = engine.delete_message(&bob, message.id).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        assert_eq!(
            engine.messages(&bob, message.thread_id).await.unwrap().len(),
            1
        );
    }
}
