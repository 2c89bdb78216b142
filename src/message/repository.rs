use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::MessageModel;
use crate::shared::AppError;

/// Trait for message repository operations
///
/// Reaction counters are owned by the store: increments and decrements are single
/// atomic updates that return the new total.
#[async_trait]
pub trait MessageRepository {
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError>;
    async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError>;
    async fn list_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError>;
    async fn increment_reaction(&self, message_id: Uuid) -> Result<i64, AppError>;

    /// Never takes the count below zero
    async fn decrement_reaction(&self, message_id: Uuid) -> Result<i64, AppError>;
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError>;

    async fn message_exists(&self, room_id: Uuid, message_id: Uuid) -> Result<bool, AppError> {
        Ok(self.get_message(room_id, message_id).await?.is_some())
    }
}

fn message_not_found() -> AppError {
    AppError::NotFound("message not found".to_string())
}

/// In-memory implementation of MessageRepository for development and testing
///
/// Messages are kept in insertion order.
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<MessageModel>>,
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    fn messages(&self) -> MutexGuard<'_, Vec<MessageModel>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<T>(
        &self,
        message_id: Uuid,
        apply: impl FnOnce(&mut MessageModel) -> T,
    ) -> Result<T, AppError> {
        let mut messages = self.messages();
        let message = messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(message_not_found)?;

        Ok(apply(message))
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, message))]
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError> {
        let model = MessageModel::new(room_id, message.to_string());
        let id = model.id;
        self.messages().push(model);

        debug!(room_id = %room_id, message_id = %id, "Message stored in memory");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError> {
        Ok(self
            .messages()
            .iter()
            .find(|m| m.id == message_id && m.room_id == room_id)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        Ok(self
            .messages()
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn increment_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        self.update(message_id, |m| {
            m.reaction_count += 1;
            m.reaction_count
        })
    }

    #[instrument(skip(self))]
    async fn decrement_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        self.update(message_id, |m| {
            m.reaction_count = (m.reaction_count - 1).max(0);
            m.reaction_count
        })
    }

    #[instrument(skip(self))]
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        self.update(message_id, |m| m.answered = true)
    }
}

/// PostgreSQL implementation of message repository
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Message query failed");
    AppError::DatabaseError(e.to_string())
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, message))]
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO messages (id, room_id, message) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(room_id)
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        debug!(room_id = %room_id, message_id = %id, "Message stored in database");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<Option<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered FROM messages WHERE id = $1 AND room_id = $2",
        )
        .bind(message_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn list_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered FROM messages WHERE room_id = $1 ORDER BY seq",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn increment_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE messages SET reaction_count = reaction_count + 1 WHERE id = $1 RETURNING reaction_count",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or_else(message_not_found)
    }

    #[instrument(skip(self))]
    async fn decrement_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE messages SET reaction_count = GREATEST(reaction_count - 1, 0) WHERE id = $1 RETURNING reaction_count",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or_else(message_not_found)
    }

    #[instrument(skip(self))]
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE messages SET answered = TRUE WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(message_not_found());
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn message_exists(&self, room_id: Uuid, message_id: Uuid) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM messages WHERE id = $1 AND room_id = $2)",
        )
        .bind(message_id)
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get_message() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();

        let id = repo.insert_message(room_id, "what is Pin?").await.unwrap();

        let message = repo.get_message(room_id, id).await.unwrap().unwrap();
        assert_eq!(message.message, "what is Pin?");
        assert_eq!(message.reaction_count, 0);
        assert!(!message.answered);
        assert!(repo.message_exists(room_id, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_message_is_scoped_to_its_room() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();
        let other_room = Uuid::new_v4();

        let id = repo.insert_message(room_id, "scoped").await.unwrap();

        assert!(repo.get_message(other_room, id).await.unwrap().is_none());
        assert!(!repo.message_exists(other_room, id).await.unwrap());
        assert!(repo.list_room_messages(other_room).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_room_messages_keeps_insertion_order() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();

        let first = repo.insert_message(room_id, "first").await.unwrap();
        let second = repo.insert_message(room_id, "second").await.unwrap();

        let ids: Vec<Uuid> = repo
            .list_room_messages(room_id)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_reaction_counter() {
        let repo = InMemoryMessageRepository::new();
        let id = repo.insert_message(Uuid::new_v4(), "react").await.unwrap();

        assert_eq!(repo.increment_reaction(id).await.unwrap(), 1);
        assert_eq!(repo.increment_reaction(id).await.unwrap(), 2);
        assert_eq!(repo.decrement_reaction(id).await.unwrap(), 1);
        assert_eq!(repo.decrement_reaction(id).await.unwrap(), 0);
        assert_eq!(repo.decrement_reaction(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_answered() {
        let repo = InMemoryMessageRepository::new();
        let room_id = Uuid::new_v4();
        let id = repo.insert_message(room_id, "answer me").await.unwrap();

        repo.mark_answered(id).await.unwrap();
        repo.mark_answered(id).await.unwrap();

        assert!(repo.get_message(room_id, id).await.unwrap().unwrap().answered);
    }

    #[tokio::test]
    async fn test_updates_on_missing_message_are_not_found() {
        let repo = InMemoryMessageRepository::new();
        let missing = Uuid::new_v4();

        assert!(matches!(
            repo.increment_reaction(missing).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.decrement_reaction(missing).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.mark_answered(missing).await,
            Err(AppError::NotFound(_))
        ));
    }
}
