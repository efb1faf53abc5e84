use std::future::Future;

use super::session::Session;
use crate::types::SessionId;

/// Consumer-provided session persistence.
///
/// Sessions are identified by opaque [`SessionId`]s minted by the portal. The
/// backing (memory, Redis, a database table) is the implementor's choice.
///
/// Implementations must make [`clear`](SessionStore::clear) atomic: a
/// concurrent [`load`](SessionStore::load) sees either the whole session or
/// the empty one, never a partially cleared state. Unknown ids load as
/// [`Session::default()`].
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for RedisSessions {
///     async fn load(&self, id: &SessionId) -> Result<Session, ...> {
///         Ok(self.redis.get_json(&id.0).await?.unwrap_or_default())
///     }
///
///     async fn save(&self, id: &SessionId, session: Session) -> Result<(), ...> {
///         self.redis.set_json(&id.0, &session, self.ttl).await
///     }
///
///     async fn clear(&self, id: &SessionId) -> Result<(), ...> {
///         self.redis.del(&id.0).await
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Read a fresh snapshot of the session.
    fn load(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Session, Box<dyn std::error::Error + Send + Sync>>> + Send;

    /// Replace the session contents.
    fn save(
        &self,
        id: &SessionId,
        session: Session,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;

    /// Drop every key of the session.
    fn clear(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;
}
