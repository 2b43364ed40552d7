//! Author-only mutation.
//!
//! Every update or delete of a post or comment goes through [`ensure_author`].
//! A mismatch is not a hard failure: the caller is sent back to the read-only
//! view of the same resource.

use uuid::Uuid;

use crate::error::DomainError;

/// The authenticated user performing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
}

impl Actor {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Permit the operation iff `actor` is the record's author.
///
/// `redirect_to` is the read-only view the caller lands on when rejected.
pub fn ensure_author(
    actor: &Actor,
    author_id: Uuid,
    redirect_to: impl Into<String>,
) -> Result<(), DomainError> {
    if actor.id == author_id {
        return Ok(());
    }

    let redirect_to = redirect_to.into();
    tracing::info!(
        actor_id = %actor.id,
        author_id = %author_id,
        redirect_to = %redirect_to,
        "Rejected mutation by non-author"
    );
    Err(DomainError::NotAuthor { redirect_to })
}
