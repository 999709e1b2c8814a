//! Optimistic concurrency retry loop.

use std::future::Future;
use tracing::warn;

use super::error::{DirectoryError, Result};
use crate::store::{Entity, EntityKind, Repository, Versioned};

/// Outcome of one load-modify-save pass.
pub enum Attempt<T> {
    Done(T),
    /// The conditional save matched no row; reload and try again.
    Stale,
}

/// Run `attempt` until it completes, at most `conflict_retries + 1` times.
///
/// Errors from `attempt` are returned as-is without retrying.
pub async fn retry_stale<T, F, Fut>(conflict_retries: u32, kind: EntityKind, id: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>>>,
{
    let attempts = conflict_retries + 1;
    for n in 1..=attempts {
        match attempt().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Stale => warn!(kind = %kind, id = %id, attempt = n, "Stale write, reloading"),
        }
    }
    Err(DirectoryError::conflict(kind, id, attempts))
}

/// Load an entity for modification, `NotFound` when absent.
pub async fn load_versioned<E: Entity>(repo: &Repository<E>, id: &str) -> Result<Versioned<E>> {
    repo.find_by_id(id)
        .await
        .map_err(|source| DirectoryError::storage(format!("failed to get {}", E::KIND), source))?
        .ok_or_else(|| DirectoryError::not_found(E::KIND, id))
}

/// Conditional save of `current`, mapping a lost race to [`Attempt::Stale`].
pub async fn save_versioned<E: Entity, T>(
    repo: &Repository<E>,
    current: &Versioned<E>,
    context: &str,
    value: T,
) -> Result<Attempt<T>> {
    let saved = repo
        .save(current)
        .await
        .map_err(|source| DirectoryError::storage(context, source))?;
    Ok(if saved { Attempt::Done(value) } else { Attempt::Stale })
}
