//! Actor identity management.
//!
//! Actor resolution order:
//! 1) CLI --actor (explicit)
//! 2) TASKDESK_ACTOR environment variable
//! 3) Persisted value in .taskdesk/actor
//! 4) Config default (actor.default)
//!
//! The resolved value is a profile id; [`crate::board::Board::actor_for`]
//! turns it into an [`crate::model::Actor`].

use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

pub const ACTOR_ENV: &str = "TASKDESK_ACTOR";

/// Resolve the current actor id, if any source names one.
pub fn resolve_actor_id(root: &Path, cli_actor: Option<&str>) -> Option<String> {
    if let Some(actor) = non_empty(cli_actor) {
        return Some(actor.to_string());
    }

    if let Ok(env_actor) = std::env::var(ACTOR_ENV) {
        if let Some(actor) = non_empty(Some(env_actor.as_str())) {
            return Some(actor.to_string());
        }
    }

    resolve_stored_actor_id(root)
}

/// Persisted actor, then the configured default. Ignores CLI and environment.
pub fn resolve_stored_actor_id(root: &Path) -> Option<String> {
    if let Some(actor) = Storage::new(root).read_actor() {
        return Some(actor);
    }

    Config::load_from_root(root)
        .actor
        .default
        .and_then(|actor| non_empty(Some(actor.as_str())).map(str::to_string))
}

/// Like [`resolve_actor_id`] but an unset actor is an error.
pub fn require_actor_id(root: &Path, cli_actor: Option<&str>) -> Result<String> {
    resolve_actor_id(root, cli_actor).ok_or_else(|| {
        Error::UnknownActor("no actor set (use --actor, TASKDESK_ACTOR or `taskdesk actor set`)".to_string())
    })
}

/// Persist the actor identity in `.taskdesk/actor`.
pub fn persist_actor(root: &Path, actor: &str) -> Result<()> {
    let actor = non_empty(Some(actor))
        .ok_or_else(|| Error::InvalidArgument("actor id cannot be empty".to_string()))?;
    Storage::new(root).write_actor(actor)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
