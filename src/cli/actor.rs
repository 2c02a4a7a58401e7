//! taskdesk actor command implementation
//!
//! Provides actor identity helpers (set/show).

use std::path::PathBuf;

use crate::actor;
use crate::cli::{BoardContext, Globals};
use crate::error::{Error, Result};
use crate::model::Role;
use crate::output::{emit_success, HumanOutput};
use crate::provider::DataProvider;

#[derive(serde::Serialize)]
struct ActorSetReport {
    actor: String,
    path: PathBuf,
}

#[derive(serde::Serialize)]
struct ActorShowReport {
    actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

pub fn run_set(globals: &Globals, id: String) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let id = id.trim().to_string();
    if ctx.board.provider().get_profile(&id)?.is_none() {
        return Err(Error::ProfileNotFound(id));
    }

    actor::persist_actor(&ctx.root, &id)?;
    let path = ctx.board.provider().storage().actor_file();

    let report = ActorSetReport {
        actor: id.clone(),
        path: path.clone(),
    };

    let mut human = HumanOutput::new(format!("taskdesk actor set: {id}"));
    human.push_summary("actor", id);
    human.push_summary("path", path.display().to_string());
    human.push_next_step("taskdesk task list");

    emit_success(globals.plain_output(), "actor set", &report, Some(&human))
}

pub fn run_show(globals: &Globals) -> Result<()> {
    let root = globals.root()?;
    let resolved = actor::resolve_actor_id(&root, globals.actor.as_deref());

    let role = match (&resolved, BoardContext::open(globals)) {
        (Some(id), Ok(ctx)) => ctx.board.provider().get_profile(id)?.map(|profile| profile.role),
        _ => None,
    };

    let report = ActorShowReport {
        actor: resolved.clone(),
        role,
    };

    let header = match &resolved {
        Some(id) => format!("taskdesk actor: {id}"),
        None => "taskdesk actor: not set".to_string(),
    };
    let mut human = HumanOutput::new(header);
    if let Some(id) = &resolved {
        human.push_summary("actor", id.clone());
    }
    match (&resolved, role) {
        (None, _) => {
            human.push_warning("actor not set");
            human.push_next_step("taskdesk actor set <profile-id>");
        }
        (Some(_), None) => {
            human.push_warning("actor does not match any profile");
            human.push_next_step("taskdesk profile list");
        }
        (Some(_), Some(role)) => human.push_summary("role", role.label()),
    }

    emit_success(globals.plain_output(), "actor show", &report, Some(&human))
}
