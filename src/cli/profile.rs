//! taskdesk profile command implementations.

use crate::cli::{BoardContext, Globals};
use crate::error::{Error, Result};
use crate::events::{EventKind, EventOutput};
use crate::model::{Department, NewProfile, Profile, Role};
use crate::output::{emit_success, HumanOutput};
use crate::provider::DataProvider;

pub struct AddOptions {
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: Option<String>,
}

#[derive(serde::Serialize)]
struct ProfileListOutput {
    total: usize,
    profiles: Vec<Profile>,
}

#[derive(serde::Serialize)]
struct WhoamiOutput {
    profile: Profile,
    initials: String,
    role_label: &'static str,
}

pub fn run_add(globals: &Globals, options: AddOptions) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut events = EventOutput::open(globals.events.as_deref())?;
    let role: Role = options.role.parse().map_err(Error::InvalidArgument)?;

    let profile = ctx.board.register_profile(&NewProfile {
        full_name: options.name,
        email: options.email,
        role,
        department: options.department.as_deref().map(Department::from),
    })?;

    let event_warning = events.emit(EventKind::ProfileCreated, Some(&profile.id), &profile);

    let mut human = HumanOutput::new("Profile created");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_profile_summary(&mut human, &profile);
    if crate::actor::resolve_stored_actor_id(&ctx.root).is_none() {
        human.push_next_step(format!("taskdesk actor set {}", profile.id));
    }

    emit_success(globals.output(&events), "profile add", &profile, Some(&human))
}

pub fn run_list(globals: &Globals) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut profiles = ctx.board.provider().list_profiles()?;
    profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name).then_with(|| a.id.cmp(&b.id)));

    let mut human = HumanOutput::new("Profiles");
    human.push_summary("Total", profiles.len().to_string());
    for profile in &profiles {
        let department = profile
            .department
            .as_ref()
            .map(|department| format!(", {department}"))
            .unwrap_or_default();
        human.push_detail(format!(
            "{} {} ({}{}) {}",
            profile.id,
            profile.full_name,
            profile.role.label(),
            department,
            profile.email
        ));
    }

    let output = ProfileListOutput {
        total: profiles.len(),
        profiles,
    };
    emit_success(globals.plain_output(), "profile list", &output, Some(&human))
}

pub fn run_show(globals: &Globals, id: Option<String>) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let id = match id {
        Some(id) => id.trim().to_string(),
        None => crate::actor::require_actor_id(&ctx.root, globals.actor.as_deref())?,
    };
    let profile = ctx
        .board
        .provider()
        .get_profile(&id)?
        .ok_or_else(|| Error::ProfileNotFound(id.clone()))?;

    let mut human = HumanOutput::new(format!("Profile {}", profile.full_name));
    push_profile_summary(&mut human, &profile);
    emit_success(globals.plain_output(), "profile show", &profile, Some(&human))
}

pub fn run_rename(globals: &Globals, name: String) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut events = EventOutput::open(globals.events.as_deref())?;
    let actor = ctx.actor(globals)?;

    let profile = ctx.board.rename_profile(&actor, &name)?;
    let event_warning = events.emit(EventKind::ProfileUpdated, Some(actor.id()), &profile);

    let mut human = HumanOutput::new("Profile updated");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_profile_summary(&mut human, &profile);
    emit_success(globals.output(&events), "profile rename", &profile, Some(&human))
}

pub fn run_whoami(globals: &Globals) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let actor = ctx.actor(globals)?;
    let profile = ctx
        .board
        .provider()
        .get_profile(actor.id())?
        .ok_or_else(|| Error::UnknownActor(actor.id().to_string()))?;

    let mut human = HumanOutput::new(format!("{} ({})", profile.full_name, profile.initials()));
    push_profile_summary(&mut human, &profile);

    let output = WhoamiOutput {
        initials: profile.initials(),
        role_label: profile.role.label(),
        profile,
    };
    emit_success(globals.plain_output(), "profile whoami", &output, Some(&human))
}

pub(crate) fn push_profile_summary(human: &mut HumanOutput, profile: &Profile) {
    human.push_summary("ID", profile.id.clone());
    human.push_summary("Name", profile.full_name.clone());
    human.push_summary("Email", profile.email.clone());
    human.push_summary("Role", profile.role.label());
    if let Some(department) = &profile.department {
        human.push_summary("Department", department.to_string());
    }
    if let Some(avatar) = &profile.avatar_url {
        human.push_summary("Avatar", avatar.clone());
    }
}
