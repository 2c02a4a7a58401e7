//! taskdesk avatar command implementations.

use chrono::Utc;
use serde::Serialize;

use crate::avatar::{
    avatar_object_path, centered_square_crop_with, validate_upload, CropRegion, Size, SourceRect,
};
use crate::cli::profile::push_profile_summary;
use crate::cli::{BoardContext, Globals};
use crate::config::Config;
use crate::error::Result;
use crate::events::{EventKind, EventOutput};
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct CropPlan {
    display: Size,
    natural: Size,
    crop: CropRegion,
    source: SourceRect,
    output_size: u32,
}

#[derive(Serialize)]
struct UploadCheck {
    content_type: String,
    size: u64,
    max_bytes: u64,
}

pub fn run_plan(
    globals: &Globals,
    display: String,
    natural: String,
    crop: Option<String>,
) -> Result<()> {
    let config = Config::load_from_root(&globals.root()?);
    let display = Size::parse(&display)?;
    let natural = Size::parse(&natural)?;
    let crop = match crop.as_deref() {
        Some(raw) => CropRegion::parse(raw)?,
        None => centered_square_crop_with(
            display.width,
            display.height,
            config.avatar.initial_crop_percent,
        ),
    };
    let source = SourceRect::from_display(&crop, display, natural)?;

    let plan = CropPlan {
        display,
        natural,
        crop,
        source,
        output_size: config.avatar.output_size,
    };

    let mut human = HumanOutput::new("Avatar crop");
    human.push_summary(
        "Source",
        format!(
            "x={:.1} y={:.1} {:.1}x{:.1} px",
            source.x, source.y, source.width, source.height
        ),
    );
    human.push_summary(
        "Output",
        format!("{0}x{0} px", config.avatar.output_size),
    );
    emit_success(globals.plain_output(), "avatar plan", &plan, Some(&human))
}

pub fn run_check(globals: &Globals, content_type: String, size: u64) -> Result<()> {
    let config = Config::load_from_root(&globals.root()?);
    let report = check_upload(&config, content_type, size)?;

    let mut human = HumanOutput::new("Avatar upload accepted");
    human.push_summary("Type", report.content_type.clone());
    human.push_summary("Size", format!("{} of {} bytes", report.size, report.max_bytes));
    emit_success(globals.plain_output(), "avatar check", &report, Some(&human))
}

pub fn run_set(globals: &Globals, content_type: String, size: u64) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut events = EventOutput::open(globals.events.as_deref())?;
    let actor = ctx.actor(globals)?;
    check_upload(ctx.board.config(), content_type, size)?;

    let path = avatar_object_path(actor.id(), Utc::now());
    let profile = ctx.board.set_avatar(&actor, &path)?;
    tracing::info!(actor = actor.id(), path = %path, "avatar updated");

    let event_warning = events.emit(EventKind::ProfileUpdated, Some(actor.id()), &profile);

    let mut human = HumanOutput::new("Avatar updated");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    push_profile_summary(&mut human, &profile);
    emit_success(globals.output(&events), "avatar set", &profile, Some(&human))
}

fn check_upload(config: &Config, content_type: String, size: u64) -> Result<UploadCheck> {
    validate_upload(&content_type, size, &config.avatar)?;
    Ok(UploadCheck {
        content_type: content_type.trim().to_ascii_lowercase(),
        size,
        max_bytes: config.avatar.max_bytes,
    })
}
