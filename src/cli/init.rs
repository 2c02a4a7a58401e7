//! taskdesk init command implementation
//!
//! Creates the `.taskdesk/` data directory and a default `.taskdesk.toml`.

use std::path::{Path, PathBuf};

use crate::cli::Globals;
use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::storage::{Storage, DATA_DIR};

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    data_dir: bool,
}

pub fn run(globals: &Globals) -> Result<()> {
    let root = globals.root()?;
    std::fs::create_dir_all(&root)?;

    let storage = Storage::new(&root);
    let created_data_dir = !storage.is_initialized();
    storage.init()?;
    let created_config = ensure_config(&root)?;

    tracing::info!(root = %root.display(), created_data_dir, created_config, "board initialized");

    let report = InitReport {
        root: root.clone(),
        created: InitCreated {
            config: created_config,
            data_dir: created_data_dir,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_data_dir {
        created_items.push(format!("{DATA_DIR}/"));
    }

    let header = if created_items.is_empty() {
        "taskdesk init: already initialized".to_string()
    } else {
        "taskdesk init: initialized".to_string()
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    if !created_items.is_empty() {
        human.push_summary("created", created_items.join(", "));
    }
    human.push_next_step("taskdesk profile add \"<name>\" --email <email> --role manager");

    emit_success(globals.plain_output(), "init", &report, Some(&human))
}

fn ensure_config(root: &Path) -> Result<bool> {
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }
    Config::default().save(&path)?;
    Ok(true)
}
