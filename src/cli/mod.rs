//! Command-line interface for taskdesk
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::EventOutput;
use crate::model::Actor;
use crate::output::OutputOptions;
use crate::store::FileStore;
use crate::storage::Storage;

mod actor;
mod avatar;
mod init;
mod profile;
mod task;
mod watch;

/// taskdesk - organizational task board
///
/// Managers create tasks with deadlines and checklists and assign them to a
/// person or a whole department; everyone tracks status and checklist progress.
#[derive(Parser, Debug)]
#[command(name = "taskdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Board directory (defaults to current directory)
    #[arg(long, global = true, env = "TASKDESK_ROOT")]
    pub root: Option<PathBuf>,

    /// Profile id acting on the board
    #[arg(long, global = true, env = "TASKDESK_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSONL events to a file, or `-` for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the board directory and default configuration
    Init,

    /// User profiles
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Set or show the persisted actor identity
    #[command(subcommand)]
    Actor(ActorCommands),

    /// Tasks and checklists
    #[command(subcommand)]
    Task(TaskCommands),

    /// Print dashboard counters whenever the board changes
    Watch {
        /// Stop after the first change
        #[arg(long)]
        once: bool,

        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Avatar crop planning and upload checks
    #[command(subcommand)]
    Avatar(AvatarCommands),
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Register a profile
    Add {
        /// Full name
        name: String,

        #[arg(long)]
        email: String,

        /// manager or member
        #[arg(long)]
        role: String,

        /// Department (required for members)
        #[arg(long)]
        department: Option<String>,
    },

    /// List profiles
    List,

    /// Show one profile (defaults to the actor)
    Show { id: Option<String> },

    /// Change the actor's display name
    Rename { name: String },

    /// Show the acting profile and its role
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum ActorCommands {
    /// Persist the acting profile id
    Set { id: String },

    /// Show the resolved actor
    Show,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task with its checklist (managers only)
    New {
        title: String,

        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: String,

        /// Assign to one user (profile id)
        #[arg(long, conflicts_with = "department")]
        user: Option<String>,

        /// Assign to a whole department
        #[arg(long)]
        department: Option<String>,

        /// Checklist item (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List visible tasks
    List {
        /// all, mine or department
        #[arg(long, default_value = "all")]
        scope: String,

        /// all or a status
        #[arg(long)]
        status: Option<String>,

        /// Department filter (managers only)
        #[arg(long)]
        department: Option<String>,

        /// Case-insensitive text in title or description
        #[arg(long)]
        search: Option<String>,
    },

    /// Show a task with its checklist
    Show { id: String },

    /// Change a task's status
    Status { id: String, status: String },

    /// Mark a checklist item as done (or not done with --undo)
    Toggle {
        item_id: String,

        #[arg(long)]
        undo: bool,
    },

    /// Delete a task and its checklist (managers only)
    Delete { id: String },

    /// Dashboard counters for the actor
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum AvatarCommands {
    /// Map a crop on the displayed image to natural-resolution pixels
    Plan {
        /// Displayed size as WxH
        #[arg(long)]
        display: String,

        /// Natural size as WxH
        #[arg(long)]
        natural: String,

        /// Crop as x,y,w,h fractions (defaults to the centered square)
        #[arg(long)]
        crop: Option<String>,
    },

    /// Check an upload's content type and size
    Check {
        #[arg(long)]
        content_type: String,

        /// Size in bytes
        #[arg(long)]
        size: u64,
    },

    /// Validate an upload and record it as the actor's avatar
    Set {
        #[arg(long)]
        content_type: String,

        /// Size in bytes
        #[arg(long)]
        size: u64,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub(crate) struct Globals {
    pub root: Option<PathBuf>,
    pub actor: Option<String>,
    pub json: bool,
    pub quiet: bool,
    pub events: Option<String>,
}

impl Globals {
    pub fn root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Output settings; events on stdout take it over.
    pub fn output(&self, events: &EventOutput) -> OutputOptions {
        OutputOptions {
            json: self.json && !events.to_stdout(),
            quiet: self.quiet || events.to_stdout(),
        }
    }

    pub fn plain_output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

/// An opened board plus where it lives.
pub(crate) struct BoardContext {
    pub root: PathBuf,
    pub board: Board<FileStore>,
}

impl BoardContext {
    pub fn open(globals: &Globals) -> Result<Self> {
        let root = globals.root()?;
        let storage = Storage::new(&root);
        if !storage.is_initialized() {
            return Err(Error::InvalidArgument(format!(
                "no board at {} (run `taskdesk init`)",
                root.display()
            )));
        }
        let config = Config::load_from_root(&root);
        Ok(Self {
            board: Board::new(FileStore::new(storage), config),
            root,
        })
    }

    pub fn actor(&self, globals: &Globals) -> Result<Actor> {
        let id = crate::actor::require_actor_id(&self.root, globals.actor.as_deref())?;
        self.board.actor_for(&id)
    }
}

impl Cli {
    /// Whether a failure should be reported as a JSON envelope. Events on
    /// stdout take the stream over, so errors fall back to stderr text.
    pub fn json_errors(&self) -> bool {
        let events_to_stdout = self
            .events
            .as_deref()
            .is_some_and(|value| value.trim() == "-");
        self.json && !events_to_stdout
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let globals = Globals {
            root: self.root,
            actor: self.actor,
            json: self.json,
            quiet: self.quiet,
            events: self.events,
        };

        match self.command {
            Commands::Init => init::run(&globals),
            Commands::Profile(cmd) => match cmd {
                ProfileCommands::Add {
                    name,
                    email,
                    role,
                    department,
                } => profile::run_add(
                    &globals,
                    profile::AddOptions {
                        name,
                        email,
                        role,
                        department,
                    },
                ),
                ProfileCommands::List => profile::run_list(&globals),
                ProfileCommands::Show { id } => profile::run_show(&globals, id),
                ProfileCommands::Rename { name } => profile::run_rename(&globals, name),
                ProfileCommands::Whoami => profile::run_whoami(&globals),
            },
            Commands::Actor(cmd) => match cmd {
                ActorCommands::Set { id } => actor::run_set(&globals, id),
                ActorCommands::Show => actor::run_show(&globals),
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    deadline,
                    user,
                    department,
                    items,
                    description,
                } => task::run_new(
                    &globals,
                    task::NewOptions {
                        title,
                        deadline,
                        user,
                        department,
                        items,
                        description,
                    },
                ),
                TaskCommands::List {
                    scope,
                    status,
                    department,
                    search,
                } => task::run_list(
                    &globals,
                    task::ListOptions {
                        scope,
                        status,
                        department,
                        search,
                    },
                ),
                TaskCommands::Show { id } => task::run_show(&globals, id),
                TaskCommands::Status { id, status } => task::run_status(&globals, id, status),
                TaskCommands::Toggle { item_id, undo } => task::run_toggle(&globals, item_id, !undo),
                TaskCommands::Delete { id } => task::run_delete(&globals, id),
                TaskCommands::Stats => task::run_stats(&globals),
            },
            Commands::Watch { once, timeout } => watch::run(&globals, once, timeout),
            Commands::Avatar(cmd) => match cmd {
                AvatarCommands::Plan {
                    display,
                    natural,
                    crop,
                } => avatar::run_plan(&globals, display, natural, crop),
                AvatarCommands::Check { content_type, size } => {
                    avatar::run_check(&globals, content_type, size)
                }
                AvatarCommands::Set { content_type, size } => {
                    avatar::run_set(&globals, content_type, size)
                }
            },
        }
    }
}
