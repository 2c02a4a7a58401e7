//! taskdesk - organizational task board library
//!
//! Managers create tasks with deadlines and ordered checklists and assign
//! them to a single user or to a whole department. Everyone sees the tasks
//! relevant to them, tracks status and ticks checklist items.
//!
//! # Core Concepts
//!
//! - **Actor**: the authenticated profile (Manager or Member) behind a call
//! - **Visibility**: which tasks an actor sees in the `all`, `mine` and
//!   `department` scopes
//! - **Data provider**: the storage seam; [`store::FileStore`] keeps an
//!   append-only event log plus a snapshot under `.taskdesk/`
//! - **Change notification**: [`watch::FileWatcher`] turns file changes into
//!   debounced change tokens
//!
//! # Module Organization
//!
//! - `model`: domain records (profiles, tasks, checklist items)
//! - `progress`, `visibility`, `filter`, `stats`, `validate`: pure board rules
//! - `board`: joins provider data and applies role checks to mutations
//! - `provider`: data provider and change notifier traits
//! - `storage`, `store`, `lock`: file-backed persistence
//! - `watch`, `refresh`: change subscription and refresh sequencing
//! - `avatar`: crop geometry and upload checks for profile pictures
//! - `config`: configuration loading from `.taskdesk.toml`
//! - `actor`: actor identity resolution
//! - `output`, `events`: human/JSON output and JSONL event stream
//! - `cli`: command-line interface using clap

pub mod actor;
pub mod avatar;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod lock;
pub mod model;
pub mod output;
pub mod progress;
pub mod provider;
pub mod refresh;
pub mod stats;
pub mod storage;
pub mod store;
pub mod validate;
pub mod visibility;
pub mod watch;

pub use error::{Error, Result};
