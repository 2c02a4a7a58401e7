//! Storage layer for taskdesk
//!
//! All board state lives under one directory next to the configuration:
//!
//! ```text
//! <root>/
//!   .taskdesk.toml              # Configuration (optional)
//!   .taskdesk/
//!     actor                     # Persisted actor identity (profile id)
//!     profiles.json             # Registry of user profiles
//!     tasks.jsonl               # Append-only task/checklist event log
//!     tasks.snapshot.json       # Materialized tasks + checklist items
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, lock_path_for, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::Profile;

/// Name of the data directory under the board root
pub const DATA_DIR: &str = ".taskdesk";

pub const PROFILES_FILE: &str = "profiles.json";
pub const TASKS_LOG: &str = "tasks.jsonl";
pub const TASKS_SNAPSHOT: &str = "tasks.snapshot.json";

/// Storage manager for board state
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.taskdesk/` directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn actor_file(&self) -> PathBuf {
        self.data_dir().join("actor")
    }

    pub fn profiles_file(&self) -> PathBuf {
        self.data_dir().join(PROFILES_FILE)
    }

    pub fn tasks_log(&self) -> PathBuf {
        self.data_dir().join(TASKS_LOG)
    }

    pub fn tasks_snapshot(&self) -> PathBuf {
        self.data_dir().join(TASKS_SNAPSHOT)
    }

    // =========================================================================
    // Directory initialization
    // =========================================================================

    /// Create the data directory and empty registries
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir())?;

        let profiles = self.profiles_file();
        if !profiles.exists() {
            self.write_json(&profiles, &ProfilesRegistry::default())?;
        }

        let log = self.tasks_log();
        if !log.exists() {
            File::create(&log)?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir().exists()
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON atomically (temp file + rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Append one record to a JSONL file.
    ///
    /// Not atomic on its own; callers hold the file's lock.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;
        Ok(())
    }

    /// Read all records from a JSONL file, skipping blank lines
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line).map_err(|err| {
                Error::DataAccess(format!(
                    "{} line {}: {err}",
                    path.display(),
                    index + 1
                ))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    // =========================================================================
    // Actor persistence
    // =========================================================================

    pub fn read_actor(&self) -> Option<String> {
        fs::read_to_string(self.actor_file())
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|actor| !actor.is_empty())
    }

    pub fn write_actor(&self, actor: &str) -> Result<()> {
        lock::write_atomic(self.actor_file(), format!("{actor}\n").as_bytes())
    }

    // =========================================================================
    // Profile registry (locked read-modify-write)
    // =========================================================================

    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let path = self.profiles_file();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let registry: ProfilesRegistry = self.read_json(&path)?;
        Ok(registry.profiles)
    }

    pub fn update_profiles<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ProfilesRegistry) -> Result<T>,
    {
        let path = self.profiles_file();
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut registry = if path.exists() {
            self.read_json(&path)?
        } else {
            ProfilesRegistry::default()
        };

        let result = f(&mut registry)?;
        registry.validate()?;
        self.write_json(&path, &registry)?;
        Ok(result)
    }
}

/// Stored set of user profiles
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesRegistry {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl ProfilesRegistry {
    pub fn find(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|profile| profile.id == id)
    }

    pub fn insert(&mut self, profile: Profile) -> Result<()> {
        if self.find(&profile.id).is_some() {
            return Err(Error::InvalidArgument(format!(
                "profile already exists: {}",
                profile.id
            )));
        }
        if !profile.email.is_empty()
            && self
                .profiles
                .iter()
                .any(|existing| existing.email.eq_ignore_ascii_case(&profile.email))
        {
            return Err(Error::InvalidArgument(format!(
                "email already registered: {}",
                profile.email
            )));
        }
        self.profiles.push(profile);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for profile in &self.profiles {
            if !seen.insert(profile.id.as_str()) {
                return Err(Error::DataAccess(format!(
                    "duplicate profile id in registry: {}",
                    profile.id
                )));
            }
        }
        Ok(())
    }
}
