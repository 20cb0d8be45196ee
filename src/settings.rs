//! Persisted settings: the birth date and the target age.
//!
//! Values are stored as strings under the keys `birthDate` (ISO date) and
//! `targetAge` (decimal), in a small JSON file that is replaced atomically.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::age;
use crate::stats::{self, TargetAge};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Please enter a birth date")]
    MissingBirthDate,

    #[error("Invalid birth date '{0}', expected YYYY-MM-DD")]
    InvalidBirthDate(String),

    #[error("Birth date {0} is in the future")]
    BirthDateInFuture(NaiveDate),

    #[error("Invalid target age '{0}', expected a whole number of years")]
    InvalidTargetAge(String),

    #[error("Target age {0} must be between {min} and {max}", min = TargetAge::MIN, max = TargetAge::MAX)]
    TargetAgeOutOfRange(i64),

    #[error("Target date for birth {0} is outside the supported calendar range")]
    TargetOutOfRange(NaiveDate),

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A validated birth date / target age pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    birth: NaiveDate,
    target_age: TargetAge,
}

impl Config {
    pub fn new(birth: NaiveDate, target_age: TargetAge, today: NaiveDate) -> Result<Self, SettingsError> {
        if birth > today {
            return Err(SettingsError::BirthDateInFuture(birth));
        }
        let config = Self { birth, target_age };
        if age::add_years(config.birth_instant(), target_age.get()).is_none() {
            return Err(SettingsError::TargetOutOfRange(birth));
        }
        Ok(config)
    }

    pub fn birth(&self) -> NaiveDate {
        self.birth
    }

    /// Wall-clock midnight of the birth date.
    pub fn birth_instant(&self) -> NaiveDateTime {
        self.birth.and_time(NaiveTime::MIN)
    }

    /// Midnight of the birth date in `tz`.
    pub fn birth_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        stats::localize(tz, self.birth_instant())
    }

    pub fn target_age(&self) -> TargetAge {
        self.target_age
    }
}

/// What the store holds; the birth date is absent until first configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredSettings {
    pub birth: Option<NaiveDate>,
    pub target_age: TargetAge,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            birth: None,
            target_age: TargetAge::DEFAULT,
        }
    }
}

impl StoredSettings {
    /// The usable configuration, or `None` when not yet configured.
    pub fn config(&self, today: NaiveDate) -> Option<Config> {
        let birth = self.birth?;
        match Config::new(birth, self.target_age, today) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring stored settings: {e}");
                None
            }
        }
    }
}

pub trait SettingsStore {
    fn get(&self) -> Result<StoredSettings, SettingsError>;
    fn set(&mut self, config: &Config) -> Result<(), SettingsError>;
}

/// On-disk layout: both values are strings.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Record {
    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    birth_date: Option<String>,
    #[serde(rename = "targetAge", default, skip_serializing_if = "Option::is_none")]
    target_age: Option<String>,
}

impl Record {
    fn from_config(config: &Config) -> Self {
        Self {
            birth_date: Some(config.birth().format("%Y-%m-%d").to_string()),
            target_age: Some(config.target_age().to_string()),
        }
    }

    fn into_settings(self) -> StoredSettings {
        let birth = self.birth_date.and_then(|raw| {
            parse_birth(&raw)
                .inspect_err(|e| warn!("Ignoring stored birth date: {e}"))
                .ok()
        });

        let target_age = self
            .target_age
            .and_then(|raw| {
                parse_target_age(&raw)
                    .inspect_err(|e| warn!("Ignoring stored target age: {e}"))
                    .ok()
            })
            .unwrap_or(TargetAge::DEFAULT);

        StoredSettings { birth, target_age }
    }
}

/// JSON file backed store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileStore {
    fn get(&self) -> Result<StoredSettings, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file yet");
                return Ok(StoredSettings::default());
            }
            Err(e) => return Err(e.into()),
        };
        let record: Record = serde_json::from_str(&raw)?;
        Ok(record.into_settings())
    }

    fn set(&mut self, config: &Config) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Write next to the target so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &Record::from_config(config))?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "Settings written");
        Ok(())
    }
}

fn parse_birth(text: &str) -> Result<NaiveDate, SettingsError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SettingsError::MissingBirthDate);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| SettingsError::InvalidBirthDate(text.to_string()))
}

fn parse_target_age(text: &str) -> Result<TargetAge, SettingsError> {
    let text = text.trim();
    let years: i64 = text
        .parse()
        .map_err(|_| SettingsError::InvalidTargetAge(text.to_string()))?;
    u32::try_from(years)
        .ok()
        .and_then(TargetAge::new)
        .ok_or(SettingsError::TargetAgeOutOfRange(years))
}

/// Validates user input into a configuration.
pub fn parse_update(birth: &str, target_age: &str, today: NaiveDate) -> Result<Config, SettingsError> {
    let birth = parse_birth(birth)?;
    let target_age = parse_target_age(target_age)?;
    Config::new(birth, target_age, today)
}

/// Validates and persists a new configuration. Nothing is written on error.
pub fn update(
    store: &mut impl SettingsStore,
    birth: &str,
    target_age: &str,
    today: NaiveDate,
) -> Result<Config, SettingsError> {
    let config = parse_update(birth, target_age, today)?;
    store.set(&config)?;
    info!(birth = %config.birth(), target_age = %config.target_age(), "Settings saved");
    Ok(config)
}
