use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lesson::DEFAULT_BLANK_MARKER;
use crate::net::Endpoint;
use crate::session::{NarratedGate, SessionOptions};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_completion_score")]
    pub completion_score: u32,
    #[serde(default = "default_blank_marker")]
    pub blank_marker: char,
    #[serde(default = "default_exercise_type")]
    pub exercise_type: String,
    #[serde(default = "default_narrated_gate")]
    pub narrated_gate: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_completion_score() -> u32 {
    10
}
fn default_blank_marker() -> char {
    DEFAULT_BLANK_MARKER
}
fn default_exercise_type() -> String {
    "CP".to_string()
}
fn default_narrated_gate() -> String {
    "after_playback".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            username: String::new(),
            token: None,
            completion_score: default_completion_score(),
            blank_marker: default_blank_marker(),
            exercise_type: default_exercise_type(),
            narrated_gate: default_narrated_gate(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lectura")
            .join("config.toml")
    }

    /// Reset values a hand-edited file may have gotten wrong.
    pub fn validate(&mut self) {
        if NarratedGate::from_name(&self.narrated_gate).is_none() {
            warn!("unknown narrated_gate {:?}, using default", self.narrated_gate);
            self.narrated_gate = default_narrated_gate();
        }
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 120);
        if self.blank_marker.is_whitespace() || self.blank_marker.is_alphabetic() {
            warn!("blank_marker {:?} would collide with sentence text", self.blank_marker);
            self.blank_marker = default_blank_marker();
        }
        if self.exercise_type.trim().is_empty() {
            self.exercise_type = default_exercise_type();
        }
        self.server_url = self.server_url.trim().trim_end_matches('/').to_string();
        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.token = None;
        }
    }

    pub fn narrated_gate(&self) -> NarratedGate {
        NarratedGate::from_name(&self.narrated_gate).unwrap_or_default()
    }

    pub fn has_server(&self) -> bool {
        !self.server_url.is_empty()
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.server_url, self.token.clone(), self.request_timeout_secs)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            username: self.username.clone(),
            score: self.completion_score,
        }
    }
}
