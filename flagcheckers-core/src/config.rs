//! Game configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::Team;

/// Default seconds on the turn clock
pub const DEFAULT_TURN_SECONDS: u32 = 60;

/// Default cap on actions the scripted driver takes per turn
pub const DEFAULT_AI_ACTION_CAP: usize = 16;

/// Default pause between scripted actions (presentation only)
pub const DEFAULT_AI_STEP_DELAY_MS: u64 = 200;

/// Who drives a team
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    /// Actions submitted from outside; knights picked manually
    Human,
    /// Actions chosen by the scripted driver; knights picked automatically
    Scripted,
}

/// Game configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Team that moves on turn 1
    pub first_team: Team,
    pub blue: Controller,
    pub red: Controller,
    /// Maximum actions per scripted turn
    pub ai_action_cap: usize,
    /// Turn clock length; the engine only reacts to its expiry
    pub turn_seconds: u32,
    /// Pause between scripted actions when shown to a human
    pub ai_step_delay_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            first_team: Team::Blue,
            blue: Controller::Scripted,
            red: Controller::Human,
            ai_action_cap: DEFAULT_AI_ACTION_CAP,
            turn_seconds: DEFAULT_TURN_SECONDS,
            ai_step_delay_ms: DEFAULT_AI_STEP_DELAY_MS,
        }
    }
}

impl GameConfig {
    pub fn controller(&self, team: Team) -> Controller {
        match team {
            Team::Blue => self.blue,
            Team::Red => self.red,
        }
    }

    /// Both teams human (engine-only use, tests)
    pub fn hot_seat() -> Self {
        Self {
            blue: Controller::Human,
            red: Controller::Human,
            ..Default::default()
        }
    }

    pub fn with_controller(mut self, team: Team, controller: Controller) -> Self {
        match team {
            Team::Blue => self.blue = controller,
            Team::Red => self.red = controller,
        }
        self
    }

    pub fn with_first_team(mut self, team: Team) -> Self {
        self.first_team = team;
        self
    }

    pub fn with_action_cap(mut self, cap: usize) -> Self {
        self.ai_action_cap = cap;
        self
    }

    pub fn with_turn_seconds(mut self, seconds: u32) -> Self {
        self.turn_seconds = seconds;
        self
    }

    /// Load from JSON file; missing fields take defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ai_action_cap == 0 {
            anyhow::bail!("ai_action_cap must be at least 1");
        }
        if self.turn_seconds == 0 {
            anyhow::bail!("turn_seconds must be at least 1");
        }
        Ok(())
    }
}
