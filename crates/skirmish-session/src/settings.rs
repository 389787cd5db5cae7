//! Session settings: what only the operator sees, and what everyone shares.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SessionError;
use crate::blob::{from_blob, to_blob};

// ---------------------------------------------------------------------------
// Rules building blocks
// ---------------------------------------------------------------------------

/// A playable faction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Faction {
    /// Stable identifier, e.g. `"GAIANS"`.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Faction {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// The "pick one for me" faction every rule set starts players on.
    pub fn random() -> Self {
        Self::new("RANDOM", "Random")
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How hard the game is for a player, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum DifficultyLevel {
    #[default]
    Citizen,
    Specialist,
    Talent,
    Librarian,
    Thinker,
    Transcend,
}

/// The rule set players join under.
///
/// New players start on [`GameRules::default_faction`] and
/// [`GameRules::default_difficulty_level`]; they may change both later
/// through slot updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    /// Factions a player may pick, in display order.
    pub factions: Vec<Faction>,
    default_faction: Faction,
    default_difficulty: DifficultyLevel,
}

impl GameRules {
    /// Faction assigned to a player when they take a seat.
    pub fn default_faction(&self) -> &Faction {
        &self.default_faction
    }

    /// Difficulty assigned to a player when they take a seat.
    pub fn default_difficulty_level(&self) -> DifficultyLevel {
        self.default_difficulty
    }

    /// Overrides the difficulty new players start on.
    pub fn set_default_difficulty_level(&mut self, difficulty: DifficultyLevel) {
        self.default_difficulty = difficulty;
    }

    /// Resets to the built-in faction list and defaults.
    pub fn initialize(&mut self) {
        *self = Self::default();
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            factions: vec![
                Faction::random(),
                Faction::new("GAIANS", "Gaia's Stepdaughters"),
                Faction::new("HIVE", "Human Hive"),
                Faction::new("UNIVERSITY", "University of Planet"),
                Faction::new("MORGANITES", "Morgan Industries"),
                Faction::new("SPARTANS", "Spartan Federation"),
                Faction::new("BELIEVERS", "The Lord's Believers"),
                Faction::new("PEACEKEEPERS", "Peacekeeping Forces"),
            ],
            default_faction: Faction::random(),
            default_difficulty: DifficultyLevel::Citizen,
        }
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapSize {
    Tiny,
    Small,
    #[default]
    Standard,
    Large,
    Huge,
}

/// A three-step knob used by several map parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapParameter {
    Low,
    #[default]
    Average,
    High,
}

/// Parameters the map generator runs with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSettings {
    pub size: MapSize,
    pub ocean: MapParameter,
    pub erosion: MapParameter,
    pub lifeforms: MapParameter,
    pub clouds: MapParameter,
}

// ---------------------------------------------------------------------------
// GlobalSettings / LocalSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    SinglePlayer,
    #[default]
    Multiplayer,
}

/// Settings shared identically by every client in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub game_mode: GameMode,
    pub map: MapSettings,
    pub game_rules: GameRules,
}

impl GlobalSettings {
    /// Resets the rule set to its built-in defaults. Called when the
    /// server starts listening.
    pub fn initialize(&mut self) {
        self.game_rules.initialize();
    }

    /// Serializes for a `GlobalSettings` packet.
    pub fn serialize(&self) -> Result<String, SessionError> {
        to_blob(self)
    }

    /// Parses what [`GlobalSettings::serialize`] produced.
    pub fn deserialize(blob: &str) -> Result<Self, SessionError> {
        from_blob(blob)
    }
}

/// Server-operator settings. Never sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    /// The host's display name.
    pub player_name: String,

    /// Remote addresses refused at connect time.
    #[serde(default)]
    pub banned_addresses: HashSet<String>,
}

impl LocalSettings {
    pub fn is_banned(&self, remote_address: &str) -> bool {
        self.banned_addresses.contains(remote_address)
    }

    /// Adds an address to the ban list. Returns `false` if it was
    /// already banned.
    pub fn ban(&mut self, remote_address: &str) -> bool {
        self.banned_addresses.insert(remote_address.to_string())
    }
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            player_name: "Host".to_string(),
            banned_addresses: HashSet::new(),
        }
    }
}

/// Both halves of the session settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub local: LocalSettings,
    pub global: GlobalSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_rules_default_faction_is_random() {
        let rules = GameRules::default();
        assert_eq!(rules.default_faction(), &Faction::random());
        assert_eq!(rules.default_difficulty_level(), DifficultyLevel::Citizen);
        assert!(rules.factions.contains(rules.default_faction()));
    }

    #[test]
    fn test_game_rules_initialize_resets_overrides() {
        let mut rules = GameRules::default();
        rules.set_default_difficulty_level(DifficultyLevel::Transcend);
        rules.factions.clear();

        rules.initialize();

        assert_eq!(rules, GameRules::default());
    }

    #[test]
    fn test_global_settings_round_trip() {
        let mut settings = GlobalSettings::default();
        settings.map.size = MapSize::Huge;
        settings.map.clouds = MapParameter::High;
        settings.game_rules.set_default_difficulty_level(DifficultyLevel::Thinker);

        let blob = settings.serialize().unwrap();
        let decoded = GlobalSettings::deserialize(&blob).unwrap();

        assert_eq!(settings, decoded);
    }

    #[test]
    fn test_global_settings_deserialize_garbage_returns_decode_error() {
        let result = GlobalSettings::deserialize("{\"game_mode\": 7}");
        assert!(matches!(result, Err(SessionError::Decode(_))));
    }

    #[test]
    fn test_local_settings_ban() {
        let mut local = LocalSettings::default();
        assert!(!local.is_banned("10.0.0.9"));

        assert!(local.ban("10.0.0.9"));
        assert!(!local.ban("10.0.0.9"), "second ban is a no-op");
        assert!(local.is_banned("10.0.0.9"));
    }

    #[test]
    fn test_difficulty_level_orders_lowest_first() {
        assert!(DifficultyLevel::Citizen < DifficultyLevel::Transcend);
    }
}
