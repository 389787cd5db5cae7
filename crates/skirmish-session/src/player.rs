//! Players: one participant in the session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DifficultyLevel, Faction, GameRules};

/// Whether a player runs the server or joined it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRole {
    /// Started the server. Always sits in slot 0 on connection 0.
    Host,
    /// Joined over the network.
    Player,
}

/// One participant.
///
/// A player is owned by the [`Slot`](crate::Slot) it sits in and is
/// dropped when that slot is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, taken from the credential sent at authentication.
    pub name: String,
    pub role: PlayerRole,
    pub faction: Faction,
    pub difficulty: DifficultyLevel,
    /// Set by the player from the lobby when they are good to go.
    #[serde(default)]
    pub ready: bool,
}

impl Player {
    pub fn new(
        name: impl Into<String>,
        role: PlayerRole,
        faction: Faction,
        difficulty: DifficultyLevel,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            faction,
            difficulty,
            ready: false,
        }
    }

    /// Creates a player on the rule set's default faction and difficulty.
    pub fn with_rules(
        name: impl Into<String>,
        role: PlayerRole,
        rules: &GameRules,
    ) -> Self {
        Self::new(
            name,
            role,
            rules.default_faction().clone(),
            rules.default_difficulty_level(),
        )
    }

    pub fn is_host(&self) -> bool {
        self.role == PlayerRole::Host
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_rules_uses_rule_defaults() {
        let rules = GameRules::default();
        let player = Player::with_rules("alice", PlayerRole::Player, &rules);

        assert_eq!(player.name, "alice");
        assert_eq!(&player.faction, rules.default_faction());
        assert_eq!(player.difficulty, rules.default_difficulty_level());
        assert!(!player.ready);
        assert!(!player.is_host());
    }

    #[test]
    fn test_ready_defaults_when_missing_from_blob() {
        let json = r#"{
            "name": "bob",
            "role": "Player",
            "faction": { "id": "HIVE", "name": "Human Hive" },
            "difficulty": "Talent"
        }"#;
        let player: Player = serde_json::from_str(json).unwrap();
        assert!(!player.ready);
        assert_eq!(player.difficulty, DifficultyLevel::Talent);
    }
}
