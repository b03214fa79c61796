//! # Role Vocabulary
//!
//! The fixed role set of the AIWolf tournament logs, split into the two
//! factions of the game. Which of these roles actually have slots in a given
//! match (and how many) is configuration-dependent: a 5-player game runs
//! without BODYGUARD and MEDIUM, a 13-player game fills all six. The catalog's
//! `role_num_map` is the source of truth for slot counts; this enum is only
//! the closed vocabulary those maps draw from.

use serde::{Deserialize, Serialize};

/// One of the six tournament roles. Serialized in the SCREAMING_CASE spelling
/// used by the raw game logs (`VILLAGER`, `WEREWOLF`, ...).
///
/// Variants are declared in lexicographic order so that ordered iteration
/// (BTree keys, [`Role::ALL`]) matches the column order of the exported
/// tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Bodyguard,
    Medium,
    Possessed,
    Seer,
    Villager,
    Werewolf,
}

/// Faction alignment of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Faction {
    Village,
    Werewolf,
}

impl Role {
    /// Every role in the vocabulary, in the stable (lexicographic) order.
    pub const ALL: [Role; 6] = [
        Role::Bodyguard,
        Role::Medium,
        Role::Possessed,
        Role::Seer,
        Role::Villager,
        Role::Werewolf,
    ];

    /// Log-file spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Bodyguard => "BODYGUARD",
            Role::Medium => "MEDIUM",
            Role::Possessed => "POSSESSED",
            Role::Seer => "SEER",
            Role::Villager => "VILLAGER",
            Role::Werewolf => "WEREWOLF",
        }
    }

    /// Parse the spelling found in raw game logs. Returns `None` for tokens
    /// outside the vocabulary (spectator rows, malformed lines).
    pub fn from_log_token(token: &str) -> Option<Role> {
        match token {
            "BODYGUARD" => Some(Role::Bodyguard),
            "MEDIUM" => Some(Role::Medium),
            "POSSESSED" => Some(Role::Possessed),
            "SEER" => Some(Role::Seer),
            "VILLAGER" => Some(Role::Villager),
            "WEREWOLF" => Some(Role::Werewolf),
            _ => None,
        }
    }

    pub fn faction(&self) -> Faction {
        match self {
            Role::Villager | Role::Seer | Role::Bodyguard | Role::Medium => Faction::Village,
            Role::Werewolf | Role::Possessed => Faction::Werewolf,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_uses_log_spelling() {
        let json = serde_json::to_string(&Role::Werewolf).unwrap();
        assert_eq!(json, "\"WEREWOLF\"");

        let parsed: Role = serde_json::from_str("\"BODYGUARD\"").unwrap();
        assert_eq!(parsed, Role::Bodyguard);
    }

    #[test]
    fn test_log_token_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_log_token(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_log_token("FREEMASON"), None);
        assert_eq!(Role::from_log_token("villager"), None, "tokens are case-sensitive");
    }

    #[test]
    fn test_all_is_sorted() {
        let mut sorted = Role::ALL;
        sorted.sort();
        assert_eq!(sorted, Role::ALL, "ALL must match the derived Ord order");
    }

    #[test]
    fn test_faction_split() {
        let village = Role::ALL.iter().filter(|r| r.faction() == Faction::Village).count();
        let werewolf = Role::ALL.iter().filter(|r| r.faction() == Faction::Werewolf).count();
        assert_eq!((village, werewolf), (4, 2));
    }
}
