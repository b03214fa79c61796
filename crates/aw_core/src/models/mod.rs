pub mod matches;
pub mod role;

pub use matches::{
    ConfigId, MatchId, MatchRecord, PatternDocument, RoleSlots, SlotAssignment, TeamId,
};
pub use role::{Faction, Role};
