//! Structured combat events.
//!
//! The tick and action handlers write human-readable lines to the state
//! log; these events carry the same outcomes as data so the presentation
//! layer can drive flashes and damage numbers without parsing log text.

#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    PlayerHit {
        actor: String,
        target: String,
        damage: i32,
    },
    PlayerMissed {
        actor: String,
        target: String,
    },
    Healed {
        target: String,
        amount: i32,
    },
    SpRestored {
        target: String,
        amount: i32,
    },
    StatusApplied {
        target: String,
        status: String,
    },
    CreditsStolen {
        amount: i64,
    },
    Staggered {
        enemy: String,
    },
    EnemyHit {
        enemy: String,
        target: String,
        damage: i32,
    },
    EnemyHealed {
        enemy: String,
        amount: i32,
    },
    EnemySummoned {
        name: String,
    },
    EnemyDefeated {
        name: String,
    },
    LevelUp {
        name: String,
        level: u32,
    },
    Victory {
        xp_each: u64,
    },
    Defeat,
}
