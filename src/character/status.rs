//! Timed status effects: damage/heal over time, crowd control, buffs.

use serde::{Deserialize, Serialize};

use super::stats::StatName;
use crate::core::constants::DOT_DAMAGE_PER_TICK;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Burn,
    Poison,
    Stun,
    Frozen,
    Disabled,
    /// Heal over time; `value` HP restored per tick.
    Regen,
    /// Outgoing-damage multiplier carried in `value`.
    Berzerk,
    /// Named buff, optionally tied to a stat via the effect's `stat` field.
    Buff(String),
}

impl StatusKind {
    /// Resolves a content status tag. Unknown tags become named buffs so
    /// content can invent flavor statuses without engine changes.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "burn" => StatusKind::Burn,
            "poison" => StatusKind::Poison,
            "stun" => StatusKind::Stun,
            "frozen" => StatusKind::Frozen,
            "disabled" => StatusKind::Disabled,
            "regen" => StatusKind::Regen,
            "berzerk" => StatusKind::Berzerk,
            _ => StatusKind::Buff(tag.trim().to_string()),
        }
    }

    pub fn is_damage_over_time(&self) -> bool {
        matches!(self, StatusKind::Burn | StatusKind::Poison)
    }

    pub fn is_crowd_control(&self) -> bool {
        matches!(
            self,
            StatusKind::Stun | StatusKind::Frozen | StatusKind::Disabled
        )
    }

    pub fn label(&self) -> &str {
        match self {
            StatusKind::Burn => "burn",
            StatusKind::Poison => "poison",
            StatusKind::Stun => "stun",
            StatusKind::Frozen => "frozen",
            StatusKind::Disabled => "disabled",
            StatusKind::Regen => "regen",
            StatusKind::Berzerk => "berzerk",
            StatusKind::Buff(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Seconds remaining; decremented every tick, removed at <= 0.
    pub duration: f64,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub stat: Option<StatName>,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, duration: f64) -> Self {
        Self {
            kind,
            duration,
            value: 0.0,
            stat: None,
        }
    }

    pub fn with_value(kind: StatusKind, duration: f64, value: f64) -> Self {
        Self {
            kind,
            duration,
            value,
            stat: None,
        }
    }
}

/// Net HP change produced by one status tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusTickOutcome {
    pub damage: i32,
    pub healing: i32,
}

/// Advances every effect by `dt` seconds: burn/poison stacks each deal one
/// point, regen heals its stored value, expired effects are dropped. The
/// caller applies the outcome to HP so clamping stays at the mutation site.
pub fn tick_statuses(effects: &mut Vec<StatusEffect>, dt: f64) -> StatusTickOutcome {
    let mut outcome = StatusTickOutcome::default();

    for effect in effects.iter_mut() {
        if effect.kind.is_damage_over_time() {
            outcome.damage += DOT_DAMAGE_PER_TICK;
        } else if effect.kind == StatusKind::Regen {
            outcome.healing += effect.value.max(0.0) as i32;
        }
        effect.duration -= dt;
    }

    effects.retain(|e| e.duration > 0.0);
    outcome
}

/// True when any active effect prevents the entity from acting.
pub fn is_crowd_controlled(effects: &[StatusEffect]) -> bool {
    effects.iter().any(|e| e.kind.is_crowd_control())
}

/// Product of active berzerk-style multipliers, 1.0 when none.
pub fn outgoing_damage_multiplier(effects: &[StatusEffect]) -> f64 {
    effects
        .iter()
        .filter(|e| e.kind == StatusKind::Berzerk)
        .fold(1.0, |acc, e| acc * e.value.max(1.0))
}
