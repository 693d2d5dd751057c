//! Static content definitions.
//!
//! Content ships as JSON (see `assets/`) in the loose string-tagged shape
//! authors write, and is compiled once at load time into the typed
//! definitions the engine consumes. All "what kind of thing is this"
//! decisions happen here, never per invocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::character::stats::{StatName, Stats};
use crate::character::status::StatusKind;
use crate::core::constants::{
    DEFAULT_MOVE_CHARGE_SECONDS, DEFAULT_MOVE_STAGGER_CHANCE, DEFAULT_UNARMED_FORMULA,
    REVIVE_ITEM_PERCENT,
};

const ZERO_STATS: Stats = Stats {
    strength: 0,
    constitution: 0,
    dexterity: 0,
    wisdom: 0,
    hit_chance: 0,
    skill_slots: 0,
};

// ---------------------------------------------------------------------------
// Raw (authored) schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSkill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cost: i32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub val: Option<f64>,
    #[serde(default)]
    pub stat: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub chance: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub hit_chance_bonus: Option<f64>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub damage: Option<String>,
    #[serde(default)]
    pub defense: Option<DefenseRange>,
    #[serde(default)]
    pub stat_bonus: Option<Stats>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClass {
    pub id: String,
    pub name: String,
    pub stats: Stats,
    #[serde(default)]
    pub starting_equipment: Vec<String>,
    #[serde(default)]
    pub starting_items: Vec<String>,
    #[serde(default)]
    pub starting_credits: i64,
    #[serde(default)]
    pub unlocks: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnemyTemplate {
    pub id: String,
    pub name: String,
    pub max_hp: i32,
    pub stats: RawEnemyStats,
    #[serde(default)]
    pub xp_reward: u64,
    #[serde(default)]
    pub loot: Vec<String>,
    #[serde(default)]
    pub messages: RawEnemyMessages,
    #[serde(default)]
    pub moves: Vec<RawEnemyMove>,
    /// Defaults from the warden naming convention when absent.
    #[serde(default)]
    pub phases: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEnemyStats {
    pub str: i32,
    pub dex: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnemyMessages {
    #[serde(default)]
    pub low_health: Option<String>,
    #[serde(default)]
    pub death: Option<String>,
    #[serde(default)]
    pub phase60: Option<String>,
    #[serde(default)]
    pub phase40: Option<String>,
    #[serde(default)]
    pub phase20: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnemyMove {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Selection weight in percent; a move table should sum to 100.
    #[serde(default)]
    pub chance: Option<f64>,
    #[serde(default)]
    pub charge_time: Option<f64>,
    #[serde(default)]
    pub stagger_chance: Option<f64>,
    #[serde(default)]
    pub prep_message: Option<String>,
    #[serde(default)]
    pub hit_message: Option<String>,
    #[serde(default)]
    pub val: Option<f64>,
    #[serde(default)]
    pub damage: Option<String>,
    #[serde(default)]
    pub summon_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Compiled definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub cost: i32,
    pub kind: SkillKind,
    /// Status attached on a successful application, if any.
    pub applies: Option<StatusApply>,
    pub target_party_wide: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkillKind {
    Attack {
        formula: Option<String>,
        multiplier: f64,
        hit_bonus: f64,
    },
    Heal {
        amount: HealAmount,
        /// Non-zero turns the heal into a heal-over-time effect.
        duration: f64,
    },
    Buff,
    RestoreResource {
        formula: String,
    },
    Revive {
        amount: HealAmount,
    },
    Steal,
    Utility,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealAmount {
    /// Fraction of the target's max HP.
    Percent(f64),
    Formula(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusApply {
    pub kind: StatusKind,
    /// Application probability in [0,1]; defaults to always.
    pub chance: f64,
    pub duration: f64,
    pub value: f64,
    pub stat: Option<StatName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Weapon {
        damage: String,
        bonus: Stats,
    },
    Armor {
        defense: DefenseRange,
        bonus: Stats,
    },
    Accessory {
        defense: Option<DefenseRange>,
        bonus: Stats,
    },
    Consumable {
        effect: ConsumableEffect,
    },
    Key,
}

impl Item {
    pub fn stat_bonus(&self) -> &Stats {
        match &self.kind {
            ItemKind::Weapon { bonus, .. }
            | ItemKind::Armor { bonus, .. }
            | ItemKind::Accessory { bonus, .. } => bonus,
            ItemKind::Consumable { .. } | ItemKind::Key => &ZERO_STATS,
        }
    }

    pub fn defense(&self) -> Option<&DefenseRange> {
        match &self.kind {
            ItemKind::Armor { defense, .. } => Some(defense),
            ItemKind::Accessory { defense, .. } => defense.as_ref(),
            _ => None,
        }
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self.kind, ItemKind::Consumable { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsumableEffect {
    Heal { formula: String },
    RestoreResource,
    Revive { percent: f64 },
}

/// Percent damage reduction sampled uniformly in [min, max].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseRange {
    pub min: f64,
    pub max: f64,
}

impl DefenseRange {
    pub fn sample(&self, rng: &mut impl rand::Rng) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub id: String,
    pub name: String,
    pub base_stats: Stats,
    pub starting_equipment: Vec<String>,
    pub starting_items: Vec<String>,
    pub starting_credits: i64,
    /// Level -> skill id unlocked on reaching it.
    pub unlocks: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyTemplate {
    pub id: String,
    pub name: String,
    pub max_hp: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub xp_reward: u64,
    pub loot: Vec<String>,
    pub messages: EnemyMessages,
    pub moves: Vec<EnemyMove>,
    /// Whether HP-threshold phases fire for this enemy.
    pub phases: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyMessages {
    pub low_health: String,
    pub death: String,
    pub phase60: String,
    pub phase40: String,
    pub phase20: String,
}

impl Default for EnemyMessages {
    fn default() -> Self {
        Self {
            low_health: "staggers, badly wounded!".to_string(),
            death: "collapses!".to_string(),
            phase60: "flies into a rage!".to_string(),
            phase40: "fights with growing desperation!".to_string(),
            phase20: "is barely standing!".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyMove {
    pub name: String,
    pub kind: MoveKind,
    pub weight: f64,
    pub charge_time: f64,
    /// Chance a hit during charging cancels the charge.
    pub stagger_chance: f64,
    pub prep_message: String,
    pub hit_message: String,
    /// Damage/heal multiplier.
    pub value: f64,
    pub damage: Option<DamageRoll>,
    pub summon_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    Attack,
    HeavyAttack,
    AoeAttack,
    Heal,
    Summon,
}

impl MoveKind {
    pub fn is_attack(&self) -> bool {
        matches!(
            self,
            MoveKind::Attack | MoveKind::HeavyAttack | MoveKind::AoeAttack
        )
    }
}

/// A literal `"3-6"` damage range from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub min: i32,
    pub max: i32,
}

impl DamageRoll {
    pub fn parse(text: &str) -> Option<Self> {
        let (lo, hi) = text.trim().split_once('-')?;
        let min: i32 = lo.trim().parse().ok()?;
        let max: i32 = hi.trim().parse().ok()?;
        if min < 0 || max < min {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn roll(&self, rng: &mut impl rand::Rng) -> i32 {
        rng.gen_range(self.min..=self.max)
    }
}

impl EnemyMove {
    /// Fallback move for enemies whose template carries no move table.
    pub fn basic_fallback() -> Self {
        Self {
            name: "Strike".to_string(),
            kind: MoveKind::Attack,
            weight: 100.0,
            charge_time: DEFAULT_MOVE_CHARGE_SECONDS,
            stagger_chance: DEFAULT_MOVE_STAGGER_CHANCE,
            prep_message: "winds up for a strike...".to_string(),
            hit_message: "strikes".to_string(),
            value: 1.0,
            damage: None,
            summon_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

fn compile_status_apply(raw: &RawSkill) -> Option<StatusApply> {
    let tag = raw.status.as_deref()?;
    Some(StatusApply {
        kind: StatusKind::from_tag(tag),
        chance: raw.chance.unwrap_or(1.0).clamp(0.0, 1.0),
        duration: raw.duration.unwrap_or(3.0),
        value: raw.val.unwrap_or(0.0),
        stat: raw.stat.as_deref().and_then(StatName::from_tag),
    })
}

fn heal_amount(raw: &RawSkill, default: HealAmount) -> HealAmount {
    match raw.formula.as_deref() {
        Some(f) => match crate::core::formula::parse_percent(f) {
            Some(pct) => HealAmount::Percent(pct),
            None => HealAmount::Formula(f.to_string()),
        },
        None => default,
    }
}

pub fn compile_skill(raw: RawSkill) -> Result<Skill, String> {
    let target_party_wide = raw.target.as_deref() == Some("party");

    let kind = if raw.sub_type.as_deref() == Some("steal") {
        SkillKind::Steal
    } else {
        match raw.kind.as_str() {
            "physical" => SkillKind::Attack {
                formula: raw.formula.clone(),
                multiplier: raw.val.unwrap_or(1.0),
                hit_bonus: raw.hit_chance_bonus.unwrap_or(0.0),
            },
            "heal" => SkillKind::Heal {
                amount: heal_amount(&raw, HealAmount::Formula("2d4".to_string())),
                duration: raw.duration.unwrap_or(0.0),
            },
            "buff" => SkillKind::Buff,
            "restore" => SkillKind::RestoreResource {
                formula: raw.formula.clone().unwrap_or_else(|| "1d4".to_string()),
            },
            "revive" => SkillKind::Revive {
                amount: heal_amount(&raw, HealAmount::Percent(REVIVE_ITEM_PERCENT)),
            },
            "utility" => SkillKind::Utility,
            other => return Err(format!("skill '{}': unknown type '{}'", raw.id, other)),
        }
    };

    // Buff payload lives in the status application; synthesize one from the
    // skill itself when content names no status tag.
    let applies = match (&kind, compile_status_apply(&raw)) {
        (SkillKind::Buff, None) => Some(StatusApply {
            kind: StatusKind::Buff(raw.id.clone()),
            chance: 1.0,
            duration: raw.duration.unwrap_or(10.0),
            value: raw.val.unwrap_or(0.0),
            stat: raw.stat.as_deref().and_then(StatName::from_tag),
        }),
        (_, applies) => applies,
    };

    Ok(Skill {
        id: raw.id,
        name: raw.name,
        cost: raw.cost.max(0),
        kind,
        applies,
        target_party_wide,
    })
}

pub fn compile_item(raw: RawItem) -> Result<Item, String> {
    let bonus = raw.stat_bonus.unwrap_or_default();
    let kind = match raw.kind.as_str() {
        "weapon" => ItemKind::Weapon {
            damage: raw
                .damage
                .clone()
                .unwrap_or_else(|| DEFAULT_UNARMED_FORMULA.to_string()),
            bonus,
        },
        "armor" => ItemKind::Armor {
            defense: raw
                .defense
                .unwrap_or(DefenseRange { min: 0.0, max: 0.0 }),
            bonus,
        },
        "accessory" => ItemKind::Accessory {
            defense: raw.defense,
            bonus,
        },
        "consumable" => {
            let tag = raw
                .effect
                .as_deref()
                .ok_or_else(|| format!("item '{}': consumable without effect", raw.id))?;
            let effect = if let Some(formula) = tag.strip_prefix("heal_") {
                ConsumableEffect::Heal {
                    formula: formula.to_string(),
                }
            } else if tag == "restore_skill" {
                ConsumableEffect::RestoreResource
            } else if tag == "revive" {
                ConsumableEffect::Revive {
                    percent: REVIVE_ITEM_PERCENT,
                }
            } else {
                return Err(format!("item '{}': unknown effect '{}'", raw.id, tag));
            };
            ItemKind::Consumable { effect }
        }
        "key" => ItemKind::Key,
        other => return Err(format!("item '{}': unknown type '{}'", raw.id, other)),
    };

    Ok(Item {
        id: raw.id,
        name: raw.name,
        description: raw.description,
        kind,
    })
}

pub fn compile_class(raw: RawClass) -> Result<ClassDef, String> {
    let mut unlocks = BTreeMap::new();
    for (level, skill_id) in raw.unlocks {
        let level: u32 = level
            .parse()
            .map_err(|_| format!("class '{}': bad unlock level '{}'", raw.id, level))?;
        unlocks.insert(level, skill_id);
    }
    Ok(ClassDef {
        id: raw.id,
        name: raw.name,
        base_stats: raw.stats,
        starting_equipment: raw.starting_equipment,
        starting_items: raw.starting_items,
        starting_credits: raw.starting_credits,
        unlocks,
    })
}

pub fn compile_enemy(raw: RawEnemyTemplate) -> Result<EnemyTemplate, String> {
    let mut moves = Vec::with_capacity(raw.moves.len());
    for m in raw.moves {
        let kind = match m.kind.as_str() {
            "attack" => MoveKind::Attack,
            "heavy_attack" => MoveKind::HeavyAttack,
            "aoe_attack" => MoveKind::AoeAttack,
            "heal" => MoveKind::Heal,
            "summon" => MoveKind::Summon,
            other => {
                return Err(format!(
                    "enemy '{}': move '{}' has unknown type '{}'",
                    raw.id, m.name, other
                ))
            }
        };
        if kind == MoveKind::Summon && m.summon_id.is_none() {
            return Err(format!(
                "enemy '{}': summon move '{}' without summonId",
                raw.id, m.name
            ));
        }
        let damage = match m.damage.as_deref() {
            Some(text) => Some(DamageRoll::parse(text).ok_or_else(|| {
                format!(
                    "enemy '{}': move '{}' has bad damage range '{}'",
                    raw.id, m.name, text
                )
            })?),
            None => None,
        };
        moves.push(EnemyMove {
            name: m.name,
            kind,
            weight: m.chance.unwrap_or(100.0),
            charge_time: m.charge_time.unwrap_or(DEFAULT_MOVE_CHARGE_SECONDS),
            stagger_chance: m.stagger_chance.unwrap_or(0.0).clamp(0.0, 1.0),
            prep_message: m
                .prep_message
                .unwrap_or_else(|| "readies an attack...".to_string()),
            hit_message: m.hit_message.unwrap_or_else(|| "attacks".to_string()),
            value: m.val.unwrap_or(1.0),
            damage,
            summon_id: m.summon_id,
        });
    }

    let default_messages = EnemyMessages::default();
    let messages = EnemyMessages {
        low_health: raw.messages.low_health.unwrap_or(default_messages.low_health),
        death: raw.messages.death.unwrap_or(default_messages.death),
        phase60: raw.messages.phase60.unwrap_or(default_messages.phase60),
        phase40: raw.messages.phase40.unwrap_or(default_messages.phase40),
        phase20: raw.messages.phase20.unwrap_or(default_messages.phase20),
    };

    // Naming convention: warden-class bosses get phases unless content
    // says otherwise.
    let phases = raw.phases.unwrap_or_else(|| raw.id.contains("warden"));

    Ok(EnemyTemplate {
        id: raw.id,
        name: raw.name,
        max_hp: raw.max_hp.max(1),
        strength: raw.stats.str,
        dexterity: raw.stats.dex,
        xp_reward: raw.xp_reward,
        loot: raw.loot,
        messages,
        moves,
        phases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_steal_subtype() {
        let raw: RawSkill = serde_json::from_str(
            r#"{"id": "pickpocket", "name": "Pickpocket", "type": "utility", "subType": "steal", "cost": 1}"#,
        )
        .unwrap();
        let skill = compile_skill(raw).unwrap();
        assert_eq!(skill.kind, SkillKind::Steal);
    }

    #[test]
    fn test_compile_percent_heal() {
        let raw: RawSkill = serde_json::from_str(
            r#"{"id": "resuscitate", "name": "Resuscitate", "type": "revive", "cost": 4, "formula": "50%"}"#,
        )
        .unwrap();
        let skill = compile_skill(raw).unwrap();
        assert_eq!(
            skill.kind,
            SkillKind::Revive {
                amount: HealAmount::Percent(0.5)
            }
        );
    }

    #[test]
    fn test_compile_unknown_skill_type_rejected() {
        let raw: RawSkill = serde_json::from_str(
            r#"{"id": "odd", "name": "Odd", "type": "dance", "cost": 0}"#,
        )
        .unwrap();
        assert!(compile_skill(raw).is_err());
    }

    #[test]
    fn test_compile_consumable_effects() {
        let raw: RawItem = serde_json::from_str(
            r#"{"id": "medkit", "name": "Medkit", "type": "consumable", "effect": "heal_2d6"}"#,
        )
        .unwrap();
        let item = compile_item(raw).unwrap();
        assert_eq!(
            item.kind,
            ItemKind::Consumable {
                effect: ConsumableEffect::Heal {
                    formula: "2d6".to_string()
                }
            }
        );
    }

    #[test]
    fn test_damage_roll_parse() {
        assert_eq!(DamageRoll::parse("3-6"), Some(DamageRoll { min: 3, max: 6 }));
        assert_eq!(DamageRoll::parse(" 2 - 10 "), Some(DamageRoll { min: 2, max: 10 }));
        assert_eq!(DamageRoll::parse("6-3"), None);
        assert_eq!(DamageRoll::parse("2d6"), None);
    }

    #[test]
    fn test_warden_naming_convention_enables_phases() {
        let raw: RawEnemyTemplate = serde_json::from_str(
            r#"{"id": "warden_prime", "name": "Warden Prime", "maxHp": 120, "stats": {"str": 8, "dex": 4}}"#,
        )
        .unwrap();
        let tpl = compile_enemy(raw).unwrap();
        assert!(tpl.phases);

        let raw: RawEnemyTemplate = serde_json::from_str(
            r#"{"id": "guard", "name": "Guard", "maxHp": 30, "stats": {"str": 4, "dex": 3}}"#,
        )
        .unwrap();
        assert!(!compile_enemy(raw).unwrap().phases);
    }

    #[test]
    fn test_class_unlock_levels_parsed() {
        let raw: RawClass = serde_json::from_str(
            r#"{"id": "enforcer", "name": "Enforcer",
                "stats": {"strength": 6, "constitution": 5, "dexterity": 3, "wisdom": 2, "hitChance": 75, "skillSlots": 4},
                "unlocks": {"2": "power_strike", "4": "ground_slam"}}"#,
        )
        .unwrap();
        let class = compile_class(raw).unwrap();
        assert_eq!(class.unlocks.get(&2).map(String::as_str), Some("power_strike"));
        assert_eq!(class.unlocks.len(), 2);
    }
}
