//! Base stats and the derived-stats resolver.
//!
//! Derived stats are recomputed on demand from base stats plus every
//! equipped item's bonuses plus any active stat-buff effects, so equipment
//! changes are reflected immediately. Nothing here is cached.

use serde::{Deserialize, Serialize};

use super::party::Character;
use super::status::StatusKind;
use crate::content::ContentDb;

/// A character's stat block. Also used for item `statBonus` entries,
/// where unspecified fields default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub strength: i32,
    pub constitution: i32,
    pub dexterity: i32,
    pub wisdom: i32,
    pub hit_chance: i32,
    pub skill_slots: i32,
}

impl Stats {
    pub fn add(&mut self, bonus: &Stats) {
        self.strength += bonus.strength;
        self.constitution += bonus.constitution;
        self.dexterity += bonus.dexterity;
        self.wisdom += bonus.wisdom;
        self.hit_chance += bonus.hit_chance;
        self.skill_slots += bonus.skill_slots;
    }

    pub fn get(&self, stat: StatName) -> i32 {
        match stat {
            StatName::Strength => self.strength,
            StatName::Constitution => self.constitution,
            StatName::Dexterity => self.dexterity,
            StatName::Wisdom => self.wisdom,
            StatName::HitChance => self.hit_chance,
            StatName::SkillSlots => self.skill_slots,
        }
    }

    pub fn add_to(&mut self, stat: StatName, amount: i32) {
        match stat {
            StatName::Strength => self.strength += amount,
            StatName::Constitution => self.constitution += amount,
            StatName::Dexterity => self.dexterity += amount,
            StatName::Wisdom => self.wisdom += amount,
            StatName::HitChance => self.hit_chance += amount,
            StatName::SkillSlots => self.skill_slots += amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatName {
    Strength,
    Constitution,
    Dexterity,
    Wisdom,
    HitChance,
    SkillSlots,
}

impl StatName {
    /// Resolves a content stat tag (`"str"`, `"hitChance"`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "str" | "strength" => Some(StatName::Strength),
            "con" | "constitution" => Some(StatName::Constitution),
            "dex" | "dexterity" => Some(StatName::Dexterity),
            "wis" | "wisdom" => Some(StatName::Wisdom),
            "hitchance" | "hit_chance" => Some(StatName::HitChance),
            "skillslots" | "skill_slots" => Some(StatName::SkillSlots),
            _ => None,
        }
    }
}

/// Effective stats: base + equipment bonuses + active stat buffs.
pub fn derived_stats(character: &Character, content: &ContentDb) -> Stats {
    let mut total = character.stats;

    for item_id in character.equipment.equipped_ids() {
        if let Some(item) = content.item(item_id) {
            total.add(item.stat_bonus());
        }
    }

    for effect in &character.status {
        if let StatusKind::Buff(_) = effect.kind {
            if let Some(stat) = effect.stat {
                total.add_to(stat, effect.value as i32);
            }
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_bonus_defaults_to_zero() {
        let bonus: Stats = serde_json::from_str(r#"{"strength": 2}"#).unwrap();
        assert_eq!(bonus.strength, 2);
        assert_eq!(bonus.dexterity, 0);
        assert_eq!(bonus.hit_chance, 0);
    }

    #[test]
    fn test_stats_add() {
        let mut base = Stats {
            strength: 5,
            constitution: 4,
            dexterity: 3,
            wisdom: 2,
            hit_chance: 70,
            skill_slots: 4,
        };
        base.add(&Stats {
            strength: 2,
            hit_chance: 5,
            ..Stats::default()
        });
        assert_eq!(base.strength, 7);
        assert_eq!(base.hit_chance, 75);
        assert_eq!(base.constitution, 4);
    }

    #[test]
    fn test_stat_name_from_tag() {
        assert_eq!(StatName::from_tag("str"), Some(StatName::Strength));
        assert_eq!(StatName::from_tag("DEX"), Some(StatName::Dexterity));
        assert_eq!(StatName::from_tag("hitChance"), Some(StatName::HitChance));
        assert_eq!(StatName::from_tag("luck"), None);
    }
}
