//! Party members: creation from a class kit, HP/SP bookkeeping, leveling.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stats::Stats;
use super::status::{is_crowd_controlled, StatusEffect};
use crate::content::{ClassDef, ContentDb, ItemKind};
use crate::core::constants::{
    CHAR_BASE_HP, HP_PER_CONSTITUTION, LEVEL_HP_BASE_GAIN, MAX_ACCESSORIES,
    READINESS_RESET_SECONDS, XP_BASE_THRESHOLD, XP_GROWTH_FACTOR,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    pub weapon: Option<String>,
    pub armor: Option<String>,
    pub accessories: Vec<String>,
}

impl Equipment {
    pub fn equipped_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.weapon
            .iter()
            .chain(self.armor.iter())
            .chain(self.accessories.iter())
            .map(String::as_str)
    }

    pub fn has_accessory_room(&self) -> bool {
        self.accessories.len() < MAX_ACCESSORIES
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub class_id: String,
    pub level: u32,
    pub xp: u64,
    pub max_xp: u64,
    pub hp: i32,
    pub max_hp: i32,
    pub sp: i32,
    pub max_sp: i32,
    pub stats: Stats,
    pub equipment: Equipment,
    pub unlocked_skills: Vec<String>,
    pub status: Vec<StatusEffect>,
    /// Seconds until this character's next action becomes available.
    pub readiness: f64,
    pub is_player_controlled: bool,
}

/// One level gained by [`Character::award_xp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub unlocked_skills: Vec<String>,
}

impl Character {
    /// Creates a party member from a class kit: base stats, starting
    /// equipment in its slots, and every skill unlocked at level 1.
    pub fn from_class(name: &str, class: &ClassDef, content: &ContentDb) -> Self {
        let max_hp = CHAR_BASE_HP + class.base_stats.constitution * HP_PER_CONSTITUTION;
        let max_sp = class.base_stats.skill_slots;

        let mut equipment = Equipment::default();
        for item_id in &class.starting_equipment {
            match content.item(item_id).map(|i| &i.kind) {
                Some(ItemKind::Weapon { .. }) => equipment.weapon = Some(item_id.clone()),
                Some(ItemKind::Armor { .. }) => equipment.armor = Some(item_id.clone()),
                Some(ItemKind::Accessory { .. }) if equipment.has_accessory_room() => {
                    equipment.accessories.push(item_id.clone());
                }
                _ => {}
            }
        }

        let unlocked_skills = class
            .unlocks
            .iter()
            .filter(|(level, _)| **level <= 1)
            .map(|(_, skill_id)| skill_id.clone())
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            class_id: class.id.clone(),
            level: 1,
            xp: 0,
            max_xp: XP_BASE_THRESHOLD,
            hp: max_hp,
            max_hp,
            sp: max_sp,
            max_sp,
            stats: class.base_stats,
            equipment,
            unlocked_skills,
            status: Vec::new(),
            readiness: READINESS_RESET_SECONDS,
            is_player_controlled: true,
        }
    }

    pub fn is_incapacitated(&self) -> bool {
        self.hp <= 0
    }

    pub fn is_crowd_controlled(&self) -> bool {
        is_crowd_controlled(&self.status)
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
    }

    pub fn spend_sp(&mut self, cost: i32) {
        self.sp = (self.sp - cost.max(0)).max(0);
    }

    pub fn restore_sp(&mut self, amount: i32) {
        self.sp = (self.sp + amount.max(0)).min(self.max_sp);
    }

    /// Credits XP and processes the level-up cascade: each level raises the
    /// threshold by the growth factor, grows max HP, fully restores HP, and
    /// unlocks any class skill gated to the new level.
    pub fn award_xp(&mut self, amount: u64, class: Option<&ClassDef>) -> Vec<LevelUp> {
        self.xp += amount;
        let mut level_ups = Vec::new();

        while self.xp >= self.max_xp {
            self.xp -= self.max_xp;
            self.level += 1;
            self.max_xp = (self.max_xp as f64 * XP_GROWTH_FACTOR).floor() as u64;
            self.max_hp += LEVEL_HP_BASE_GAIN + self.stats.constitution / 2;
            self.hp = self.max_hp;

            let mut unlocked = Vec::new();
            if let Some(class) = class {
                if let Some(skill_id) = class.unlocks.get(&self.level) {
                    if !self.unlocked_skills.iter().any(|s| s == skill_id) {
                        self.unlocked_skills.push(skill_id.clone());
                        unlocked.push(skill_id.clone());
                    }
                }
            }
            level_ups.push(LevelUp {
                level: self.level,
                unlocked_skills: unlocked,
            });
        }

        level_ups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_character() -> Character {
        Character {
            id: "c1".to_string(),
            name: "Vessk".to_string(),
            class_id: "enforcer".to_string(),
            level: 1,
            xp: 0,
            max_xp: 100,
            hp: 40,
            max_hp: 40,
            sp: 4,
            max_sp: 4,
            stats: Stats {
                strength: 6,
                constitution: 4,
                dexterity: 3,
                wisdom: 2,
                hit_chance: 75,
                skill_slots: 4,
            },
            equipment: Equipment::default(),
            unlocked_skills: Vec::new(),
            status: Vec::new(),
            readiness: READINESS_RESET_SECONDS,
            is_player_controlled: true,
        }
    }

    #[test]
    fn test_hp_clamps_both_ways() {
        let mut c = bare_character();
        c.take_damage(100);
        assert_eq!(c.hp, 0);
        assert!(c.is_incapacitated());
        c.heal(1000);
        assert_eq!(c.hp, c.max_hp);
    }

    #[test]
    fn test_sp_clamps_both_ways() {
        let mut c = bare_character();
        c.spend_sp(10);
        assert_eq!(c.sp, 0);
        c.restore_sp(99);
        assert_eq!(c.sp, c.max_sp);
    }

    #[test]
    fn test_level_up_cascade() {
        let mut c = bare_character();
        c.xp = 95;
        let ups = c.award_xp(10, None);
        assert_eq!(ups.len(), 1);
        assert_eq!(c.level, 2);
        assert_eq!(c.xp, 5);
        assert_eq!(c.max_xp, 150);
        assert_eq!(c.hp, c.max_hp);
        // 40 + 5 + con/2
        assert_eq!(c.max_hp, 47);
    }

    #[test]
    fn test_multi_level_cascade() {
        let mut c = bare_character();
        let ups = c.award_xp(100 + 150 + 3, None);
        assert_eq!(ups.len(), 2);
        assert_eq!(c.level, 3);
        assert_eq!(c.xp, 3);
        assert_eq!(c.max_xp, 225);
    }

    #[test]
    fn test_unlock_skips_already_known() {
        use std::collections::BTreeMap;

        let mut unlocks = BTreeMap::new();
        unlocks.insert(2, "power_strike".to_string());
        let class = ClassDef {
            id: "enforcer".to_string(),
            name: "Enforcer".to_string(),
            base_stats: Stats::default(),
            starting_equipment: Vec::new(),
            starting_items: Vec::new(),
            starting_credits: 0,
            unlocks,
        };

        let mut c = bare_character();
        c.unlocked_skills.push("power_strike".to_string());
        let ups = c.award_xp(100, Some(&class));
        assert_eq!(ups.len(), 1);
        assert!(ups[0].unlocked_skills.is_empty());
        assert_eq!(c.unlocked_skills.len(), 1);
    }
}
