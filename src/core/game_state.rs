//! Main game state: the party, shared inventory, the battle queue, active
//! enemies, and the append-only event log.
//!
//! The state is only mutated through the tick handler
//! ([`crate::core::tick::game_tick`]) and the action handler
//! ([`crate::combat::actions::perform_action`]); each call is one atomic
//! transition and readers always observe a post-tick or post-action
//! snapshot. The log is the externally observable narrative channel and
//! preserves emission order exactly.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::character::party::Character;
use crate::combat::enemy::Enemy;
use crate::content::{ContentDb, ItemKind};

/// IMPORTANT: When adding new fields, use `#[serde(default)]` to maintain
/// backward compatibility with old save files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    pub party: Vec<Character>,
    /// Shared party inventory, as item ids. Duplicates are distinct units.
    pub inventory: Vec<String>,
    pub credits: i64,
    pub log: Vec<String>,
    pub is_combat: bool,
    /// One-way party-wipe flag; set by the tick handler, cleared only by an
    /// external reset.
    pub game_over: bool,
    /// Suppresses action submission at the command layer; the tick
    /// scheduler keeps running regardless.
    #[serde(default)]
    pub input_locked: bool,
    /// Character ids in the order they became ready. Only the head may act.
    pub battle_queue: VecDeque<String>,
    pub active_enemies: Vec<Enemy>,
    /// Summon requests buffered during the enemy pass, flushed afterwards
    /// so the enemy list is never mutated mid-iteration.
    #[serde(skip)]
    pub pending_spawns: Vec<String>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_log(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
    }

    /// Registers a new party member from a class kit, moving the kit's
    /// starting items and credits into the shared pools.
    pub fn register_character(
        &mut self,
        name: &str,
        class_id: &str,
        content: &ContentDb,
    ) -> bool {
        let Some(class) = content.class(class_id) else {
            self.push_log(format!("Unknown class '{class_id}'."));
            return false;
        };
        let character = Character::from_class(name, class, content);
        self.push_log(format!("[{}] the {} joins the party.", name, class.name));
        self.inventory.extend(class.starting_items.iter().cloned());
        self.credits += class.starting_credits;
        self.party.push(character);
        true
    }

    pub fn add_to_inventory(&mut self, item_id: impl Into<String>) {
        self.inventory.push(item_id.into());
    }

    /// Removes one unit of an item; false if none was held.
    pub fn remove_from_inventory(&mut self, item_id: &str) -> bool {
        match self.inventory.iter().position(|i| i == item_id) {
            Some(index) => {
                self.inventory.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn character_index_by_id(&self, id: &str) -> Option<usize> {
        self.party.iter().position(|c| c.id == id)
    }

    pub fn queue_head_id(&self) -> Option<&str> {
        self.battle_queue.front().map(String::as_str)
    }

    /// Equips an inventory item into its slot, returning the replaced item
    /// to the inventory. No-op with a log line on any invalid input.
    pub fn equip_item(&mut self, actor_idx: usize, item_id: &str, content: &ContentDb) {
        if self.party.get(actor_idx).is_none() {
            self.push_log("Invalid character.");
            return;
        }
        let Some(item) = content.item(item_id) else {
            self.push_log("Unknown item.");
            return;
        };
        if !self.inventory.iter().any(|i| i == item_id) {
            self.push_log(format!("You don't have a {}.", item.name));
            return;
        }

        let replaced = match item.kind {
            ItemKind::Weapon { .. } => self.party[actor_idx]
                .equipment
                .weapon
                .replace(item_id.to_string()),
            ItemKind::Armor { .. } => self.party[actor_idx]
                .equipment
                .armor
                .replace(item_id.to_string()),
            ItemKind::Accessory { .. } => {
                if !self.party[actor_idx].equipment.has_accessory_room() {
                    let name = self.party[actor_idx].name.clone();
                    self.push_log(format!("[{name}] can't wear any more accessories."));
                    return;
                }
                self.party[actor_idx]
                    .equipment
                    .accessories
                    .push(item_id.to_string());
                None
            }
            ItemKind::Consumable { .. } | ItemKind::Key => {
                self.push_log(format!("You can't equip the {}.", item.name));
                return;
            }
        };

        self.remove_from_inventory(item_id);
        if let Some(old) = replaced {
            self.inventory.push(old);
        }
        let name = self.party[actor_idx].name.clone();
        self.push_log(format!("[{}] equips the {}.", name, item.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_character_applies_class_kit() {
        let content = ContentDb::builtin();
        let mut state = GameState::new();
        assert!(state.register_character("Vessk", "enforcer", &content));

        let character = &state.party[0];
        assert_eq!(character.class_id, "enforcer");
        assert_eq!(character.equipment.weapon.as_deref(), Some("shock_baton"));
        assert_eq!(character.equipment.armor.as_deref(), Some("riot_vest"));
        assert!(character
            .unlocked_skills
            .iter()
            .any(|s| s == "power_strike"));
        assert!(state.inventory.iter().any(|i| i == "medkit"));
        assert_eq!(state.credits, 20);
    }

    #[test]
    fn test_register_unknown_class_is_a_noop() {
        let content = ContentDb::builtin();
        let mut state = GameState::new();
        assert!(!state.register_character("Nobody", "astronaut", &content));
        assert!(state.party.is_empty());
        assert!(state.log.last().unwrap().contains("Unknown class"));
    }

    #[test]
    fn test_remove_one_inventory_unit() {
        let mut state = GameState::new();
        state.add_to_inventory("medkit");
        state.add_to_inventory("medkit");
        assert!(state.remove_from_inventory("medkit"));
        assert_eq!(state.inventory.len(), 1);
        assert!(state.remove_from_inventory("medkit"));
        assert!(!state.remove_from_inventory("medkit"));
    }

    #[test]
    fn test_equip_swaps_old_weapon_back() {
        let content = ContentDb::builtin();
        let mut state = GameState::new();
        state.register_character("Vessk", "enforcer", &content);
        state.add_to_inventory("guard_rifle");

        state.equip_item(0, "guard_rifle", &content);
        assert_eq!(
            state.party[0].equipment.weapon.as_deref(),
            Some("guard_rifle")
        );
        assert!(state.inventory.iter().any(|i| i == "shock_baton"));
        assert!(!state.inventory.iter().any(|i| i == "guard_rifle"));
    }

    #[test]
    fn test_accessory_limit_enforced() {
        let content = ContentDb::builtin();
        let mut state = GameState::new();
        state.register_character("Sable", "operative", &content);
        for _ in 0..4 {
            state.add_to_inventory("lucky_charm");
        }
        for _ in 0..4 {
            state.equip_item(0, "lucky_charm", &content);
        }
        assert_eq!(state.party[0].equipment.accessories.len(), 3);
        assert!(state
            .log
            .last()
            .unwrap()
            .contains("can't wear any more accessories"));
    }

    #[test]
    fn test_equip_consumable_rejected() {
        let content = ContentDb::builtin();
        let mut state = GameState::new();
        state.register_character("Mira", "medic", &content);
        state.add_to_inventory("medkit");
        let before = state.party[0].equipment.clone();
        state.equip_item(0, "medkit", &content);
        assert_eq!(state.party[0].equipment, before);
    }
}
