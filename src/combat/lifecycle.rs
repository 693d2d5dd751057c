//! Combat lifecycle: encounter start, victory, defeat, XP distribution.

use rand::Rng;

use super::enemy::Enemy;
use super::events::CombatEvent;
use crate::content::ContentDb;
use crate::core::game_state::GameState;

/// Enters combat mode with an already-instantiated enemy list and a fresh
/// turn queue.
pub fn start_combat(state: &mut GameState, enemies: Vec<Enemy>) {
    state.push_log(format!(
        "[SYSTEM] WARNING: COMBAT STARTED. {} hostiles detected.",
        enemies.len()
    ));
    state.is_combat = true;
    state.active_enemies = enemies;
    state.battle_queue.clear();
    state.pending_spawns.clear();
}

/// Convenience wrapper that instantiates enemies from templates. Unknown
/// template ids are skipped with a log line.
pub fn start_combat_from_templates(
    state: &mut GameState,
    template_ids: &[&str],
    content: &ContentDb,
    rng: &mut impl Rng,
) {
    let mut enemies = Vec::with_capacity(template_ids.len());
    for id in template_ids {
        match content.enemy(id) {
            Some(template) => enemies.push(Enemy::from_template(template, rng)),
            None => state.push_log(format!("Unknown enemy '{id}'.")),
        }
    }
    start_combat(state, enemies);
}

/// Ends combat in victory once every active enemy is down: sweeps enemy
/// loot into the shared inventory and splits the XP total floor-evenly
/// across the whole party, cascading level-ups.
pub fn check_victory(
    state: &mut GameState,
    content: &ContentDb,
    events: &mut Vec<CombatEvent>,
) -> bool {
    if !state.is_combat || state.active_enemies.is_empty() {
        return false;
    }
    if state.active_enemies.iter().any(Enemy::is_alive) {
        return false;
    }

    state.push_log("[SYSTEM] VICTORY!");

    let mut loot: Vec<String> = Vec::new();
    let mut total_xp: u64 = 0;
    for enemy in &mut state.active_enemies {
        total_xp += enemy.xp_reward;
        loot.append(&mut enemy.loot);
    }
    for item_id in loot {
        let name = content
            .item(&item_id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| item_id.clone());
        state.push_log(format!("[SYSTEM] Recovered: {name}."));
        state.inventory.push(item_id);
    }

    // Split evenly regardless of who dealt the finishing blow.
    let share = if state.party.is_empty() {
        0
    } else {
        total_xp / state.party.len() as u64
    };
    if share > 0 {
        state.push_log(format!("Each party member gains {share} XP."));
    }

    for idx in 0..state.party.len() {
        let class_id = state.party[idx].class_id.clone();
        let class = content.class(&class_id);
        let level_ups = state.party[idx].award_xp(share, class);
        let name = state.party[idx].name.clone();
        for level_up in level_ups {
            state.push_log(format!("[{}] reached level {}!", name, level_up.level));
            for skill_id in &level_up.unlocked_skills {
                let skill_name = content
                    .skill(skill_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| skill_id.clone());
                state.push_log(format!("[{name}] learned {skill_name}!"));
            }
            events.push(CombatEvent::LevelUp {
                name: name.clone(),
                level: level_up.level,
            });
        }
    }

    state.is_combat = false;
    state.battle_queue.clear();
    state.active_enemies.clear();
    state.pending_spawns.clear();
    events.push(CombatEvent::Victory { xp_each: share });
    true
}

/// Sets the one-way game-over flag once the whole party is down. All tick
/// and action processing is inert afterwards until an external reset.
pub fn check_defeat(state: &mut GameState, events: &mut Vec<CombatEvent>) -> bool {
    if state.game_over {
        return true;
    }
    if state.party.is_empty() || state.party.iter().any(|c| !c.is_incapacitated()) {
        return false;
    }
    state.game_over = true;
    state.push_log("[SYSTEM] GAME OVER. The party has fallen.");
    events.push(CombatEvent::Defeat);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn party_of_three(content: &ContentDb) -> GameState {
        let mut state = GameState::new();
        state.register_character("Vessk", "enforcer", content);
        state.register_character("Mira", "medic", content);
        state.register_character("Sable", "operative", content);
        state
    }

    #[test]
    fn test_start_combat_resets_queue() {
        let content = ContentDb::builtin();
        let mut state = party_of_three(&content);
        let mut rng = test_rng();
        state.battle_queue.push_back("stale".to_string());

        start_combat_from_templates(&mut state, &["guard", "guard"], &content, &mut rng);
        assert!(state.is_combat);
        assert_eq!(state.active_enemies.len(), 2);
        assert!(state.battle_queue.is_empty());
        assert!(state
            .log
            .iter()
            .any(|l| l.contains("COMBAT STARTED. 2 hostiles")));
    }

    #[test]
    fn test_victory_splits_xp_evenly() {
        let content = ContentDb::builtin();
        let mut state = party_of_three(&content);
        let mut rng = test_rng();
        // Three guards at 10 XP each against a three-member party.
        start_combat_from_templates(&mut state, &["guard", "guard", "guard"], &content, &mut rng);
        for enemy in &mut state.active_enemies {
            enemy.xp_reward = 10;
            enemy.loot.clear();
            enemy.hp = 0;
        }

        let mut events = Vec::new();
        assert!(check_victory(&mut state, &content, &mut events));
        assert!(!state.is_combat);
        assert!(state.active_enemies.is_empty());
        for character in &state.party {
            assert_eq!(character.xp, 10);
        }
        assert!(events.contains(&CombatEvent::Victory { xp_each: 10 }));
    }

    #[test]
    fn test_victory_sweeps_loot() {
        let content = ContentDb::builtin();
        let mut state = party_of_three(&content);
        let mut rng = test_rng();
        start_combat_from_templates(&mut state, &["guard"], &content, &mut rng);
        state.active_enemies[0].hp = 0;

        let before = state.inventory.len();
        let mut events = Vec::new();
        check_victory(&mut state, &content, &mut events);
        // The guard carries a medkit.
        assert_eq!(state.inventory.len(), before + 1);
        assert!(state.log.iter().any(|l| l.contains("Recovered: Medkit")));
    }

    #[test]
    fn test_no_victory_while_one_stands() {
        let content = ContentDb::builtin();
        let mut state = party_of_three(&content);
        let mut rng = test_rng();
        start_combat_from_templates(&mut state, &["guard", "guard"], &content, &mut rng);
        state.active_enemies[0].hp = 0;

        let mut events = Vec::new();
        assert!(!check_victory(&mut state, &content, &mut events));
        assert!(state.is_combat);
    }

    #[test]
    fn test_defeat_sets_one_way_flag() {
        let content = ContentDb::builtin();
        let mut state = party_of_three(&content);
        for character in &mut state.party {
            character.hp = 0;
        }

        let mut events = Vec::new();
        assert!(check_defeat(&mut state, &mut events));
        assert!(state.game_over);
        assert_eq!(events, vec![CombatEvent::Defeat]);

        // Second check stays terminal without logging again.
        let log_len = state.log.len();
        let mut events = Vec::new();
        assert!(check_defeat(&mut state, &mut events));
        assert_eq!(state.log.len(), log_len);
        assert!(events.is_empty());
    }
}
