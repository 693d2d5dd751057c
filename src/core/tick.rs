//! The per-tick orchestration function.
//!
//! One call advances the simulation by `dt` seconds as a single atomic
//! transition: party statuses and readiness first, then the battle-queue
//! filter, then each enemy's behavior state machine in list order (a later
//! enemy sees the party as mutated by earlier enemies this same tick),
//! then the deferred summon flush, then victory/defeat detection.

use rand::Rng;

use crate::character::status::{is_crowd_controlled, outgoing_damage_multiplier, tick_statuses};
use crate::combat::enemy::{BehaviorState, Enemy};
use crate::combat::events::CombatEvent;
use crate::combat::lifecycle::{check_defeat, check_victory};
use crate::content::{ContentDb, EnemyMove, MoveKind};
use crate::core::constants::{ENEMY_IDLE_MAX_SECONDS, ENEMY_IDLE_MIN_SECONDS};
use crate::core::game_state::GameState;

/// Advances the simulation by `dt` seconds. The external driver calls this
/// once per fixed interval (one real second in the reference client).
pub fn game_tick(
    state: &mut GameState,
    dt: f64,
    content: &ContentDb,
    rng: &mut impl Rng,
) -> Vec<CombatEvent> {
    let mut events = Vec::new();

    // Terminal condition: inert until an external reset.
    if state.game_over {
        return events;
    }

    update_party(state, dt);

    // Drop queue entries for characters that died or got locked down since
    // they were enqueued.
    let valid: Vec<String> = state
        .party
        .iter()
        .filter(|c| !c.is_incapacitated() && !c.is_crowd_controlled())
        .map(|c| c.id.clone())
        .collect();
    state.battle_queue.retain(|id| valid.contains(id));

    if state.is_combat {
        for idx in 0..state.active_enemies.len() {
            update_enemy(state, idx, dt, content, rng, &mut events);
        }

        // Summons buffered during the pass join only after it completes.
        let spawns = std::mem::take(&mut state.pending_spawns);
        for template_id in spawns {
            if let Some(template) = content.enemy(&template_id) {
                let enemy = Enemy::from_template(template, rng);
                state.push_log(format!("[{}] joins the fight!", enemy.name));
                events.push(CombatEvent::EnemySummoned {
                    name: enemy.name.clone(),
                });
                state.active_enemies.push(enemy);
            }
        }

        // Lingering damage can finish the last enemy between actions.
        check_victory(state, content, &mut events);
    }

    check_defeat(state, &mut events);
    events
}

/// Status effects and readiness for every living party member.
fn update_party(state: &mut GameState, dt: f64) {
    for idx in 0..state.party.len() {
        if state.party[idx].is_incapacitated() {
            continue;
        }

        let outcome = tick_statuses(&mut state.party[idx].status, dt);
        if outcome.damage > 0 {
            state.party[idx].take_damage(outcome.damage);
            let name = state.party[idx].name.clone();
            state.push_log(format!(
                "[{name}] takes {} damage from lingering effects!",
                outcome.damage
            ));
            if state.party[idx].is_incapacitated() {
                state.push_log(format!("[{name}] is down!"));
                continue;
            }
        }
        if outcome.healing > 0 {
            state.party[idx].heal(outcome.healing);
            let name = state.party[idx].name.clone();
            state.push_log(format!("[{name}] recovers {} HP.", outcome.healing));
        }

        state.party[idx].readiness = (state.party[idx].readiness - dt).max(0.0);
        if state.party[idx].readiness <= 0.0
            && state.is_combat
            && state.party[idx].is_player_controlled
            && !state.party[idx].is_crowd_controlled()
        {
            let id = state.party[idx].id.clone();
            if !state.battle_queue.contains(&id) {
                let name = state.party[idx].name.clone();
                state.battle_queue.push_back(id);
                state.push_log(format!("[{name}] is ready!"));
            }
        }
    }
}

/// One enemy's statuses, phase checks, and behavior state machine.
fn update_enemy(
    state: &mut GameState,
    idx: usize,
    dt: f64,
    content: &ContentDb,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    // Dead enemies stay in the list for the log's sake but are inert.
    if !state.active_enemies[idx].is_alive() {
        return;
    }

    let outcome = tick_statuses(&mut state.active_enemies[idx].status, dt);
    if outcome.damage > 0 {
        state.active_enemies[idx].take_damage(outcome.damage);
        let name = state.active_enemies[idx].name.clone();
        state.push_log(format!(
            "[{name}] takes {} damage from lingering effects!",
            outcome.damage
        ));
        if !state.active_enemies[idx].is_alive() {
            let death = state.active_enemies[idx].messages.death.clone();
            state.push_log(format!("[{name}] {death}"));
            events.push(CombatEvent::EnemyDefeated { name });
            return;
        }
    }
    if outcome.healing > 0 {
        state.active_enemies[idx].heal(outcome.healing);
    }

    for line in state.active_enemies[idx].check_phases() {
        state.push_log(line);
    }

    // Crowd control freezes the state machine; durations above already
    // ticked down.
    if is_crowd_controlled(&state.active_enemies[idx].status) {
        return;
    }

    state.active_enemies[idx].timer -= dt;
    if state.active_enemies[idx].timer > 0.0 {
        return;
    }

    match state.active_enemies[idx].state {
        BehaviorState::Idle => {
            let chosen = state.active_enemies[idx].select_move(rng);
            let name = state.active_enemies[idx].name.clone();
            state.push_log(format!("[{name}] {}", chosen.prep_message));
            let enemy = &mut state.active_enemies[idx];
            enemy.timer = chosen.charge_time;
            enemy.state = BehaviorState::Charging;
            enemy.current_move = Some(chosen);
        }
        BehaviorState::Charging => {
            if let Some(enemy_move) = state.active_enemies[idx].current_move.take() {
                execute_move(state, idx, &enemy_move, content, rng, events);
            }
            let enemy = &mut state.active_enemies[idx];
            enemy.state = BehaviorState::Idle;
            enemy.timer = rng.gen_range(ENEMY_IDLE_MIN_SECONDS..ENEMY_IDLE_MAX_SECONDS);
        }
    }
}

/// Releases a fully charged move.
fn execute_move(
    state: &mut GameState,
    idx: usize,
    enemy_move: &EnemyMove,
    content: &ContentDb,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    let enemy_name = state.active_enemies[idx].name.clone();

    match enemy_move.kind {
        MoveKind::Summon => {
            if let Some(summon_id) = &enemy_move.summon_id {
                state.pending_spawns.push(summon_id.clone());
                state.push_log(format!("[{enemy_name}] {}!", enemy_move.hit_message));
            }
        }
        MoveKind::Heal => {
            let roll = rng.gen_range(1..=6) + rng.gen_range(1..=6);
            let amount = (f64::from(roll) * enemy_move.value).floor() as i32;
            state.active_enemies[idx].heal(amount);
            state.push_log(format!(
                "[{enemy_name}] {} ({amount} HP).",
                enemy_move.hit_message
            ));
            events.push(CombatEvent::EnemyHealed {
                enemy: enemy_name,
                amount,
            });
        }
        MoveKind::Attack | MoveKind::HeavyAttack | MoveKind::AoeAttack => {
            let living: Vec<usize> = state
                .party
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_incapacitated())
                .map(|(i, _)| i)
                .collect();
            if living.is_empty() {
                return;
            }
            let targets: Vec<usize> = if enemy_move.kind == MoveKind::AoeAttack {
                living
            } else {
                vec![living[rng.gen_range(0..living.len())]]
            };

            let strength = state.active_enemies[idx].strength;
            let berzerk = outgoing_damage_multiplier(&state.active_enemies[idx].status);

            for target_idx in targets {
                let base = match enemy_move.damage {
                    Some(range) => range.roll(rng),
                    None => rng.gen_range(1..=4) + strength / 2,
                };
                let scaled = f64::from(base) * enemy_move.value * berzerk;
                let reduction = armor_reduction(state, target_idx, content, rng);
                let damage = ((scaled * (1.0 - reduction)).floor() as i32).max(1);

                state.party[target_idx].take_damage(damage);
                let target_name = state.party[target_idx].name.clone();
                state.push_log(format!(
                    "[{enemy_name}] {} {target_name} for {damage} damage!",
                    enemy_move.hit_message
                ));
                events.push(CombatEvent::EnemyHit {
                    enemy: enemy_name.clone(),
                    target: target_name.clone(),
                    damage,
                });
                if state.party[target_idx].is_incapacitated() {
                    state.push_log(format!("[{target_name}] is down!"));
                }
            }
        }
    }
}

/// Percent reduction from the target's armor and accessories, each sampled
/// within its defense range.
fn armor_reduction(
    state: &GameState,
    target_idx: usize,
    content: &ContentDb,
    rng: &mut impl Rng,
) -> f64 {
    let equipment = &state.party[target_idx].equipment;
    let mut total = 0.0;
    for item_id in equipment
        .armor
        .iter()
        .chain(equipment.accessories.iter())
    {
        if let Some(range) = content.item(item_id).and_then(|i| i.defense()) {
            total += range.sample(rng);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::status::{StatusEffect, StatusKind};
    use crate::combat::lifecycle::start_combat;
    use crate::content::{EnemyMessages, EnemyTemplate};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn single_member_state(content: &ContentDb) -> GameState {
        let mut state = GameState::new();
        state.register_character("Vessk", "enforcer", content);
        state
    }

    fn passive_template() -> EnemyTemplate {
        EnemyTemplate {
            id: "dummy".to_string(),
            name: "Dummy".to_string(),
            max_hp: 30,
            strength: 4,
            dexterity: 3,
            xp_reward: 20,
            loot: Vec::new(),
            messages: EnemyMessages::default(),
            moves: vec![EnemyMove {
                name: "Poke".to_string(),
                kind: MoveKind::Attack,
                weight: 100.0,
                charge_time: 5.0,
                stagger_chance: 0.0,
                prep_message: "winds up...".to_string(),
                hit_message: "pokes".to_string(),
                value: 1.0,
                damage: None,
                summon_id: None,
            }],
            phases: false,
        }
    }

    #[test]
    fn test_ready_character_is_enqueued_once() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        let mut rng = test_rng();
        let template = passive_template();
        start_combat(&mut state, vec![Enemy::from_template(&template, &mut rng)]);

        for _ in 0..20 {
            game_tick(&mut state, 1.0, &content, &mut rng);
        }
        assert_eq!(state.battle_queue.len(), 1);
        assert_eq!(state.queue_head_id(), Some(state.party[0].id.as_str()));
    }

    #[test]
    fn test_queue_drops_crowd_controlled_entries() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        let mut rng = test_rng();
        let template = passive_template();
        start_combat(&mut state, vec![Enemy::from_template(&template, &mut rng)]);

        state.party[0].readiness = 0.0;
        game_tick(&mut state, 1.0, &content, &mut rng);
        assert_eq!(state.battle_queue.len(), 1);

        state.party[0]
            .status
            .push(StatusEffect::new(StatusKind::Stun, 3.0));
        game_tick(&mut state, 1.0, &content, &mut rng);
        assert!(state.battle_queue.is_empty());
    }

    #[test]
    fn test_enemy_charge_cycle_emits_one_prep_and_one_hit() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        // No armor so the hit always lands for full effect.
        state.party[0].equipment.armor = None;
        let mut rng = test_rng();
        let template = passive_template();
        start_combat(&mut state, vec![Enemy::from_template(&template, &mut rng)]);

        // Idle offset is < 4s, charge is 5s: one full cycle fits in 10s.
        // Stop at the first release so the next cycle can't start.
        for _ in 0..10 {
            game_tick(&mut state, 1.0, &content, &mut rng);
            if state.log.iter().any(|l| l.contains("pokes")) {
                break;
            }
        }
        let preps = state.log.iter().filter(|l| l.contains("winds up")).count();
        let hits = state.log.iter().filter(|l| l.contains("pokes")).count();
        assert_eq!(preps, 1, "log: {:?}", state.log);
        assert_eq!(hits, 1, "log: {:?}", state.log);
        assert!(state.party[0].hp < state.party[0].max_hp);
    }

    #[test]
    fn test_dead_enemy_is_inert() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        let mut rng = test_rng();
        let template = passive_template();
        let mut enemy = Enemy::from_template(&template, &mut rng);
        enemy.hp = 0;
        // Keep a live one so combat doesn't end in victory.
        let live = Enemy::from_template(&template, &mut rng);
        start_combat(&mut state, vec![enemy, live]);

        for _ in 0..10 {
            game_tick(&mut state, 1.0, &content, &mut rng);
        }
        assert_eq!(state.active_enemies[0].state, BehaviorState::Idle);
        assert!(state.active_enemies[0].current_move.is_none());
    }

    #[test]
    fn test_summon_is_deferred_to_end_of_pass() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        let mut rng = test_rng();

        let mut template = passive_template();
        template.moves = vec![EnemyMove {
            name: "Call".to_string(),
            kind: MoveKind::Summon,
            weight: 100.0,
            charge_time: 1.0,
            stagger_chance: 0.0,
            prep_message: "signals for backup...".to_string(),
            hit_message: "calls in a guard".to_string(),
            value: 1.0,
            damage: None,
            summon_id: Some("guard".to_string()),
        }];
        start_combat(&mut state, vec![Enemy::from_template(&template, &mut rng)]);

        let mut summoned = false;
        for _ in 0..10 {
            let events = game_tick(&mut state, 1.0, &content, &mut rng);
            if events
                .iter()
                .any(|e| matches!(e, CombatEvent::EnemySummoned { .. }))
            {
                summoned = true;
                break;
            }
        }
        assert!(summoned);
        assert_eq!(state.active_enemies.len(), 2);
        assert!(state.pending_spawns.is_empty());
        assert_eq!(state.active_enemies[1].template_id, "guard");
    }

    #[test]
    fn test_burn_can_finish_the_last_enemy() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        let mut rng = test_rng();
        let template = passive_template();
        let mut enemy = Enemy::from_template(&template, &mut rng);
        enemy.hp = 1;
        enemy
            .status
            .push(StatusEffect::new(StatusKind::Burn, 5.0));
        start_combat(&mut state, vec![enemy]);

        let events = game_tick(&mut state, 1.0, &content, &mut rng);
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::Victory { .. })));
        assert!(!state.is_combat);
        assert_eq!(state.party[0].xp, 20);
    }

    #[test]
    fn test_game_over_makes_ticks_inert() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        let mut rng = test_rng();
        let template = passive_template();
        start_combat(&mut state, vec![Enemy::from_template(&template, &mut rng)]);
        state.party[0].hp = 0;

        game_tick(&mut state, 1.0, &content, &mut rng);
        assert!(state.game_over);

        let log_len = state.log.len();
        let events = game_tick(&mut state, 1.0, &content, &mut rng);
        assert!(events.is_empty());
        assert_eq!(state.log.len(), log_len);
    }

    #[test]
    fn test_enemy_heal_move_clamps_to_max() {
        let content = ContentDb::builtin();
        let mut state = single_member_state(&content);
        let mut rng = test_rng();

        let mut template = passive_template();
        template.moves = vec![EnemyMove {
            name: "Mend".to_string(),
            kind: MoveKind::Heal,
            weight: 100.0,
            charge_time: 1.0,
            stagger_chance: 0.0,
            prep_message: "hums...".to_string(),
            hit_message: "knits itself together".to_string(),
            value: 2.0,
            damage: None,
            summon_id: None,
        }];
        let mut enemy = Enemy::from_template(&template, &mut rng);
        enemy.hp = 29;
        start_combat(&mut state, vec![enemy]);

        for _ in 0..10 {
            game_tick(&mut state, 1.0, &content, &mut rng);
        }
        assert_eq!(state.active_enemies[0].hp, 30);
    }
}
