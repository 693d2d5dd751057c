//! The action resolver: validates and applies exactly one player-issued
//! action — a basic attack, a skill, or a consumable — against a target.
//!
//! Every rejection is a log line and a no-op: resources are only consumed
//! and state only advances once the action is known to be valid. Only the
//! character at the head of the battle queue may act; a successful action
//! resets their readiness and pops the queue.

use rand::Rng;

use super::enemy::BehaviorState;
use super::events::CombatEvent;
use super::lifecycle::check_victory;
use crate::character::stats::derived_stats;
use crate::character::status::StatusEffect;
use crate::content::{
    ConsumableEffect, ContentDb, HealAmount, Item, ItemKind, Skill, SkillKind, StatusApply,
};
use crate::core::constants::{
    BASIC_ATTACK_DIVISOR, DEFAULT_UNARMED_FORMULA, READINESS_RESET_SECONDS,
    STAGGER_RESET_SECONDS, STEAL_CREDITS_AMOUNT,
};
use crate::core::formula::calc_value;
use crate::core::game_state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Enemy,
    Party,
}

/// Resolves one action for the character at `actor_idx`. `action_id` is the
/// literal `"attack"`, a skill id, or a consumable item id.
pub fn perform_action(
    state: &mut GameState,
    actor_idx: usize,
    action_id: &str,
    target_idx: usize,
    target_kind: TargetKind,
    content: &ContentDb,
    rng: &mut impl Rng,
) -> Vec<CombatEvent> {
    let mut events = Vec::new();

    // Terminal condition: everything is inert until an external reset.
    if state.game_over {
        return events;
    }
    if !state.is_combat {
        state.push_log("There is nothing to fight.");
        return events;
    }

    let (actor_id, actor_name, down, crowd_controlled) = match state.party.get(actor_idx) {
        Some(actor) => (
            actor.id.clone(),
            actor.name.clone(),
            actor.is_incapacitated(),
            actor.is_crowd_controlled(),
        ),
        None => {
            state.push_log("Invalid character.");
            return events;
        }
    };
    if down {
        state.push_log(format!("[{actor_name}] is down!"));
        return events;
    }
    if crowd_controlled {
        state.push_log(format!("[{actor_name}] can't act right now!"));
        return events;
    }
    if state.queue_head_id() != Some(actor_id.as_str()) {
        state.push_log(format!("It's not [{actor_name}]'s turn!"));
        return events;
    }

    if action_id == "attack" {
        resolve_basic_attack(
            state,
            actor_idx,
            &actor_name,
            target_idx,
            target_kind,
            content,
            rng,
            &mut events,
        );
    } else if let Some(skill) = content.skill(action_id) {
        resolve_skill(
            state,
            actor_idx,
            &actor_name,
            skill,
            target_idx,
            target_kind,
            content,
            rng,
            &mut events,
        );
    } else if let Some(item) = content.item(action_id) {
        if item.is_consumable() {
            resolve_item(
                state,
                actor_idx,
                &actor_name,
                item,
                target_idx,
                target_kind,
                content,
                rng,
                &mut events,
            );
        } else {
            state.push_log(format!("You can't use the {} like that.", item.name));
        }
    } else {
        state.push_log("Unknown skill or item.");
    }

    events
}

fn consume_turn(state: &mut GameState, actor_idx: usize) {
    state.party[actor_idx].readiness = READINESS_RESET_SECONDS;
    state.battle_queue.pop_front();
}

/// Applies damage to an enemy, logging its death line on a kill.
fn damage_enemy(
    state: &mut GameState,
    enemy_idx: usize,
    damage: i32,
    events: &mut Vec<CombatEvent>,
) {
    state.active_enemies[enemy_idx].take_damage(damage);
    if !state.active_enemies[enemy_idx].is_alive() {
        let name = state.active_enemies[enemy_idx].name.clone();
        let death = state.active_enemies[enemy_idx].messages.death.clone();
        state.push_log(format!("[{name}] {death}"));
        events.push(CombatEvent::EnemyDefeated { name });
    }
}

/// A hit against a charging enemy may cancel the telegraphed move and
/// knock the enemy back to idle with a short timer.
fn try_stagger(
    state: &mut GameState,
    enemy_idx: usize,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    let enemy = &state.active_enemies[enemy_idx];
    if !enemy.is_alive() || enemy.state != BehaviorState::Charging {
        return;
    }
    let chance = enemy
        .current_move
        .as_ref()
        .map_or(0.0, |m| m.stagger_chance);
    if rng.gen::<f64>() < chance {
        let enemy = &mut state.active_enemies[enemy_idx];
        enemy.state = BehaviorState::Idle;
        enemy.current_move = None;
        enemy.timer = STAGGER_RESET_SECONDS;
        let name = enemy.name.clone();
        state.push_log(format!("[{name}] is staggered and loses the attack!"));
        events.push(CombatEvent::Staggered { enemy: name });
    }
}

fn weapon_formula(state: &GameState, actor_idx: usize, content: &ContentDb) -> String {
    state.party[actor_idx]
        .equipment
        .weapon
        .as_deref()
        .and_then(|id| content.item(id))
        .and_then(|item| match &item.kind {
            ItemKind::Weapon { damage, .. } => Some(damage.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_UNARMED_FORMULA.to_string())
}

/// Rolls the application chance and attaches the configured status to a
/// party member or enemy.
fn apply_status_to_party(
    state: &mut GameState,
    target_idx: usize,
    apply: &StatusApply,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    if rng.gen::<f64>() >= apply.chance {
        return;
    }
    state.party[target_idx].status.push(StatusEffect {
        kind: apply.kind.clone(),
        duration: apply.duration,
        value: apply.value,
        stat: apply.stat,
    });
    let name = state.party[target_idx].name.clone();
    let label = apply.kind.label().to_string();
    state.push_log(format!("[{name}] gains {label}."));
    events.push(CombatEvent::StatusApplied {
        target: name,
        status: label,
    });
}

fn apply_status_to_enemy(
    state: &mut GameState,
    enemy_idx: usize,
    apply: &StatusApply,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    if !state.active_enemies[enemy_idx].is_alive() || rng.gen::<f64>() >= apply.chance {
        return;
    }
    state.active_enemies[enemy_idx].status.push(StatusEffect {
        kind: apply.kind.clone(),
        duration: apply.duration,
        value: apply.value,
        stat: apply.stat,
    });
    let name = state.active_enemies[enemy_idx].name.clone();
    let label = apply.kind.label().to_string();
    state.push_log(format!("[{name}] is afflicted with {label}!"));
    events.push(CombatEvent::StatusApplied {
        target: name,
        status: label,
    });
}

#[allow(clippy::too_many_arguments)]
fn resolve_basic_attack(
    state: &mut GameState,
    actor_idx: usize,
    actor_name: &str,
    target_idx: usize,
    target_kind: TargetKind,
    content: &ContentDb,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    if target_kind != TargetKind::Enemy {
        state.push_log("You can't attack an ally.");
        return;
    }
    let (target_name, target_alive) = match state.active_enemies.get(target_idx) {
        Some(enemy) => (enemy.name.clone(), enemy.is_alive()),
        None => {
            state.push_log("Invalid target.");
            return;
        }
    };
    if !target_alive {
        state.push_log("Target is already down!");
        return;
    }

    let stats = derived_stats(&state.party[actor_idx], content);
    let level = state.party[actor_idx].level;
    let formula = weapon_formula(state, actor_idx, content);
    let raw = calc_value(&formula, &stats, level, rng);
    let damage = (raw / BASIC_ATTACK_DIVISOR).max(1) as i32;

    state.push_log(format!(
        "[{actor_name}] attacks {target_name} for {damage} damage!"
    ));
    events.push(CombatEvent::PlayerHit {
        actor: actor_name.to_string(),
        target: target_name,
        damage,
    });
    damage_enemy(state, target_idx, damage, events);
    try_stagger(state, target_idx, rng, events);
    consume_turn(state, actor_idx);
    check_victory(state, content, events);
}

/// Heal-style targets default to the actor unless an explicit party target
/// was given.
fn party_target(
    state: &GameState,
    actor_idx: usize,
    target_idx: usize,
    target_kind: TargetKind,
) -> Option<usize> {
    match target_kind {
        TargetKind::Party => {
            if target_idx < state.party.len() {
                Some(target_idx)
            } else {
                None
            }
        }
        TargetKind::Enemy => Some(actor_idx),
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_skill(
    state: &mut GameState,
    actor_idx: usize,
    actor_name: &str,
    skill: &Skill,
    target_idx: usize,
    target_kind: TargetKind,
    content: &ContentDb,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    if !state.party[actor_idx]
        .unlocked_skills
        .iter()
        .any(|s| s == &skill.id)
    {
        state.push_log(format!("[{actor_name}] hasn't learned {}!", skill.name));
        return;
    }
    if state.party[actor_idx].sp < skill.cost {
        state.push_log(format!("[{actor_name}] needs {} SP!", skill.cost));
        return;
    }

    match &skill.kind {
        SkillKind::Attack {
            formula,
            multiplier,
            hit_bonus,
        } => {
            if target_kind != TargetKind::Enemy {
                state.push_log(format!("{} needs an enemy target.", skill.name));
                return;
            }
            let (target_name, target_dex, target_alive) =
                match state.active_enemies.get(target_idx) {
                    Some(enemy) => (enemy.name.clone(), enemy.dexterity, enemy.is_alive()),
                    None => {
                        state.push_log("Invalid target.");
                        return;
                    }
                };
            if !target_alive {
                state.push_log("Target is already down!");
                return;
            }

            state.party[actor_idx].spend_sp(skill.cost);

            let stats = derived_stats(&state.party[actor_idx], content);
            let level = state.party[actor_idx].level;

            // Accuracy: hit chance plus the skill's bonus, shaved by half
            // the target's dexterity. A miss keeps the cost.
            let threshold = f64::from(stats.hit_chance) + hit_bonus - f64::from(target_dex) * 0.5;
            let roll: f64 = rng.gen_range(0.0..100.0);
            if roll >= threshold {
                state.push_log(format!(
                    "[{actor_name}]'s {} MISSES {target_name}!",
                    skill.name
                ));
                events.push(CombatEvent::PlayerMissed {
                    actor: actor_name.to_string(),
                    target: target_name,
                });
                consume_turn(state, actor_idx);
                return;
            }

            let base_formula = formula
                .clone()
                .unwrap_or_else(|| weapon_formula(state, actor_idx, content));
            let raw = calc_value(&base_formula, &stats, level, rng);
            let damage = ((raw as f64) * multiplier).floor().max(1.0) as i32;

            state.push_log(format!(
                "[{actor_name}] uses {} on {target_name} for {damage} damage!",
                skill.name
            ));
            events.push(CombatEvent::PlayerHit {
                actor: actor_name.to_string(),
                target: target_name,
                damage,
            });
            damage_enemy(state, target_idx, damage, events);
            if let Some(apply) = &skill.applies {
                apply_status_to_enemy(state, target_idx, apply, rng, events);
            }
            try_stagger(state, target_idx, rng, events);
            consume_turn(state, actor_idx);
            check_victory(state, content, events);
        }

        SkillKind::Heal { amount, duration } => {
            let targets: Vec<usize> = if skill.target_party_wide {
                (0..state.party.len())
                    .filter(|i| !state.party[*i].is_incapacitated())
                    .collect()
            } else {
                let Some(idx) = party_target(state, actor_idx, target_idx, target_kind) else {
                    state.push_log("Invalid target.");
                    return;
                };
                // Additive heals can't wake the incapacitated; that takes a
                // revive or a percent-based formula.
                if state.party[idx].is_incapacitated()
                    && !matches!(amount, HealAmount::Percent(_))
                {
                    let name = state.party[idx].name.clone();
                    state.push_log(format!("It's too late for [{name}]!"));
                    return;
                }
                vec![idx]
            };

            state.party[actor_idx].spend_sp(skill.cost);

            for idx in targets {
                let stats = derived_stats(&state.party[actor_idx], content);
                let level = state.party[actor_idx].level;
                let target_name = state.party[idx].name.clone();
                match amount {
                    HealAmount::Percent(fraction) => {
                        let value =
                            (f64::from(state.party[idx].max_hp) * fraction).floor() as i32;
                        if state.party[idx].is_incapacitated() {
                            state.party[idx].hp = value.clamp(1, state.party[idx].max_hp);
                            state.push_log(format!(
                                "[{actor_name}] revives {target_name} with {}!",
                                skill.name
                            ));
                        } else {
                            state.party[idx].heal(value);
                            state.push_log(format!(
                                "[{actor_name}] heals {target_name} for {value} HP."
                            ));
                        }
                        events.push(CombatEvent::Healed {
                            target: target_name,
                            amount: value,
                        });
                    }
                    HealAmount::Formula(formula) => {
                        let value = calc_value(formula, &stats, level, rng) as i32;
                        if *duration > 0.0 {
                            state.party[idx].status.push(StatusEffect::with_value(
                                crate::character::status::StatusKind::Regen,
                                *duration,
                                f64::from(value),
                            ));
                            state.push_log(format!(
                                "[{target_name}] begins to mend ({value} HP over {duration:.0}s)."
                            ));
                        } else {
                            state.party[idx].heal(value);
                            state.push_log(format!(
                                "[{actor_name}] heals {target_name} for {value} HP."
                            ));
                            events.push(CombatEvent::Healed {
                                target: target_name,
                                amount: value,
                            });
                        }
                    }
                }
                if let Some(apply) = &skill.applies {
                    apply_status_to_party(state, idx, apply, rng, events);
                }
            }
            consume_turn(state, actor_idx);
        }

        SkillKind::Buff => {
            let Some(idx) = party_target(state, actor_idx, target_idx, target_kind) else {
                state.push_log("Invalid target.");
                return;
            };
            if state.party[idx].is_incapacitated() {
                let name = state.party[idx].name.clone();
                state.push_log(format!("It's too late for [{name}]!"));
                return;
            }
            state.party[actor_idx].spend_sp(skill.cost);
            let target_name = state.party[idx].name.clone();
            state.push_log(format!("[{actor_name}] uses {} on {target_name}.", skill.name));
            if let Some(apply) = &skill.applies {
                apply_status_to_party(state, idx, apply, rng, events);
            }
            consume_turn(state, actor_idx);
        }

        SkillKind::RestoreResource { formula } => {
            let Some(idx) = party_target(state, actor_idx, target_idx, target_kind) else {
                state.push_log("Invalid target.");
                return;
            };
            if state.party[idx].is_incapacitated() {
                let name = state.party[idx].name.clone();
                state.push_log(format!("It's too late for [{name}]!"));
                return;
            }
            state.party[actor_idx].spend_sp(skill.cost);
            let stats = derived_stats(&state.party[actor_idx], content);
            let level = state.party[actor_idx].level;
            let amount = calc_value(formula, &stats, level, rng) as i32;
            state.party[idx].restore_sp(amount);
            let target_name = state.party[idx].name.clone();
            state.push_log(format!("[{target_name}] recovers {amount} SP."));
            events.push(CombatEvent::SpRestored {
                target: target_name,
                amount,
            });
            consume_turn(state, actor_idx);
        }

        SkillKind::Revive { amount } => {
            if target_kind != TargetKind::Party || target_idx >= state.party.len() {
                state.push_log(format!("{} needs an ally target.", skill.name));
                return;
            }
            if !state.party[target_idx].is_incapacitated() {
                let name = state.party[target_idx].name.clone();
                state.push_log(format!("[{name}] is still standing!"));
                return;
            }
            state.party[actor_idx].spend_sp(skill.cost);
            let stats = derived_stats(&state.party[actor_idx], content);
            let level = state.party[actor_idx].level;
            let max_hp = state.party[target_idx].max_hp;
            let value = match amount {
                HealAmount::Percent(fraction) => (f64::from(max_hp) * fraction).floor() as i32,
                HealAmount::Formula(formula) => calc_value(formula, &stats, level, rng) as i32,
            };
            state.party[target_idx].hp = value.clamp(1, max_hp);
            let target_name = state.party[target_idx].name.clone();
            state.push_log(format!("[{actor_name}] revives {target_name}!"));
            events.push(CombatEvent::Healed {
                target: target_name,
                amount: value,
            });
            consume_turn(state, actor_idx);
        }

        // Steal pays out of the shared pool and needs no valid target.
        SkillKind::Steal => {
            state.party[actor_idx].spend_sp(skill.cost);
            state.credits += STEAL_CREDITS_AMOUNT;
            state.push_log(format!(
                "[{actor_name}] lifts {STEAL_CREDITS_AMOUNT} credits in the confusion!"
            ));
            events.push(CombatEvent::CreditsStolen {
                amount: STEAL_CREDITS_AMOUNT,
            });
            consume_turn(state, actor_idx);
        }

        SkillKind::Utility => {
            state.party[actor_idx].spend_sp(skill.cost);
            state.push_log(format!("[{actor_name}] uses {}.", skill.name));
            consume_turn(state, actor_idx);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_item(
    state: &mut GameState,
    actor_idx: usize,
    actor_name: &str,
    item: &Item,
    target_idx: usize,
    target_kind: TargetKind,
    content: &ContentDb,
    rng: &mut impl Rng,
    events: &mut Vec<CombatEvent>,
) {
    if !state.inventory.iter().any(|i| i == &item.id) {
        state.push_log(format!("You don't have a {}.", item.name));
        return;
    }
    let ItemKind::Consumable { effect } = &item.kind else {
        return;
    };

    match effect {
        ConsumableEffect::Heal { formula } => {
            let Some(idx) = party_target(state, actor_idx, target_idx, target_kind) else {
                state.push_log("Invalid target.");
                return;
            };
            if state.party[idx].is_incapacitated() {
                let name = state.party[idx].name.clone();
                state.push_log(format!("It's too late for [{name}]!"));
                return;
            }
            state.remove_from_inventory(&item.id);
            let stats = derived_stats(&state.party[idx], content);
            let level = state.party[idx].level;
            let value = calc_value(formula, &stats, level, rng) as i32;
            state.party[idx].heal(value);
            let target_name = state.party[idx].name.clone();
            state.push_log(format!(
                "[{actor_name}] uses the {} on {target_name}, restoring {value} HP.",
                item.name
            ));
            events.push(CombatEvent::Healed {
                target: target_name,
                amount: value,
            });
        }
        ConsumableEffect::RestoreResource => {
            let Some(idx) = party_target(state, actor_idx, target_idx, target_kind) else {
                state.push_log("Invalid target.");
                return;
            };
            if state.party[idx].is_incapacitated() {
                let name = state.party[idx].name.clone();
                state.push_log(format!("It's too late for [{name}]!"));
                return;
            }
            state.remove_from_inventory(&item.id);
            let restored = state.party[idx].max_sp - state.party[idx].sp;
            state.party[idx].sp = state.party[idx].max_sp;
            let target_name = state.party[idx].name.clone();
            state.push_log(format!(
                "[{target_name}] snaps back into focus ({} SP restored).",
                restored
            ));
            events.push(CombatEvent::SpRestored {
                target: target_name,
                amount: restored,
            });
        }
        ConsumableEffect::Revive { percent } => {
            if target_kind != TargetKind::Party || target_idx >= state.party.len() {
                state.push_log(format!("The {} needs an ally target.", item.name));
                return;
            }
            if !state.party[target_idx].is_incapacitated() {
                let name = state.party[target_idx].name.clone();
                state.push_log(format!("[{name}] is still standing!"));
                return;
            }
            state.remove_from_inventory(&item.id);
            let max_hp = state.party[target_idx].max_hp;
            let value = ((f64::from(max_hp) * percent).floor() as i32).clamp(1, max_hp);
            state.party[target_idx].hp = value;
            let target_name = state.party[target_idx].name.clone();
            state.push_log(format!(
                "[{actor_name}] revives {target_name} with the {}!",
                item.name
            ));
            events.push(CombatEvent::Healed {
                target: target_name,
                amount: value,
            });
        }
    }
    consume_turn(state, actor_idx);
}
