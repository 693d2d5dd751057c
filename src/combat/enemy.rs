//! Enemy combat instances and their behavior state machine.
//!
//! Enemies cycle `Idle -> Charging -> execute -> Idle`. While idle the
//! timer counts toward the next weighted move selection; while charging it
//! counts toward execution of the telegraphed move. Dead enemies are inert
//! but stay in the list until combat ends.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::character::status::{StatusEffect, StatusKind};
use crate::content::{EnemyMessages, EnemyMove, EnemyTemplate};
use crate::core::constants::{
    ENEMY_IDLE_MAX_SECONDS, ENEMY_IDLE_MIN_SECONDS, ENRAGE_DAMAGE_MULTIPLIER,
    LOW_HEALTH_THRESHOLD, PERSISTENT_STATUS_SECONDS, PHASE_DESPERATION_THRESHOLD,
    PHASE_ENRAGE_THRESHOLD, PHASE_PRESSURE_THRESHOLD,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    Idle,
    Charging,
}

/// One-shot transitions already fired for an enemy this combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseMark {
    LowHealth,
    Enrage60,
    Pressure40,
    Desperation20,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub xp_reward: u64,
    pub loot: Vec<String>,
    pub messages: EnemyMessages,
    pub status: Vec<StatusEffect>,
    /// Countdown toward the next state transition (idle or charge).
    pub timer: f64,
    pub state: BehaviorState,
    pub current_move: Option<EnemyMove>,
    pub moves: Vec<EnemyMove>,
    pub phases: bool,
    pub triggered_phases: Vec<PhaseMark>,
}

impl Enemy {
    /// Instantiates a combat opponent from a template with fresh HP and a
    /// short randomized idle offset so spawns don't act in lockstep.
    pub fn from_template(template: &EnemyTemplate, rng: &mut impl Rng) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            template_id: template.id.clone(),
            name: template.name.clone(),
            hp: template.max_hp,
            max_hp: template.max_hp,
            strength: template.strength,
            dexterity: template.dexterity,
            xp_reward: template.xp_reward,
            loot: template.loot.clone(),
            messages: template.messages.clone(),
            status: Vec::new(),
            timer: rng.gen_range(ENEMY_IDLE_MIN_SECONDS..ENEMY_IDLE_MAX_SECONDS),
            state: BehaviorState::Idle,
            current_move: None,
            moves: template.moves.clone(),
            phases: template.phases,
            triggered_phases: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
    }

    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        f64::from(self.hp) / f64::from(self.max_hp)
    }

    /// Weighted move selection: walk the table accumulating weights against
    /// a [0,100) draw, first match wins. Enemies without a move table get a
    /// synthesized basic attack.
    pub fn select_move(&self, rng: &mut impl Rng) -> EnemyMove {
        if self.moves.is_empty() {
            return EnemyMove::basic_fallback();
        }
        let draw: f64 = rng.gen_range(0.0..100.0);
        let mut cumulative = 0.0;
        for enemy_move in &self.moves {
            cumulative += enemy_move.weight;
            if cumulative >= draw {
                return enemy_move.clone();
            }
        }
        // Table weights under 100: fall through to the last entry.
        self.moves[self.moves.len() - 1].clone()
    }

    fn mark_phase(&mut self, mark: PhaseMark) -> bool {
        if self.triggered_phases.contains(&mark) {
            return false;
        }
        self.triggered_phases.push(mark);
        true
    }

    /// Evaluates HP-threshold transitions, returning the flavor lines to
    /// log. Each threshold fires at most once per combat; the 60% phase
    /// also applies the persistent enrage self-buff.
    pub fn check_phases(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.is_alive() {
            return lines;
        }
        let fraction = self.hp_fraction();

        if self.phases {
            if fraction < PHASE_ENRAGE_THRESHOLD && self.mark_phase(PhaseMark::Enrage60) {
                self.status.push(StatusEffect::with_value(
                    StatusKind::Berzerk,
                    PERSISTENT_STATUS_SECONDS,
                    ENRAGE_DAMAGE_MULTIPLIER,
                ));
                lines.push(format!("[{}] {}", self.name, self.messages.phase60));
            }
            if fraction < PHASE_PRESSURE_THRESHOLD && self.mark_phase(PhaseMark::Pressure40) {
                lines.push(format!("[{}] {}", self.name, self.messages.phase40));
            }
            if fraction < PHASE_DESPERATION_THRESHOLD && self.mark_phase(PhaseMark::Desperation20)
            {
                lines.push(format!("[{}] {}", self.name, self.messages.phase20));
            }
        }

        if fraction < LOW_HEALTH_THRESHOLD && self.mark_phase(PhaseMark::LowHealth) {
            lines.push(format!("[{}] {}", self.name, self.messages.low_health));
        }

        lines
    }
}
