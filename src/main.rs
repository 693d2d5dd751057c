//! Terminal client for the Inertia combat engine.
//!
//! Drives the simulation at the fixed one-second tick cadence and maps a
//! thin command line onto engine calls. The acting character is always the
//! head of the battle queue; the engine enforces turn validity either way.

mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use rand::Rng;
use ratatui::{backend::CrosstermBackend, Terminal};

use inertia::combat::actions::{perform_action, TargetKind};
use inertia::combat::lifecycle::start_combat_from_templates;
use inertia::content::{ContentDb, SkillKind};
use inertia::core::constants::TICK_INTERVAL_MS;
use inertia::core::tick::game_tick;
use inertia::save::SaveManager;
use inertia::GameState;

fn main() -> io::Result<()> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal);

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    let content = ContentDb::builtin();
    let mut rng = rand::thread_rng();
    let mut state = GameState::new();

    state.push_log(format!(
        "Project Inertia ({} {})",
        inertia::build_info::BUILD_COMMIT,
        inertia::build_info::BUILD_DATE
    ));
    state.push_log("Three prisoners wake in a holding cell.");
    state.push_log(
        "Commands: recruit <name> <class> | fight [enemies..] | attack <n> | \
         cast <skill> [n] | use <item> [n] | equip <member> <item> | save | load | quit",
    );
    for warning in content.warnings() {
        state.push_log(format!("[CONTENT] {warning}"));
    }

    let mut input = String::new();
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| ui::draw(frame, &state, &input))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break;
                    }
                    KeyCode::Char(c) => input.push(c),
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Enter => {
                        let command = input.trim().to_string();
                        input.clear();
                        if command == "quit" {
                            break;
                        }
                        // A dialogue lock suppresses submission; ticks keep
                        // running below.
                        if !command.is_empty() && !state.input_locked {
                            dispatch(&command, &mut state, &content, &mut rng);
                        }
                    }
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= Duration::from_millis(TICK_INTERVAL_MS) {
            let dt = last_tick.elapsed().as_secs_f64();
            game_tick(&mut state, dt, &content, &mut rng);
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn dispatch(command: &str, state: &mut GameState, content: &ContentDb, rng: &mut impl Rng) {
    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        ["recruit", name, class] => {
            state.register_character(name, class, content);
        }
        ["fight"] => start_fight(state, &["guard", "guard", "guard_captain"], content, rng),
        ["fight", rest @ ..] => {
            let ids: Vec<&str> = rest.to_vec();
            start_fight(state, &ids, content, rng);
        }
        ["attack", target] => {
            submit_action(state, "attack", parse_index(target), content, rng);
        }
        ["cast", skill] => submit_action(state, skill, 0, content, rng),
        ["cast", skill, target] => {
            submit_action(state, skill, parse_index(target), content, rng);
        }
        ["use", item] => submit_action(state, item, 0, content, rng),
        ["use", item, target] => {
            submit_action(state, item, parse_index(target), content, rng);
        }
        ["equip", member, item] => {
            let index = member.parse::<usize>().ok().or_else(|| {
                state
                    .party
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(member))
            });
            match index {
                Some(index) => state.equip_item(index, item, content),
                None => state.push_log(format!("Who is '{member}'?")),
            }
        }
        ["save"] => match SaveManager::new().and_then(|m| m.save(state)) {
            Ok(()) => state.push_log("Game saved."),
            Err(e) => state.push_log(format!("Save failed: {e}")),
        },
        ["load"] => match SaveManager::new().and_then(|m| m.load()) {
            Ok(loaded) => {
                *state = loaded;
                state.push_log("Game loaded.");
            }
            Err(e) => state.push_log(format!("Load failed: {e}")),
        },
        _ => state.push_log("Unknown command."),
    }
}

fn parse_index(text: &str) -> usize {
    text.parse().unwrap_or(0)
}

fn start_fight(state: &mut GameState, ids: &[&str], content: &ContentDb, rng: &mut impl Rng) {
    if state.game_over {
        state.push_log("The run is over.");
    } else if state.is_combat {
        state.push_log("Already in combat!");
    } else if state.party.is_empty() {
        state.push_log("Recruit a party first.");
    } else {
        start_combat_from_templates(state, ids, content, rng);
    }
}

/// Sends the action on behalf of whoever is at the head of the queue,
/// aiming offensive actions at enemies and everything else at the party.
fn submit_action(
    state: &mut GameState,
    action_id: &str,
    target_idx: usize,
    content: &ContentDb,
    rng: &mut impl Rng,
) {
    let actor_idx = state
        .queue_head_id()
        .and_then(|id| state.character_index_by_id(id));
    let Some(actor_idx) = actor_idx else {
        state.push_log("No one is ready to act yet.");
        return;
    };
    let target_kind = action_target_kind(action_id, content);
    perform_action(
        state,
        actor_idx,
        action_id,
        target_idx,
        target_kind,
        content,
        rng,
    );
}

fn action_target_kind(action_id: &str, content: &ContentDb) -> TargetKind {
    if action_id == "attack" {
        return TargetKind::Enemy;
    }
    if let Some(skill) = content.skill(action_id) {
        return match skill.kind {
            SkillKind::Attack { .. } => TargetKind::Enemy,
            _ => TargetKind::Party,
        };
    }
    // Consumables aim at allies.
    TargetKind::Party
}
