//! Terminal presentation layer.
//!
//! This is a binary-only module (not part of `lib.rs`): it reads the
//! engine's state snapshot between ticks and renders the party, the
//! enemies, the turn queue, the event log, and the command line. All game
//! logic lives in the library; nothing here mutates state.

use inertia::character::party::Character;
use inertia::combat::enemy::{BehaviorState, Enemy};
use inertia::GameState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw(frame: &mut Frame, state: &GameState, input: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3 + state.party.len().max(1) as u16),
            Constraint::Length(3 + state.active_enemies.len().max(1) as u16),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.size());

    draw_party(frame, chunks[0], state);
    draw_enemies(frame, chunks[1], state);
    draw_log(frame, chunks[2], state);
    draw_input(frame, chunks[3], state, input);
}

fn hp_color(current: i32, max: i32) -> Color {
    let fraction = if max > 0 {
        f64::from(current) / f64::from(max)
    } else {
        0.0
    };
    if fraction < 0.3 {
        Color::Red
    } else if fraction < 0.6 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn status_tags(effects: &[inertia::character::status::StatusEffect]) -> String {
    if effects.is_empty() {
        return String::new();
    }
    let tags: Vec<&str> = effects.iter().map(|e| e.kind.label()).collect();
    format!(" [{}]", tags.join(", "))
}

fn character_line(character: &Character, is_head: bool) -> Line<'_> {
    let marker = if is_head { "> " } else { "  " };
    let readiness = if character.is_incapacitated() {
        "DOWN".to_string()
    } else if character.readiness <= 0.0 {
        "READY".to_string()
    } else {
        format!("{:.0}s", character.readiness)
    };
    Line::from(vec![
        Span::styled(
            format!("{marker}{:<10}", character.name),
            if is_head {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            },
        ),
        Span::raw(format!("Lv{:<3}", character.level)),
        Span::styled(
            format!("HP {:>3}/{:<3}", character.hp, character.max_hp),
            Style::default().fg(hp_color(character.hp, character.max_hp)),
        ),
        Span::raw(format!("  SP {}/{}", character.sp, character.max_sp)),
        Span::raw(format!("  {readiness}")),
        Span::styled(status_tags(&character.status), Style::default().fg(Color::Magenta)),
    ])
}

fn draw_party(frame: &mut Frame, area: Rect, state: &GameState) {
    let head = state.queue_head_id();
    let mut lines: Vec<Line> = state
        .party
        .iter()
        .map(|c| character_line(c, head == Some(c.id.as_str())))
        .collect();
    if lines.is_empty() {
        lines.push(Line::from("No party. Try: recruit <name> <class>"));
    }

    let queue_names: Vec<&str> = state
        .battle_queue
        .iter()
        .filter_map(|id| {
            state
                .party
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.name.as_str())
        })
        .collect();
    let title = if queue_names.is_empty() {
        "Party".to_string()
    } else {
        format!("Party | queue: {}", queue_names.join(" -> "))
    };

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn enemy_line(index: usize, enemy: &Enemy) -> Line<'_> {
    let state_tag = if !enemy.is_alive() {
        "down".to_string()
    } else {
        match enemy.state {
            BehaviorState::Idle => "idle".to_string(),
            BehaviorState::Charging => match &enemy.current_move {
                Some(m) => format!("charging: {}", m.name),
                None => "charging".to_string(),
            },
        }
    };
    Line::from(vec![
        Span::raw(format!("{index}: {:<16}", enemy.name)),
        Span::styled(
            format!("HP {:>3}/{:<3}", enemy.hp, enemy.max_hp),
            Style::default().fg(hp_color(enemy.hp, enemy.max_hp)),
        ),
        Span::styled(format!("  ({state_tag})"), Style::default().fg(Color::Cyan)),
        Span::styled(status_tags(&enemy.status), Style::default().fg(Color::Magenta)),
    ])
}

fn draw_enemies(frame: &mut Frame, area: Rect, state: &GameState) {
    let mut lines: Vec<Line> = state
        .active_enemies
        .iter()
        .enumerate()
        .map(|(i, e)| enemy_line(i, e))
        .collect();
    if lines.is_empty() {
        lines.push(Line::from("No hostiles."));
    }
    let title = if state.is_combat { "Hostiles" } else { "Area" };
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn draw_log(frame: &mut Frame, area: Rect, state: &GameState) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.log.len().saturating_sub(visible);
    let lines: Vec<Line> = state.log[start..]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log"));
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame, area: Rect, state: &GameState, input: &str) {
    let prompt = if state.game_over {
        Span::styled("GAME OVER", Style::default().fg(Color::Red))
    } else if state.input_locked {
        Span::styled("...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(format!("> {input}_"))
    };
    let paragraph = Paragraph::new(Line::from(prompt))
        .block(Block::default().borders(Borders::ALL).title("Command"));
    frame.render_widget(paragraph, area);
}
