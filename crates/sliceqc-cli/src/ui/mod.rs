//! TUI rendering — orchestrates all panes.

pub mod key_list;
pub mod slice_view;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use sliceqc_core::{archive::Archive, store::AnnotationStore};

use crate::app::{App, Mode};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S: AnnotationStore, A: Archive>(f: &mut Frame, app: &App<S, A>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0]);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect) {
  let date = Local::now().format("%Y-%m-%d %H:%M").to_string();

  let left = Span::styled(
    " slice-qc  [0-3] rate  [/] jump  [q] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<S: AnnotationStore, A: Archive>(f: &mut Frame, area: Rect, app: &App<S, A>) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
    .split(area);

  key_list::draw(f, cols[0], app);
  slice_view::draw(f, cols[1], app);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S: AnnotationStore, A: Archive>(f: &mut Frame, area: Rect, app: &App<S, A>) {
  let (mode_label, hints) = match app.mode {
    Mode::Review => ("REVIEW", "↑↓/jk navigate  ,/. timepoint  0-3 rate"),
    Mode::Jump => ("JUMP", "Type to filter  ↑↓ select  Enter jump  Esc cancel"),
  };

  let (text, color) = if app.status_msg.is_empty() {
    (format!("{}   {hints}", app.nav.status()), Color::Gray)
  } else {
    (app.status_msg.clone(), Color::Red)
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let text_span = Span::styled(format!("  {text}"), Style::default().fg(color));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, text_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
