//! Key list pane — left panel.
//!
//! Viewed keys are green, unviewed keys red, mirroring the review sheet the
//! reviewers work from.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use sliceqc_core::{archive::Archive, store::AnnotationStore};

use crate::app::{App, Mode};

const VIEWED: Color = Color::Rgb(120, 200, 120);
const UNVIEWED: Color = Color::Rgb(220, 110, 110);

/// Render the key list into `area`.
pub fn draw<S: AnnotationStore, A: Archive>(f: &mut Frame, area: Rect, app: &App<S, A>) {
  let flags = app.nav.viewed_flags();
  let total = flags.len();
  let viewed = flags.iter().filter(|v| **v).count();

  let (rows, cursor) = match app.mode {
    Mode::Review => {
      let all: Vec<_> = app.nav.keys().iter().map(String::as_str).enumerate().collect();
      (all, app.nav.position())
    }
    Mode::Jump => (app.filtered_keys(), app.picker_cursor),
  };

  let title = match app.mode {
    Mode::Review => format!(" Items ({viewed}/{total} viewed) "),
    Mode::Jump => format!(" Jump ({}/{total}) ", rows.len()),
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = rows
    .iter()
    .map(|(i, key)| {
      let (marker, color) = if flags[*i] { ("● ", VIEWED) } else { ("○ ", UNVIEWED) };
      ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(color)),
        Span::styled(key.to_string(), Style::default().fg(color)),
      ]))
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if app.mode == Mode::Jump && inner_area.height > 1 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height -= 1;
    f.render_widget(
      Paragraph::new(format!("/{}_", app.filter)).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = ListState::default();
  state.select((!rows.is_empty()).then_some(cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
