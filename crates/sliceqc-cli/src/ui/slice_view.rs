//! Slice preview pane — right panel.
//!
//! Draws one timepoint of the current item as an intensity ramp, scaled to
//! the value range of the whole item so timepoints are comparable.

use ndarray::ArrayView2;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use sliceqc_core::{archive::Archive, store::AnnotationStore};

use crate::app::App;

const RAMP: &[u8] = b" .:-=+*#%@";

/// Render the preview pane into `area`.
pub fn draw<S: AnnotationStore, A: Archive>(f: &mut Frame, area: Rect, app: &App<S, A>) {
  let key = app.nav.current_key();
  let title = match app.nav.volume() {
    Some(v) => {
      let (rows, cols, time) = v.dim();
      format!(
        " {key}  {rows}×{cols}×{time}  t {}/{time} ",
        app.timepoint + 1
      )
    }
    None => format!(" {key} "),
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let parts = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(0), Constraint::Length(1)])
    .split(inner);

  match (app.nav.volume(), app.nav.frame(app.timepoint)) {
    (Some(volume), Some(frame)) => {
      let range = value_range(volume.iter().copied());
      let lines: Vec<Line> = render_ramp(frame, range, parts[0].width, parts[0].height)
        .into_iter()
        .map(Line::from)
        .collect();
      f.render_widget(Paragraph::new(lines), parts[0]);
    }
    _ => {
      f.render_widget(
        Paragraph::new("No data loaded.").style(Style::default().fg(Color::DarkGray)),
        parts[0],
      );
    }
  }

  f.render_widget(Paragraph::new(record_line(app)), parts[1]);
}

/// One line describing the stored record for the current key.
fn record_line<S: AnnotationStore, A: Archive>(app: &App<S, A>) -> Line<'static> {
  let dim = Style::default().fg(Color::DarkGray);
  let Some(rec) = app.nav.store().record(app.nav.current_key()) else {
    return Line::from(Span::styled("no record yet", dim));
  };

  let ordinal = rec.ordinal.map(|o| o.to_string()).unwrap_or_else(|| "-".into());
  let first = rec
    .first_viewed_at
    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
    .unwrap_or_else(|| "-".into());

  Line::from(vec![
    Span::styled("group ", dim),
    Span::raw(rec.group_id.clone()),
    Span::styled("  series ", dim),
    Span::raw(rec.series_id.clone()),
    Span::styled("  slice ", dim),
    Span::raw(ordinal),
    Span::styled("  first viewed ", dim),
    Span::raw(first),
  ])
}

// ─── Rendering helpers ────────────────────────────────────────────────────────

/// `(min, max)` of the finite values, or `(0, 0)` if there are none.
fn value_range(values: impl Iterator<Item = f32>) -> (f32, f32) {
  values
    .filter(|v| v.is_finite())
    .fold(None, |acc, v| match acc {
      None => Some((v, v)),
      Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
    .unwrap_or((0.0, 0.0))
}

/// Sample `frame` onto a `width × height` character grid. Rows of the frame
/// map to lines; the grid is never larger than the frame.
fn render_ramp(
  frame: ArrayView2<f32>,
  (lo, hi): (f32, f32),
  width: u16,
  height: u16,
) -> Vec<String> {
  let (rows, cols) = frame.dim();
  let out_h = rows.min(height as usize);
  let out_w = cols.min(width as usize);
  let span = hi - lo;

  (0..out_h)
    .map(|y| {
      let r = y * rows / out_h.max(1);
      (0..out_w)
        .map(|x| {
          let c = x * cols / out_w.max(1);
          let v = frame[[r, c]];
          let level = if span > 0.0 && v.is_finite() {
            ((v - lo) / span * (RAMP.len() - 1) as f32).round() as usize
          } else {
            0
          };
          RAMP[level.min(RAMP.len() - 1)] as char
        })
        .collect()
    })
    .collect()
}
