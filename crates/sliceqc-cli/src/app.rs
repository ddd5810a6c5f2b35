//! Application state and key dispatch.
//!
//! All review state lives in the [`Navigator`]; this layer only adds what the
//! terminal needs on top of it (preview timepoint, jump picker, status line).
//! Navigation and save errors are shown in the status bar and never end the
//! session.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use sliceqc_core::{archive::Archive, navigation::Navigator, store::AnnotationStore};
use tracing::warn;

// ─── Mode ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  /// Keys navigate and rate.
  Review,
  /// Keys edit the jump-to-key filter.
  Jump,
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App<S, A> {
  pub nav: Navigator<S, A>,

  pub mode: Mode,

  /// Timepoint of the current item shown in the preview.
  pub timepoint: usize,

  /// Jump picker query.
  pub filter: String,

  /// Cursor within the *filtered* key list while jumping.
  pub picker_cursor: usize,

  /// Last error or notice; replaces the status line until the next action.
  pub status_msg: String,
}

impl<S: AnnotationStore, A: Archive> App<S, A> {
  /// Wrap a navigator whose first item is already loaded.
  pub fn new(nav: Navigator<S, A>) -> Self {
    Self {
      nav,
      mode: Mode::Review,
      timepoint: 0,
      filter: String::new(),
      picker_cursor: 0,
      status_msg: String::new(),
    }
  }

  pub fn into_navigator(self) -> Navigator<S, A> { self.nav }

  /// Number of timepoints in the loaded item.
  pub fn timepoints(&self) -> usize {
    self.nav.volume().map_or(0, |v| v.dim().2)
  }

  // ── Jump picker ───────────────────────────────────────────────────────────

  /// `(index, key)` pairs matching the jump filter, in archive order.
  pub fn filtered_keys(&self) -> Vec<(usize, &str)> {
    let keys = self.nav.keys().iter().map(String::as_str).enumerate();
    if self.filter.is_empty() {
      return keys.collect();
    }
    let matcher = SkimMatcherV2::default();
    keys
      .filter(|(_, k)| matcher.fuzzy_match(k, &self.filter).is_some())
      .collect()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match self.mode {
      Mode::Review => self.handle_review_key(key),
      Mode::Jump => {
        self.handle_jump_key(key);
        true
      }
    }
  }

  fn handle_review_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('n') => {
        let r = self.nav.next();
        self.after_navigation(r);
      }
      KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('p') => {
        let r = self.nav.prev();
        self.after_navigation(r);
      }
      KeyCode::Home | KeyCode::Char('g') => self.goto(0),
      KeyCode::End | KeyCode::Char('G') => self.goto(self.nav.len() - 1),

      KeyCode::Char(c @ '0'..='3') => {
        let rating = i64::from(c as u8 - b'0');
        match self.nav.set_rating(rating) {
          Ok(_) => self.status_msg.clear(),
          Err(e) => self.report(e),
        }
      }

      KeyCode::Char('.') | KeyCode::Right => {
        if self.timepoint + 1 < self.timepoints() {
          self.timepoint += 1;
        }
      }
      KeyCode::Char(',') | KeyCode::Left => {
        self.timepoint = self.timepoint.saturating_sub(1);
      }

      KeyCode::Char('/') => {
        self.mode = Mode::Jump;
        self.filter.clear();
        self.picker_cursor = 0;
      }

      _ => {}
    }
    true
  }

  fn handle_jump_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Review;
        self.filter.clear();
      }
      KeyCode::Enter => {
        let target = self
          .filtered_keys()
          .get(self.picker_cursor)
          .map(|(i, _)| *i);
        self.mode = Mode::Review;
        self.filter.clear();
        if let Some(index) = target {
          self.goto(index);
        }
      }
      KeyCode::Down => {
        if self.picker_cursor + 1 < self.filtered_keys().len() {
          self.picker_cursor += 1;
        }
      }
      KeyCode::Up => {
        self.picker_cursor = self.picker_cursor.saturating_sub(1);
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.picker_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.picker_cursor = 0;
      }
      _ => {}
    }
  }

  fn goto(&mut self, index: usize) {
    let r = self.nav.goto(index);
    self.after_navigation(r);
  }

  fn after_navigation(&mut self, result: sliceqc_core::Result<()>) {
    match result {
      Ok(()) => {
        self.status_msg.clear();
        self.timepoint = self.timepoint.min(self.timepoints().saturating_sub(1));
      }
      Err(e) => self.report(e),
    }
  }

  fn report(&mut self, e: sliceqc_core::Error) {
    warn!(error = %e, "action failed");
    self.status_msg = format!("Error: {e}");
  }
}
