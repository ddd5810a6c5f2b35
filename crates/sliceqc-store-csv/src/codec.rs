//! Minimal RFC 4180 reader and writer.
//!
//! Fields are separated by `,`; a field containing `,`, `"`, CR or LF, or
//! with leading or trailing whitespace, is wrapped in double quotes with
//! inner quotes doubled. Records end with LF; CRLF is accepted on read.
//! Blank lines are skipped.
//!
//! The reader is lenient about hand-edited files: a `"` inside an unquoted
//! field is literal text, and text after a closing quote is appended to the
//! field. Only a quoted field left open at end of input is malformed.

use crate::{Error, Result};

// ─── Reading ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
  /// At the start of a field.
  FieldStart,
  /// Inside an unquoted field.
  Unquoted,
  /// Inside a quoted field.
  Quoted,
  /// Just saw a `"` inside a quoted field: an escaped quote, the closing
  /// quote, or a stray quote followed by more text.
  QuoteInQuoted,
}

/// Split `input` into rows of fields.
pub(crate) fn parse(input: &str) -> Result<Vec<Vec<String>>> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);

  let mut rows: Vec<Vec<String>> = Vec::new();
  let mut row: Vec<String> = Vec::new();
  let mut field = String::new();
  let mut state = State::FieldStart;
  let mut line = 1usize;

  let mut chars = input.chars().peekable();
  while let Some(c) = chars.next() {
    match (state, c) {
      (State::Quoted, '"') => state = State::QuoteInQuoted,
      (State::Quoted, c) => {
        if c == '\n' {
          line += 1;
        }
        field.push(c);
      }
      (State::QuoteInQuoted, '"') => {
        field.push('"');
        state = State::Quoted;
      }
      (State::FieldStart, '"') => state = State::Quoted,
      (_, ',') => {
        row.push(std::mem::take(&mut field));
        state = State::FieldStart;
      }
      (_, '\r') if chars.peek() == Some(&'\n') => {}
      (_, '\n') => {
        row.push(std::mem::take(&mut field));
        end_row(&mut rows, std::mem::take(&mut row));
        state = State::FieldStart;
        line += 1;
      }
      (_, c) => {
        field.push(c);
        state = State::Unquoted;
      }
    }
  }

  if state == State::Quoted {
    return Err(Error::Malformed(format!(
      "line {line}: unterminated quoted field"
    )));
  }
  if !row.is_empty() || !field.is_empty() || state == State::QuoteInQuoted {
    row.push(field);
    end_row(&mut rows, row);
  }

  Ok(rows)
}

/// Push `row` unless it is a blank line.
fn end_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
  if row.len() == 1 && row[0].is_empty() {
    return;
  }
  rows.push(row);
}

// ─── Writing ─────────────────────────────────────────────────────────────────

fn needs_quotes(field: &str) -> bool {
  field.contains([',', '"', '\r', '\n'])
    || field.starts_with(char::is_whitespace)
    || field.ends_with(char::is_whitespace)
}

/// Append one record to `out`, terminated by LF.
pub(crate) fn write_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
  for (i, field) in fields.into_iter().enumerate() {
    if i > 0 {
      out.push(',');
    }
    if needs_quotes(field) {
      out.push('"');
      out.push_str(&field.replace('"', "\"\""));
      out.push('"');
    } else {
      out.push_str(field);
    }
  }
  out.push('\n');
}
