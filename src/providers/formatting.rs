//! Whitespace formatting
//!
//! Line based: tabs become `formatter.tabSize` spaces and trailing whitespace
//! is trimmed. Each changed line produces one edit covering that line's
//! content, never its line terminator.
//!
//! Formatting reads the live text, so edits made since the last save are
//! formatted too.

use std::ops::RangeInclusive;
use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range, TextEdit, Url};

use crate::core::configuration::{ConfigurationState, FormatterConfig};
use crate::core::events::LiveDocumentEventBus;

/// Upper bound for `formatter.tabSize`
const MAX_TAB_SIZE: u32 = 16;

pub struct FormattingProvider {
    live: Arc<LiveDocumentEventBus>,
    config: Arc<ConfigurationState>,
}

impl FormattingProvider {
    pub fn new(live: Arc<LiveDocumentEventBus>, config: Arc<ConfigurationState>) -> Self {
        Self { live, config }
    }

    /// Edits for the whole document; `None` while the formatter is disabled
    pub async fn format(&self, uri: &Url) -> Option<Vec<TextEdit>> {
        let config = self.config.snapshot().await.formatter;
        if !config.enabled {
            return None;
        }
        let document = self.live.get(uri)?;
        let text = &document.text;

        let lines: Vec<&str> = text.split('\n').collect();
        let mut edits = format_lines(&lines, 0..=lines.len().saturating_sub(1), &config);

        if config.insert_final_newline && !text.is_empty() && !text.ends_with('\n') {
            // `split` always yields at least one line
            let last_index = lines.len() - 1;
            let last = last_index as u32;
            match edits.iter_mut().rev().find(|e| e.range.start.line == last) {
                Some(edit) => edit.new_text.push('\n'),
                None => {
                    let end = Position::new(last, utf16_len(content(lines[last_index])));
                    edits.push(TextEdit::new(Range::new(end, end), "\n".to_string()));
                }
            }
        }

        Some(edits)
    }
}

pub struct RangeFormattingProvider {
    live: Arc<LiveDocumentEventBus>,
    config: Arc<ConfigurationState>,
}

impl RangeFormattingProvider {
    pub fn new(live: Arc<LiveDocumentEventBus>, config: Arc<ConfigurationState>) -> Self {
        Self { live, config }
    }

    /// Edits for the lines touched by `range`. A range ending at column 0
    /// does not include that last line.
    pub async fn format_range(&self, uri: &Url, range: Range) -> Option<Vec<TextEdit>> {
        let config = self.config.snapshot().await.formatter;
        if !config.enabled {
            return None;
        }
        let document = self.live.get(uri)?;

        let lines: Vec<&str> = document.text.split('\n').collect();
        let start = range.start.line as usize;
        let mut end = range.end.line as usize;
        if range.end.character == 0 && end > start {
            end -= 1;
        }
        let end = end.min(lines.len().saturating_sub(1));
        if start > end {
            return Some(Vec::new());
        }

        Some(format_lines(&lines, start..=end, &config))
    }
}

fn format_lines(
    lines: &[&str],
    range: RangeInclusive<usize>,
    config: &FormatterConfig,
) -> Vec<TextEdit> {
    let indent = " ".repeat(config.tab_size.min(MAX_TAB_SIZE) as usize);

    range
        .filter_map(|index| {
            let original = content(lines.get(index)?);
            let formatted = original.replace('\t', &indent).trim_end().to_string();
            if formatted == original {
                return None;
            }
            let line = index as u32;
            Some(TextEdit::new(
                Range::new(
                    Position::new(line, 0),
                    Position::new(line, utf16_len(original)),
                ),
                formatted,
            ))
        })
        .collect()
}

/// Line text without a `\r` terminator
fn content(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}
