//! Flattening conversations into dated transcript records.

use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{trace, warn};

use crate::conversation::{Conversation, NodeMessage, Role};
use crate::error::{BrainError, Result};

/// Label used when a conversation carries no creation time.
pub const UNKNOWN_DATE: &str = "UNKNOWN_DATE";

/// Width of the dashed rule closing every record.
pub const RULE_WIDTH: usize = 80;

/// Which calendar a creation timestamp is read in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateClock {
    #[default]
    Local,
    Zone(Tz),
}

impl DateClock {
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) if !name.trim().is_empty() => name
                .trim()
                .parse::<Tz>()
                .map(DateClock::Zone)
                .map_err(|err| BrainError::config(format!("unknown timezone '{name}': {err}"))),
            _ => Ok(DateClock::Local),
        }
    }

    /// Date label for a conversation's `create_time`. A zero timestamp counts as absent.
    pub fn label(&self, create_time: Option<f64>) -> Result<DateLabel> {
        let seconds = match create_time {
            Some(seconds) if seconds != 0.0 => seconds,
            _ => return Ok(DateLabel::Unknown),
        };
        let utc = from_unix_seconds(seconds)?;
        let date = match self {
            DateClock::Local => utc.with_timezone(&Local).date_naive(),
            DateClock::Zone(tz) => utc.with_timezone(tz).date_naive(),
        };
        Ok(DateLabel::Known(date))
    }
}

fn from_unix_seconds(seconds: f64) -> Result<DateTime<Utc>> {
    if !seconds.is_finite() {
        return Err(BrainError::invalid_timestamp(
            seconds.to_string(),
            "not a finite number",
        ));
    }
    // Truncate toward the earlier instant so a label never rolls into the next day
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9) as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
        .ok_or_else(|| BrainError::invalid_timestamp(seconds.to_string(), "out of range"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabel {
    Known(NaiveDate),
    Unknown,
}

impl DateLabel {
    pub fn year(&self) -> i32 {
        match self {
            DateLabel::Known(date) => date.year(),
            DateLabel::Unknown => 0,
        }
    }
}

impl fmt::Display for DateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateLabel::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateLabel::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

/// One message rendered as a transcript block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    text: String,
    date: String,
    year: i32,
}

impl ExtractedRecord {
    pub fn new(label: &DateLabel, title: &str, role: &Role, content: &str) -> Self {
        let date = label.to_string();
        let text = format!(
            "\n### DATE: {date} | TOPIC: {title} | ROLE: {role}\n{content}\n{rule}\n",
            role = role.header_label(),
            rule = "-".repeat(RULE_WIDTH),
        );
        Self {
            text,
            date,
            year: label.year(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Size of the block once written as UTF-8.
    pub fn byte_len(&self) -> u64 {
        self.text.len() as u64
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub clock: DateClock,
    /// Fail on messages without `author.role` instead of skipping them.
    pub strict: bool,
    /// Keep only records from this calendar year.
    pub year: Option<i32>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            clock: DateClock::Local,
            strict: true,
            year: None,
        }
    }
}

/// Lazily yields the records of one conversation, walking `mapping` in stored order.
pub fn extract_records<'a>(
    conv: &'a Conversation,
    opts: &'a ExtractOptions,
) -> Result<impl Iterator<Item = Result<ExtractedRecord>> + 'a> {
    let label = opts.clock.label(conv.create_time)?;
    let title = conv.title_or_default();

    Ok(conv
        .mapping
        .iter()
        .filter_map(move |(node_id, node)| {
            extract_node(title, &label, node_id, node, opts.strict).transpose()
        }))
}

fn extract_node(
    title: &str,
    label: &DateLabel,
    node_id: &str,
    node: &Value,
    strict: bool,
) -> Result<Option<ExtractedRecord>> {
    let message = match NodeMessage::from_node(node) {
        NodeMessage::Absent => return Ok(None),
        NodeMessage::Malformed(reason) if strict => {
            return Err(BrainError::malformed(title, node_id, reason));
        }
        NodeMessage::Malformed(reason) => {
            warn!(conversation = title, node = node_id, %reason, "skipping malformed message");
            return Ok(None);
        }
        NodeMessage::Present(message) => message,
    };

    if !message.role.is_forwarded() {
        trace!(node = node_id, role = ?message.role, "skipping role");
        return Ok(None);
    }

    let content = message.content();
    if content.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(ExtractedRecord::new(
        label,
        title,
        &message.role,
        &content,
    )))
}

/// Append one conversation's records to `out`, honoring the year filter.
/// Returns how many records were added.
pub fn collect_conversation(
    conv: &Conversation,
    opts: &ExtractOptions,
    out: &mut Vec<ExtractedRecord>,
) -> Result<usize> {
    let before = out.len();
    for record in extract_records(conv, opts)? {
        let record = record?;
        if opts.year.map_or(true, |year| record.year() == year) {
            out.push(record);
        }
    }
    Ok(out.len() - before)
}

/// Records of every conversation, in input order.
pub fn extract_all(conversations: &[Conversation], opts: &ExtractOptions) -> Result<Vec<ExtractedRecord>> {
    let mut records = Vec::new();
    for conv in conversations {
        collect_conversation(conv, opts, &mut records)?;
    }
    Ok(records)
}
