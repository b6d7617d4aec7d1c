use std::fs;
use std::path::PathBuf;

use indicatif::ProgressBar;
use tracing::{debug, info, instrument};

use crate::config::BrainConfig;
use crate::conversation::Conversation;
use crate::error::{BrainError, Result};
use crate::extract::{collect_conversation, ExtractOptions, ExtractedRecord};
use crate::loader::load_conversations;
use crate::writer::{plan_parts, write_parts, WriteSummary};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    /// Advanced once per conversation during extraction; the caller owns its style.
    pub progress: Option<ProgressBar>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The input export was not there; nothing was written.
    MissingInput { path: PathBuf },
    Completed {
        conversations: usize,
        records: usize,
        summary: WriteSummary,
        dry_run: bool,
    },
}

/// Load, extract, sort and write one export.
#[instrument(skip_all)]
pub fn run(config: &BrainConfig, opts: &RunOptions) -> Result<Outcome> {
    config.validate()?;
    let extract_opts = config.extract_options()?;

    let conversations = match load_conversations(&config.input) {
        Ok(conversations) => conversations,
        Err(err) if err.is_not_found() => {
            debug!("{} not found, nothing to do", config.input.display());
            return Ok(Outcome::MissingInput {
                path: config.input.clone(),
            });
        }
        Err(err) => return Err(err),
    };
    info!("processing {} conversations", conversations.len());

    let records = extract_with_progress(&conversations, &extract_opts, opts.progress.as_ref())?;
    let record_count = records.len();
    debug!(records = record_count, "extraction finished");

    let layout = config.layout();
    let summary = if opts.dry_run {
        let summary = plan_parts(records, &layout);
        for part in &summary.parts {
            println!(
                "[dry-run] would write {} ({} bytes, {} records)",
                part.path.display(),
                part.bytes,
                part.records
            );
        }
        summary
    } else {
        fs::create_dir_all(&layout.output_dir)
            .map_err(|err| BrainError::file(&layout.output_dir, err))?;
        write_parts(records, &layout)?
    };

    let message = format!(
        "Processing complete: {} record(s) from {} conversation(s) in {} part file(s)",
        record_count,
        conversations.len(),
        summary.parts.len()
    );
    println!("{}", message);
    info!(target = "brainctl::run", "{}", message);

    Ok(Outcome::Completed {
        conversations: conversations.len(),
        records: record_count,
        summary,
        dry_run: opts.dry_run,
    })
}

fn extract_with_progress(
    conversations: &[Conversation],
    opts: &ExtractOptions,
    progress: Option<&ProgressBar>,
) -> Result<Vec<ExtractedRecord>> {
    if let Some(pb) = progress {
        pb.set_length(conversations.len() as u64);
        pb.set_position(0);
    }
    let mut records = Vec::new();

    for (idx, conv) in conversations.iter().enumerate() {
        let added = collect_conversation(conv, opts, &mut records)?;
        debug!(index = idx, records = added, "extracted conversation");
        if let Some(pb) = progress {
            pb.inc(1);
            pb.set_message(progress_label(conv));
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    Ok(records)
}

fn progress_label(conv: &Conversation) -> String {
    const LIMIT: usize = 60;
    let raw = conv.title_or_default();
    let mut truncated: String = raw.chars().take(LIMIT - 1).collect();
    if raw.chars().count() >= LIMIT {
        truncated.push('…');
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_label_truncates_on_char_boundaries() {
        let conv = Conversation {
            title: Some("🚀".repeat(100)),
            ..Default::default()
        };
        let label = progress_label(&conv);
        assert_eq!(label.chars().count(), 60);
        assert!(label.ends_with('…'));

        let short = Conversation {
            title: Some("short".into()),
            ..Default::default()
        };
        assert_eq!(progress_label(&short), "short");
        assert_eq!(progress_label(&Conversation::default()), "Untitled");
    }

    #[test]
    fn progress_tracks_every_conversation() {
        let conversations = vec![
            Conversation {
                title: Some("first".into()),
                ..Default::default()
            },
            Conversation::default(),
        ];
        let pb = ProgressBar::hidden();
        let records =
            extract_with_progress(&conversations, &ExtractOptions::default(), Some(&pb)).unwrap();

        assert!(records.is_empty());
        assert_eq!(pb.length(), Some(2));
        assert_eq!(pb.position(), 2);
        assert!(pb.is_finished());
    }
}
