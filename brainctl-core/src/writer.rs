//! Size-bounded part files.
//!
//! Records are written in date order into `{base}_Part{N}{ext}`. Before each
//! record the running byte count of the open part is checked with
//! [`needs_rollover`]; when the record would push it past the limit the part
//! is closed and the next one opened, and only then is the record written.
//! A record is never checked against the part it rolls into, so a single
//! record larger than the limit still lands whole in its own part.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{MAX_FILE_SIZE_MB, OUTPUT_BASE_NAME, OUTPUT_EXT};
use crate::error::{BrainError, Result};
use crate::extract::ExtractedRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartLayout {
    pub output_dir: PathBuf,
    pub base_name: String,
    pub extension: String,
    pub max_bytes: u64,
}

impl Default for PartLayout {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            base_name: OUTPUT_BASE_NAME.to_owned(),
            extension: OUTPUT_EXT.to_owned(),
            max_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
        }
    }
}

impl PartLayout {
    pub fn file_name(&self, part: usize) -> String {
        format!("{}_Part{}{}", self.base_name, part, self.extension)
    }

    pub fn path_for(&self, part: usize) -> PathBuf {
        self.output_dir.join(self.file_name(part))
    }
}

/// Would appending `record_bytes` to a part already holding `current_bytes` exceed `max_bytes`?
pub fn needs_rollover(current_bytes: u64, record_bytes: u64, max_bytes: u64) -> bool {
    current_bytes
        .checked_add(record_bytes)
        .map_or(true, |total| total > max_bytes)
}

/// Stable sort by date label, compared as plain strings.
///
/// `UNKNOWN_DATE` lands after every `YYYY-MM-DD` label.
pub fn sort_records(records: &mut [ExtractedRecord]) {
    records.sort_by(|a, b| a.date().cmp(b.date()));
}

/// Running totals for the part currently being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartTally {
    pub part: usize,
    pub bytes: u64,
    pub records: usize,
}

impl Default for PartTally {
    fn default() -> Self {
        Self {
            part: 1,
            bytes: 0,
            records: 0,
        }
    }
}

impl PartTally {
    /// Account for one record. When it forces a rollover the tally moves to the
    /// next part and the closed part's totals are returned.
    pub fn admit(&mut self, record_bytes: u64, max_bytes: u64) -> Option<PartTally> {
        let closed = if needs_rollover(self.bytes, record_bytes, max_bytes) {
            let closed = *self;
            *self = PartTally {
                part: self.part + 1,
                bytes: 0,
                records: 0,
            };
            Some(closed)
        } else {
            None
        };
        self.bytes += record_bytes;
        self.records += 1;
        closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSummary {
    pub part: usize,
    pub path: PathBuf,
    pub bytes: u64,
    pub records: usize,
}

impl PartSummary {
    fn from_tally(layout: &PartLayout, tally: PartTally) -> Self {
        Self {
            part: tally.part,
            path: layout.path_for(tally.part),
            bytes: tally.bytes,
            records: tally.records,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub parts: Vec<PartSummary>,
}

impl WriteSummary {
    pub fn total_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.bytes).sum()
    }

    pub fn total_records(&self) -> usize {
        self.parts.iter().map(|p| p.records).sum()
    }
}

/// Owns the one open part file. Dropping it closes whatever is open.
pub struct PartWriter {
    layout: PartLayout,
    tally: PartTally,
    writer: Option<BufWriter<File>>,
    finished: Vec<PartSummary>,
}

impl PartWriter {
    /// Opens part 1, truncating any existing file of that name.
    pub fn create(layout: PartLayout) -> Result<Self> {
        let tally = PartTally::default();
        let writer = open_part(&layout, tally.part)?;
        info!("writing to {}", layout.path_for(tally.part).display());
        Ok(Self {
            layout,
            tally,
            writer: Some(writer),
            finished: Vec::new(),
        })
    }

    pub fn write_record(&mut self, record: &ExtractedRecord) -> Result<()> {
        if let Some(closed) = self.tally.admit(record.byte_len(), self.layout.max_bytes) {
            if let Some(previous) = self.writer.take() {
                close_part(&self.layout, closed.part, previous)?;
            }
            self.finished
                .push(PartSummary::from_tally(&self.layout, closed));
            self.writer = Some(open_part(&self.layout, self.tally.part)?);
            info!(
                "switched to {} (size limit reached)",
                self.layout.path_for(self.tally.part).display()
            );
        }

        let path = self.layout.path_for(self.tally.part);
        let writer = self.writer.as_mut().ok_or_else(|| closed_error(&path))?;
        writer
            .write_all(record.text().as_bytes())
            .map_err(|err| BrainError::file(&path, err))
    }

    /// Flush and close the last part.
    pub fn finish(mut self) -> Result<WriteSummary> {
        if let Some(writer) = self.writer.take() {
            close_part(&self.layout, self.tally.part, writer)?;
        }
        self.finished
            .push(PartSummary::from_tally(&self.layout, self.tally));
        debug!(parts = self.finished.len(), "closed final part");
        Ok(WriteSummary {
            parts: self.finished,
        })
    }
}

fn open_part(layout: &PartLayout, part: usize) -> Result<BufWriter<File>> {
    let path = layout.path_for(part);
    let file = File::create(&path).map_err(|err| BrainError::file(&path, err))?;
    Ok(BufWriter::new(file))
}

fn closed_error(path: &Path) -> BrainError {
    BrainError::file(
        path,
        io::Error::new(io::ErrorKind::Other, "part file is no longer open"),
    )
}

fn close_part(layout: &PartLayout, part: usize, mut writer: BufWriter<File>) -> Result<()> {
    writer
        .flush()
        .map_err(|err| BrainError::file(layout.path_for(part), err))
}

/// Sort `records` and write them out as parts.
pub fn write_parts(mut records: Vec<ExtractedRecord>, layout: &PartLayout) -> Result<WriteSummary> {
    sort_records(&mut records);
    let mut writer = PartWriter::create(layout.clone())?;
    for record in &records {
        writer.write_record(record)?;
    }
    writer.finish()
}

/// The parts [`write_parts`] would produce, without touching the filesystem.
pub fn plan_parts(mut records: Vec<ExtractedRecord>, layout: &PartLayout) -> WriteSummary {
    sort_records(&mut records);
    let mut tally = PartTally::default();
    let mut parts = Vec::new();
    for record in &records {
        if let Some(closed) = tally.admit(record.byte_len(), layout.max_bytes) {
            parts.push(PartSummary::from_tally(layout, closed));
        }
    }
    parts.push(PartSummary::from_tally(layout, tally));
    WriteSummary { parts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::extract::DateLabel;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn record(date: Option<(i32, u32, u32)>, content: &str) -> ExtractedRecord {
        let label = match date {
            Some((y, m, d)) => DateLabel::Known(NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            None => DateLabel::Unknown,
        };
        ExtractedRecord::new(&label, "Topic", &Role::User, content)
    }

    fn layout(dir: &TempDir, max_bytes: u64) -> PartLayout {
        PartLayout {
            output_dir: dir.path().to_path_buf(),
            max_bytes,
            ..Default::default()
        }
    }

    #[test]
    fn default_layout_matches_reference_names() {
        let layout = PartLayout::default();
        assert_eq!(layout.max_bytes, 52_428_800);
        assert_eq!(layout.file_name(1), "Mahmoud_Master_Brain_2025_Part1.txt");
        assert_eq!(layout.file_name(12), "Mahmoud_Master_Brain_2025_Part12.txt");
    }

    #[test]
    fn rollover_decision() {
        assert!(!needs_rollover(0, 8, 10));
        assert!(needs_rollover(8, 8, 10));
        assert!(!needs_rollover(2, 8, 10));
        assert!(needs_rollover(0, 11, 10));
        // A sum past u64::MAX is over any limit
        assert!(needs_rollover(u64::MAX, 1, u64::MAX));
        assert!(!needs_rollover(u64::MAX - 1, 1, u64::MAX));
    }

    #[test]
    fn two_eight_byte_records_with_ten_byte_budget() {
        let mut tally = PartTally::default();
        assert_eq!(tally.admit(8, 10), None);
        let closed = tally.admit(8, 10).unwrap();
        assert_eq!(
            closed,
            PartTally {
                part: 1,
                bytes: 8,
                records: 1
            }
        );
        assert_eq!(
            tally,
            PartTally {
                part: 2,
                bytes: 8,
                records: 1
            }
        );
    }

    #[test]
    fn oversized_first_record_leaves_part_one_empty() {
        let mut tally = PartTally::default();
        let closed = tally.admit(25, 10).unwrap();
        assert_eq!(closed.records, 0);
        assert_eq!(tally.part, 2);
        assert_eq!(tally.bytes, 25);
    }

    #[test]
    fn sort_is_stable_and_lexicographic() {
        let mut records = vec![
            record(None, "undated"),
            record(Some((2025, 8, 23)), "late-a"),
            record(Some((2024, 1, 2)), "early"),
            record(Some((2025, 8, 23)), "late-b"),
        ];
        sort_records(&mut records);
        let order: Vec<_> = records
            .iter()
            .map(|r| r.text().lines().nth(2).unwrap().to_owned())
            .collect();
        assert_eq!(order, vec!["early", "late-a", "late-b", "undated"]);
    }

    #[test]
    fn writes_rollover_parts() {
        let dir = TempDir::new().unwrap();
        let a = record(Some((2025, 1, 1)), "first");
        let b = record(Some((2025, 1, 2)), "second");
        let max = a.byte_len() + b.byte_len() - 1;

        let summary = write_parts(vec![b.clone(), a.clone()], &layout(&dir, max)).unwrap();
        assert_eq!(summary.parts.len(), 2);
        assert_eq!(summary.total_records(), 2);

        let part1 = fs::read_to_string(dir.path().join("Mahmoud_Master_Brain_2025_Part1.txt")).unwrap();
        let part2 = fs::read_to_string(dir.path().join("Mahmoud_Master_Brain_2025_Part2.txt")).unwrap();
        assert_eq!(part1, a.text());
        assert_eq!(part2, b.text());
    }

    #[test]
    fn records_fit_in_one_part_when_under_budget() {
        let dir = TempDir::new().unwrap();
        let records = vec![record(Some((2025, 1, 1)), "x"), record(Some((2025, 1, 1)), "y")];
        let total: u64 = records.iter().map(ExtractedRecord::byte_len).sum();

        let summary = write_parts(records, &layout(&dir, total)).unwrap();
        assert_eq!(summary.parts.len(), 1);
        assert_eq!(summary.parts[0].bytes, total);
        assert_eq!(
            fs::metadata(&summary.parts[0].path).unwrap().len(),
            total
        );
    }

    #[test]
    fn no_records_still_creates_part_one() {
        let dir = TempDir::new().unwrap();
        let summary = write_parts(Vec::new(), &layout(&dir, 10)).unwrap();
        assert_eq!(summary.parts.len(), 1);
        assert_eq!(fs::metadata(&summary.parts[0].path).unwrap().len(), 0);
    }

    #[test]
    fn existing_parts_are_overwritten() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir, 1 << 20);
        fs::write(layout.path_for(1), "stale contents that are much longer").unwrap();

        let r = record(None, "fresh");
        write_parts(vec![r.clone()], &layout).unwrap();
        assert_eq!(fs::read_to_string(layout.path_for(1)).unwrap(), r.text());
    }

    #[test]
    fn plan_matches_write() {
        let dir = TempDir::new().unwrap();
        let records: Vec<_> = (0..20)
            .map(|i| record(Some((2025, 1 + (i % 12), 1)), &"z".repeat(i as usize * 7)))
            .collect();
        let layout = layout(&dir, 400);

        let planned = plan_parts(records.clone(), &layout);
        let written = write_parts(records, &layout).unwrap();
        assert_eq!(planned, written);
    }

    #[test]
    fn missing_output_dir_is_file_error() {
        let dir = TempDir::new().unwrap();
        let layout = PartLayout {
            output_dir: dir.path().join("does/not/exist"),
            ..Default::default()
        };
        let err = write_parts(vec![record(None, "x")], &layout).unwrap_err();
        assert!(matches!(err, BrainError::File { .. }));
    }
}
