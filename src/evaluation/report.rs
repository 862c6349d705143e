use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use super::EvaluationRecord;

/// Destination for evaluation records, written one at a time in processing order.
pub trait ReportSink {
    fn write_record(&mut self, record: &EvaluationRecord) -> anyhow::Result<()>;

    /// Flush anything buffered. Called once after the last record.
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps records in memory.
impl ReportSink for Vec<EvaluationRecord> {
    fn write_record(&mut self, record: &EvaluationRecord) -> anyhow::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// `Image: <path>, IoU: <score>` lines
    #[default]
    Text,
    /// One JSON object per line
    Jsonl,
}

impl ReportFormat {
    /// Create (truncate) the report file at `path`.
    pub fn create(self, path: &Path) -> anyhow::Result<Box<dyn ReportSink>> {
        let file = File::create(path)
            .with_context(|| format!("cannot open file for writing: {}", path.display()))?;
        let out = BufWriter::new(file);
        Ok(match self {
            ReportFormat::Text => Box::new(TextReport::new(out)),
            ReportFormat::Jsonl => Box::new(JsonLinesReport::new(out)),
        })
    }
}

/// Plain-text report, one line per image.
#[derive(Debug)]
pub struct TextReport<W: Write> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn write_record(&mut self, record: &EvaluationRecord) -> anyhow::Result<()> {
        writeln!(self.out, "{}", record.report_line())?;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// JSON Lines report carrying the full record, including detected corners.
#[derive(Debug)]
pub struct JsonLinesReport<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonLinesReport<W> {
    fn write_record(&mut self, record: &EvaluationRecord) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
