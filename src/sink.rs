//! Record emission to sink collaborators.
//!
//! The emitter is a pure pass-through: upstream stages enforce record
//! completeness, the sink only writes. Two collaborator implementations
//! ship with the binary; anything else can plug in through [`RecordSink`].

use crate::catalog::models::ProductRecord;
use crate::config::OutputFormat;
use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

/// The only way a finished record leaves the pipeline.
pub trait RecordSink: Send {
    fn emit(&mut self, record: &ProductRecord) -> Result<()>;
}

/// CSV sink projecting each record onto the configured columns, in order.
/// Column names the record does not know come out empty.
pub struct CsvSink<W: Write + Send> {
    writer: W,
    fields: Vec<String>,
    header_written: bool,
}

impl<W: Write + Send> CsvSink<W> {
    pub fn new(writer: W, fields: Vec<String>) -> Self {
        Self { writer, fields, header_written: false }
    }
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
    fn emit(&mut self, record: &ProductRecord) -> Result<()> {
        if !self.header_written {
            let header: Vec<String> = self.fields.iter().map(|f| csv_escape(f)).collect();
            writeln!(self.writer, "{}", header.join(",")).context("Failed to write CSV header")?;
            self.header_written = true;
        }

        let row: Vec<String> = self
            .fields
            .iter()
            .map(|f| csv_escape(&record.field(f).unwrap_or_default()))
            .collect();
        writeln!(self.writer, "{}", row.join(",")).context("Failed to write CSV row")?;
        Ok(())
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// JSON-lines sink, one record object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &ProductRecord) -> Result<()> {
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        writeln!(self.writer, "{}", line).context("Failed to write record")?;
        Ok(())
    }
}

/// Builds the sink matching the configured output format.
pub fn make_sink(
    format: OutputFormat,
    writer: Box<dyn Write + Send>,
    fields: Vec<String>,
) -> Box<dyn RecordSink> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(writer, fields)),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
    }
}

/// Pass-through handing completed records to the sink, counting as it goes.
pub struct Emitter {
    sink: Box<dyn RecordSink>,
    emitted: usize,
}

impl Emitter {
    pub fn new(sink: Box<dyn RecordSink>) -> Self {
        Self { sink, emitted: 0 }
    }

    pub fn emit(&mut self, record: &ProductRecord) -> Result<()> {
        self.sink.emit(record)?;
        self.emitted += 1;
        debug!("Emitted record for {}", record.product_id);
        Ok(())
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}
