use std::io::Write;

use csv::{Terminator, WriterBuilder};

use crate::error::{FinderError, Result};
use crate::finder::Definition;

/// Writes definitions as headerless CSV, one record per line, in the column
/// order ErrorKind, ExportKind, ImportPath, PackageName, Name,
/// BackingTypeName.
///
/// Pending output is flushed when the writer is dropped, so an early return
/// never loses buffered records. Call [`ReportWriter::finish`] to observe
/// flush errors.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
    records: usize,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        Self { writer, records: 0 }
    }

    pub fn write(&mut self, definition: &Definition) -> Result<()> {
        self.writer.serialize(definition)?;
        self.records += 1;
        Ok(())
    }

    /// Writes every definition in order and returns how many were written.
    pub fn write_all<'a, I>(&mut self, definitions: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Definition>,
    {
        let before = self.records;
        for definition in definitions {
            self.write(definition)?;
        }
        Ok(self.records - before)
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Flushes and hands back the underlying sink.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| FinderError::Io(e.into_error()))
    }
}
