//! Per-generation timing instrumentation.
//!
//! The engine reports the wall time of its phases to a [`GenerationSink`]
//! injected by the caller. Sinks only observe: they never influence the run.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Timing of one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTiming {
    /// Island / process rank that produced the record
    pub rank: usize,
    /// 1-based generation index
    pub generation: usize,
    pub num_nodes: usize,
    pub population_size: usize,
    pub best_num: usize,
    /// Seconds spent generating offspring
    pub reproduction_secs: f64,
    /// Seconds spent evaluating and ranking
    pub ranking_secs: f64,
}

/// Receiver of per-generation timings
pub trait GenerationSink {
    fn record(&mut self, timing: &GenerationTiming);

    /// Flush and release resources; called once when the run ends
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl GenerationSink for NullSink {
    fn record(&mut self, _timing: &GenerationTiming) {}
}

/// Keeps every record in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<GenerationTiming>,
    pub finished: bool,
}

impl GenerationSink for MemorySink {
    fn record(&mut self, timing: &GenerationTiming) {
        self.records.push(timing.clone());
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes records as CSV rows
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    error: Option<csv::Error>,
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W, write_header: bool) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(writer);
        CsvSink { writer, error: None }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

impl CsvSink<File> {
    /// Append to `<dir>/generation_<rank>.csv`, writing the header only for a new file
    pub fn append_for_rank<P: AsRef<Path>>(dir: P, rank: usize) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let path = Self::path_for_rank(dir, rank);
        let is_new = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self::from_writer(file, is_new))
    }

    pub fn path_for_rank<P: AsRef<Path>>(dir: P, rank: usize) -> PathBuf {
        dir.as_ref().join(format!("generation_{}.csv", rank))
    }
}

impl<W: Write> GenerationSink for CsvSink<W> {
    fn record(&mut self, timing: &GenerationTiming) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.serialize(timing) {
            log::warn!("timing record dropped: {}", e);
            self.error = Some(e);
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
        }
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(generation: usize) -> GenerationTiming {
        GenerationTiming {
            rank: 2,
            generation,
            num_nodes: 10,
            population_size: 50,
            best_num: 10,
            reproduction_secs: 0.5,
            ranking_secs: 0.25,
        }
    }

    #[test]
    fn test_csv_sink_writes_rows() {
        let mut sink = CsvSink::from_writer(Vec::new(), true);
        sink.record(&timing(1));
        sink.record(&timing(2));
        sink.finish().unwrap();

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rank,generation,num_nodes"));
        assert_eq!(lines[1], "2,1,10,50,10,0.5,0.25");
    }

    #[test]
    fn test_append_for_rank_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();

        for _ in 0..2 {
            let mut sink = CsvSink::append_for_rank(dir.path(), 3).unwrap();
            sink.record(&timing(1));
            sink.finish().unwrap();
        }

        let text = fs::read_to_string(CsvSink::path_for_rank(dir.path(), 3)).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.lines().filter(|l| l.starts_with("rank")).count(), 1);
    }
}
