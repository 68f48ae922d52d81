//! Observers that write a run to disk or to the log.

use colony_core::{Result, TickSummary};
use colony_world::{Grid, RunReport, TickObserver};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Appends one JSON line per tick
pub struct TraceRecorder {
    writer: BufWriter<File>,
    path: PathBuf,
    lines: u64,
}

impl TraceRecorder {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        debug!(path = %path.display(), "Trace file opened");
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            lines: 0,
        })
    }
}

impl TickObserver for TraceRecorder {
    fn observe(&mut self, _grid: &Grid, summary: &TickSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, summary)?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn finish(&mut self, _report: &RunReport) -> Result<()> {
        self.writer.flush()?;
        debug!(path = %self.path.display(), lines = self.lines, "Trace flushed");
        Ok(())
    }
}

/// Dumps a bincode [`colony_world::GridSnapshot`] every `every` ticks, named by day
pub struct SnapshotWriter {
    dir: PathBuf,
    every: u64,
    written: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, every: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            every,
            written: 0,
        }
    }

    pub fn path_for_day(&self, day: u64) -> PathBuf {
        self.dir.join(format!("{day:08}.bin"))
    }
}

impl TickObserver for SnapshotWriter {
    fn observe(&mut self, grid: &Grid, summary: &TickSummary) -> Result<()> {
        if self.every == 0 || summary.tick % self.every != 0 {
            return Ok(());
        }
        let bytes = grid.snapshot().to_bytes()?;
        std::fs::write(self.path_for_day(summary.day), bytes)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self, _report: &RunReport) -> Result<()> {
        debug!(dir = %self.dir.display(), written = self.written, "Snapshots written");
        Ok(())
    }
}

/// Logs a progress line every `every` ticks
pub struct ProgressLogger {
    every: u64,
}

impl ProgressLogger {
    pub fn new(every: u64) -> Self {
        Self { every }
    }
}

impl TickObserver for ProgressLogger {
    fn observe(&mut self, _grid: &Grid, summary: &TickSummary) -> Result<()> {
        if self.every == 0 || summary.tick % self.every != 0 {
            return Ok(());
        }
        info!(
            event = "progress",
            tick = summary.tick,
            day = summary.day,
            light = format!("{:.3}", summary.light),
            occupied = summary.occupied_cells,
            families = summary.live_families,
            newborns = summary.live_newborns,
            births = summary.births,
            deaths = summary.deaths,
            "Tick {}: {} cells occupied by {} families",
            summary.tick,
            summary.occupied_cells,
            summary.live_families
        );
        Ok(())
    }
}
