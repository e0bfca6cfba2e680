//! CSV result sink
//!
//! One row per evaluated point:
//!
//! ```text
//! id, lat, lon, ExposedAtAllInAnyDirection,
//! {Dir}ExposedAtAll, {Dir}HighlyExposed, {Dir}ExposureRate   (x 8 directions)
//! ```
//!
//! Directions follow the fixed sector order South, Southwest, West,
//! Northwest, North, Northeast, East, Southeast. Booleans are written as
//! `1`/`0`. An unavailable result writes `NA` in every exposure column so it
//! can never be mistaken for an unexposed point.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::warn;
use coastview_algorithms::classification::Sector;
use coastview_algorithms::exposure::{ExposureOutcome, ExposureResult};
use coastview_core::PropertyPoint;
use crate::error::{BatchError, Result};

/// Marker written for unavailable values
pub const NOT_AVAILABLE: &str = "NA";

/// Exposure columns following `id, lat, lon`
pub const EXPOSURE_COLUMNS: usize = 1 + 3 * 8;

/// Column names of the output file
pub fn header() -> Vec<String> {
    let mut columns: Vec<String> = ["id", "lat", "lon", "ExposedAtAllInAnyDirection"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    for sector in Sector::ALL {
        columns.push(format!("{}ExposedAtAll", sector));
        columns.push(format!("{}HighlyExposed", sector));
        columns.push(format!("{}ExposureRate", sector));
    }
    columns
}

fn flag(b: bool) -> String {
    if b { "1" } else { "0" }.to_string()
}

fn coordinate(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Output fields for one evaluated point
pub fn record(point: &PropertyPoint, result: &ExposureResult) -> Vec<String> {
    let mut fields = vec![
        point.id.to_string(),
        coordinate(point.lat),
        coordinate(point.lon),
    ];
    match &result.outcome {
        ExposureOutcome::Computed(exposure) => {
            fields.push(flag(exposure.exposed_at_all_overall));
            for (_, stats) in exposure.iter() {
                fields.push(flag(stats.exposed_at_all));
                fields.push(flag(stats.highly_exposed));
                fields.push(stats.exposure_rate.to_string());
            }
        }
        ExposureOutcome::Unavailable { .. } => {
            fields.extend(std::iter::repeat(NOT_AVAILABLE.to_string()).take(EXPOSURE_COLUMNS));
        }
    }
    fields
}

/// Appends result rows to a CSV destination
pub struct ResultSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl ResultSink<std::fs::File> {
    /// Open `path` for appending. The header is written only when the file
    /// is missing or empty.
    ///
    /// A final row without its newline is the trace of an interrupted write
    /// and is cut off, so the next row starts on a line of its own.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().create(true).read(true).append(true).open(path)?;
        let len = file.metadata()?.len();
        let complete = complete_len(&mut file, len)?;
        if complete < len {
            warn!(path = %path.display(), bytes = len - complete, "dropping torn output row");
            file.set_len(complete)?;
            file.sync_data()?;
        }
        Self::new(file, complete == 0)
    }
}

/// Length of `file` up to and including its last newline
fn complete_len(file: &mut File, len: u64) -> Result<u64> {
    const BLOCK: u64 = 8192;
    let mut end = len;
    let mut buf = vec![0_u8; BLOCK as usize];
    while end > 0 {
        let start = end.saturating_sub(BLOCK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

impl<W: Write> ResultSink<W> {
    pub fn new(inner: W, write_header: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        if write_header {
            writer.write_record(header())?;
            writer.flush()?;
        }
        Ok(Self { writer, rows: 0 })
    }

    /// Write and flush one row
    pub fn write(&mut self, point: &PropertyPoint, result: &ExposureResult) -> Result<()> {
        if point.id != result.id {
            return Err(BatchError::InvalidInput(format!(
                "result for point {} written as point {}",
                result.id, point.id
            )));
        }
        self.writer.write_record(record(point, result))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written through this sink
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| BatchError::Io(e.into_error()))
    }
}
