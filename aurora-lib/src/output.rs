//! Writing hour grids as plain text for the renderer.
//!
//! Each hour is written to its own file, `<hour>.txt`, starting with [HEADER] followed by
//! one `<sslat> <sslong> <fill>` line per sample of every pass in the hour's bucket.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{HourGrid, Pass, Result, SmoothedSample, HOURS};

pub const HEADER: &str = "# sslat sslong fill_ted";

/// File name for an hour's output.
#[must_use]
pub fn hour_file_name(hour: usize) -> String {
    format!("{hour}.txt")
}

/// Format a single sample line. Values always include a fractional part, e.g., `3.0`,
/// and an undefined fill value is written as `NaN`.
#[must_use]
pub fn format_sample(sample: &SmoothedSample) -> String {
    format!(
        "{:?} {:?} {:?}",
        sample.sample().sub_latitude(),
        sample.sample().sub_longitude(),
        sample.fill_value()
    )
}

/// Write the header and every sample of `passes` to `writer`.
///
/// # Errors
/// Any I/O error writing.
pub fn write_hour<'a, W, I>(mut writer: W, passes: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Pass<SmoothedSample>>,
{
    writeln!(writer, "{HEADER}")?;
    let mut count = 0;
    for pass in passes {
        for sample in pass.samples() {
            writeln!(writer, "{}", format_sample(sample))?;
            count += 1;
        }
    }
    writer.flush()?;
    Ok(count)
}

/// Write all 24 hour files into `dir`, creating it if necessary. Every file is
/// written, even when its bucket is empty.
///
/// Returns the paths written, in hour order.
///
/// # Errors
/// Any I/O error creating `dir` or writing files.
pub fn write_grid<P: AsRef<Path>>(dir: P, grid: &HourGrid) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(HOURS);
    for hour in 0..HOURS {
        let path = dir.join(hour_file_name(hour));
        let writer = BufWriter::new(File::create(&path)?);
        let count = write_hour(writer, grid.hour(hour))?;
        debug!(hour, samples = count, ?path, "wrote hour");
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{smooth, Sample, Satellite};

    fn smoothed(points: &[(f64, f64, f64)]) -> Pass<SmoothedSample> {
        let t0 = Utc.with_ymd_and_hms(2012, 4, 22, 5, 0, 0).unwrap();
        let samples = points
            .iter()
            .map(|(lat, lon, ted)| Sample::new(Satellite::Noaa18, t0, 5, *lat, *lon, *ted).unwrap())
            .collect();
        smooth(Pass::new(samples).unwrap())
    }

    #[test]
    fn sample_format() {
        let pass = smoothed(&[(65.5, -147.25, 20.0)]);
        assert_eq!(format_sample(pass.first()), "65.5 -147.25 3.0");

        let pass = smoothed(&[(70.0, 10.0, -5.0)]);
        assert_eq!(format_sample(pass.first()), "70.0 10.0 NaN");
    }

    #[test]
    fn write_hour_header_then_samples() {
        let a = smoothed(&[(60.0, 1.0, 10.0), (61.0, 2.0, 30.0)]);
        let b = smoothed(&[(62.0, 3.0, 1.0)]);

        let mut buf = Vec::default();
        let count = write_hour(&mut buf, [&a, &b]).unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "# sslat sslong fill_ted\n60.0 1.0 3.0\n61.0 2.0 3.0\n62.0 3.0 0.0\n"
        );
    }

    #[test]
    fn write_empty_hour() {
        let mut buf = Vec::default();
        let count = write_hour(&mut buf, std::iter::empty()).unwrap();
        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{HEADER}\n"));
    }

    #[test]
    fn empty_grid_writes_all_hours() {
        let tmpdir = tempfile::tempdir().unwrap();
        let out = tmpdir.path().join("grid");
        let paths = write_grid(&out, &HourGrid::default()).unwrap();

        assert_eq!(paths.len(), HOURS);
        assert_eq!(paths[0], out.join("0.txt"));
        assert_eq!(paths[23], out.join("23.txt"));
        for path in paths {
            assert_eq!(fs::read_to_string(path).unwrap(), format!("{HEADER}\n"));
        }
    }
}
