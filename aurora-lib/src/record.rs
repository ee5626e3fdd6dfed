//! Decoding of POES SEM-2 averaged text records.
//!
//! Each data line of a daily averaged file is a run of space separated fields beginning
//! with the date and time of the record. Header and comment lines are mixed in and are
//! expected, so any line that does not look like a data record is ignored rather than
//! treated as an error.
use std::io::BufRead;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::trace;

use crate::{Error, Result, Satellite, HOURS};

/// Minimum number of fields in a data record.
pub const MIN_FIELDS: usize = 38;
/// Raw intensities at or below this are fill or otherwise non-physical.
pub const INTENSITY_FLOOR: f64 = -990.0;
/// Only records north of this sub-satellite latitude are kept.
pub const LATITUDE_FLOOR: f64 = 30.0;

const FIELD_HOUR: usize = 3;
const FIELD_LATITUDE: usize = 7;
const FIELD_LONGITUDE: usize = 8;
const FIELD_TED: usize = 37;

/// One validated Total Energy Detector reading.
///
/// A `Sample` only exists for readings with a raw intensity above [INTENSITY_FLOOR], a
/// sub-satellite latitude above [LATITUDE_FLOOR], and a record hour in `0..24`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Sample {
    satellite: Satellite,
    timestamp: DateTime<Utc>,
    record_hour: u8,
    sub_latitude: f64,
    sub_longitude: f64,
    raw_intensity: f64,
}

impl Sample {
    /// Construct a sample, returning `None` if the reading does not pass the validity
    /// filter or `record_hour` is not an hour of the day.
    #[must_use]
    pub fn new(
        satellite: Satellite,
        timestamp: DateTime<Utc>,
        record_hour: u8,
        sub_latitude: f64,
        sub_longitude: f64,
        raw_intensity: f64,
    ) -> Option<Self> {
        if usize::from(record_hour) < HOURS
            && raw_intensity > INTENSITY_FLOOR
            && sub_latitude > LATITUDE_FLOOR
        {
            Some(Sample {
                satellite,
                timestamp,
                record_hour,
                sub_latitude,
                sub_longitude,
                raw_intensity,
            })
        } else {
            None
        }
    }

    #[must_use]
    pub fn satellite(&self) -> Satellite {
        self.satellite
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The hour field as written in the record. This is used for hour bucketing and is
    /// not derived from [Sample::timestamp].
    #[must_use]
    pub fn record_hour(&self) -> u8 {
        self.record_hour
    }

    #[must_use]
    pub fn sub_latitude(&self) -> f64 {
        self.sub_latitude
    }

    #[must_use]
    pub fn sub_longitude(&self) -> f64 {
        self.sub_longitude
    }

    #[must_use]
    pub fn raw_intensity(&self) -> f64 {
        self.raw_intensity
    }
}

impl AsRef<Sample> for Sample {
    fn as_ref(&self) -> &Sample {
        self
    }
}

/// The disposition of a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Not a data record, e.g., a header or comment line.
    Ignored,
    /// A data record that failed the validity filter.
    Rejected,
    Sample(Sample),
}

/// Line counts for a single decoded source.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub lines: usize,
    pub ignored: usize,
    pub rejected: usize,
    pub samples: usize,
}

impl Summary {
    pub fn add(&mut self, record: &Record) {
        self.lines += 1;
        match record {
            Record::Ignored => self.ignored += 1,
            Record::Rejected => self.rejected += 1,
            Record::Sample(_) => self.samples += 1,
        }
    }
}

/// Split on runs of spaces. A leading run produces an empty first field, trailing runs
/// produce nothing.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(64);
    if line.starts_with(' ') {
        fields.push("");
    }
    fields.extend(line.split(' ').filter(|f| !f.is_empty()));
    fields
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], field: usize, line: usize) -> Result<T> {
    fields[field].parse::<T>().map_err(|_| Error::Field {
        line,
        field,
        value: fields[field].to_string(),
    })
}

fn parse_timestamp(fields: &[&str], line: usize) -> Result<DateTime<Utc>> {
    let invalid = || Error::Timestamp {
        line,
        value: fields[..6].join(" "),
    };
    let mut parts = [0u32; 5];
    let year = fields[0].parse::<i32>().map_err(|_| invalid())?;
    for (i, part) in parts.iter_mut().enumerate() {
        *part = fields[i + 1].parse::<u32>().map_err(|_| invalid())?;
    }
    let [month, day, hour, minute, second] = parts;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| dt.and_utc())
        .ok_or_else(invalid)
}

/// Decode a single line. `line` is the 1-based line number used for error reporting.
///
/// # Errors
/// [Error::Timestamp] if a data record's date/time fields are not a valid time, or
/// [Error::Field] if the hour, latitude, longitude, or intensity fields are not numbers.
/// Either error means the source the line came from should not be trusted.
pub fn decode_record(satellite: Satellite, text: &str, line: usize) -> Result<Record> {
    let fields = split_fields(text);
    let is_data = fields.len() >= MIN_FIELDS
        && fields[0].chars().next().is_some_and(|c| c.is_ascii_digit());
    if !is_data {
        trace!(line, fields = fields.len(), "ignoring non-data line");
        return Ok(Record::Ignored);
    }

    let timestamp = parse_timestamp(&fields, line)?;
    let record_hour: u8 = parse_field(&fields, FIELD_HOUR, line)?;
    let sub_latitude: f64 = parse_field(&fields, FIELD_LATITUDE, line)?;
    let sub_longitude: f64 = parse_field(&fields, FIELD_LONGITUDE, line)?;
    let raw_intensity: f64 = parse_field(&fields, FIELD_TED, line)?;

    Ok(Sample::new(
        satellite,
        timestamp,
        record_hour,
        sub_latitude,
        sub_longitude,
        raw_intensity,
    )
    .map_or(Record::Rejected, Record::Sample))
}

/// Returns an iterator of [Record]s for each line in `reader`.
///
/// Iteration should stop at the first error; the remainder of the source is suspect.
pub fn records<R: BufRead>(satellite: Satellite, reader: R) -> impl Iterator<Item = Result<Record>> {
    reader.lines().enumerate().map(move |(idx, text)| {
        let text = text?;
        decode_record(satellite, &text, idx + 1)
    })
}

/// Decode all the valid samples in `reader`, in source order.
///
/// # Errors
/// The first error from [decode_record], or any I/O error reading lines.
pub fn decode_samples<R: BufRead>(satellite: Satellite, reader: R) -> Result<Vec<Sample>> {
    let mut samples = Vec::default();
    for record in records(satellite, reader) {
        if let Record::Sample(sample) = record? {
            samples.push(sample);
        }
    }
    Ok(samples)
}
