//! Reference day selection and hour bucketing of smoothed passes.
//!
//! All passes are owned by a single [HourGrid] arena; each hour bucket is a list of
//! indexes into that arena, so a pass spanning several hours is stored once.
use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{Pass, Satellite, SmoothedSample};

/// Number of hour buckets.
pub const HOURS: usize = 24;

/// The smoothed passes for a single satellite, oldest first.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SatelliteTrack {
    pub satellite: Satellite,
    pub passes: Vec<Pass<SmoothedSample>>,
}

impl SatelliteTrack {
    #[must_use]
    pub fn new(satellite: Satellite) -> Self {
        SatelliteTrack {
            satellite,
            passes: Vec::default(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

/// Select the reference day: the first sample of the last pass of the first satellite,
/// in [Satellite] declaration order, that has any passes, truncated to midnight UTC.
///
/// `tracks` may be in any order. Returns `None` if no satellite has passes.
#[must_use]
pub fn reference_day(tracks: &[SatelliteTrack]) -> Option<DateTime<Utc>> {
    tracks
        .iter()
        .filter(|t| !t.is_empty())
        .min_by_key(|t| t.satellite)
        .and_then(|t| t.passes.last())
        .map(|pass| {
            pass.first()
                .sample()
                .timestamp()
                .date_naive()
                .and_time(NaiveTime::MIN)
                .and_utc()
        })
}

/// Passes assigned to each of the 24 record hours.
#[derive(Debug, Clone, Default)]
pub struct HourGrid {
    reference_day: Option<DateTime<Utc>>,
    passes: Vec<(Satellite, Pass<SmoothedSample>)>,
    hours: [Vec<usize>; HOURS],
}

impl HourGrid {
    /// Bucket the passes of all `tracks` relative to their [reference_day].
    ///
    /// Satellites are visited in declaration order and each satellite's passes from most
    /// recent to oldest, which is the order passes appear in each bucket. A pass is kept
    /// if either its first or last sample is at or after the reference day, and is added
    /// to every hour in its [Pass::coverage]. Passes whose coverage crosses midnight
    /// have an empty coverage and land in no bucket. Passes that land in no bucket are
    /// not retained.
    #[must_use]
    pub fn build(mut tracks: Vec<SatelliteTrack>) -> Self {
        let mut grid = HourGrid {
            reference_day: reference_day(&tracks),
            ..Default::default()
        };
        let Some(day) = grid.reference_day else {
            debug!("no passes; grid is empty");
            return grid;
        };

        tracks.sort_by_key(|t| t.satellite);
        for track in tracks {
            let satellite = track.satellite;
            for pass in track.passes.into_iter().rev() {
                let touches = pass.first().sample().timestamp() >= day
                    || pass.last().sample().timestamp() >= day;
                if !touches {
                    continue;
                }
                let coverage = pass.coverage();
                if coverage.is_empty() {
                    debug!(
                        %satellite,
                        start = pass.first().sample().record_hour(),
                        end = pass.last().sample().record_hour(),
                        "pass crosses midnight; not bucketed"
                    );
                    continue;
                }
                let idx = grid.passes.len();
                for hour in coverage {
                    if let Some(bucket) = grid.hours.get_mut(usize::from(hour)) {
                        bucket.push(idx);
                    }
                }
                grid.passes.push((satellite, pass));
            }
        }

        debug!(
            reference_day = %day,
            passes = grid.passes.len(),
            "built hour grid"
        );
        grid
    }

    #[must_use]
    pub fn reference_day(&self) -> Option<DateTime<Utc>> {
        self.reference_day
    }

    /// Number of distinct passes in all buckets.
    #[must_use]
    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// The passes for `hour`, in bucketing order. Empty for hours outside 0..24.
    pub fn hour(&self, hour: usize) -> impl Iterator<Item = &Pass<SmoothedSample>> + '_ {
        self.hour_with_satellite(hour).map(|(_, pass)| pass)
    }

    /// Like [HourGrid::hour], with the satellite each pass came from.
    pub fn hour_with_satellite(
        &self,
        hour: usize,
    ) -> impl Iterator<Item = (Satellite, &Pass<SmoothedSample>)> + '_ {
        self.hours
            .get(hour)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|idx| {
                let (sat, pass) = &self.passes[*idx];
                (*sat, pass)
            })
    }
}
