//! Record to grid processing.
//!
//! Each satellite is retrieved, decoded, segmented, and smoothed independently and in
//! parallel. Once every satellite is complete the results are joined and bucketed into a
//! single [HourGrid].
use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, error, info, span, Level};
use typed_builder::TypedBuilder;

use crate::record::{records, Record, Summary};
use crate::{segment, smooth, DayWalk, HourGrid, Result, Retriever, Satellite, SatelliteTrack, Source};

/// Decode, segment, and smooth all the sources for a single satellite.
///
/// Sources that fail to decode are logged and dropped in their entirety without
/// affecting the other sources. Sources for other satellites are ignored.
#[must_use]
pub fn process_track(satellite: Satellite, sources: &[Source]) -> SatelliteTrack {
    let mut samples = Vec::default();
    for source in sources.iter().filter(|s| s.satellite == satellite) {
        let mut summary = Summary::default();
        let mut decoded = Vec::default();
        let zult: Result<()> = records(satellite, source.text.as_bytes()).try_for_each(|record| {
            let record = record?;
            summary.add(&record);
            if let Record::Sample(sample) = record {
                decoded.push(sample);
            }
            Ok(())
        });
        match zult {
            Ok(()) => {
                debug!(
                    %satellite,
                    day = %source.day,
                    lines = summary.lines,
                    ignored = summary.ignored,
                    rejected = summary.rejected,
                    samples = summary.samples,
                    "decoded source"
                );
                samples.extend(decoded);
            }
            Err(err) => error!(%satellite, day = %source.day, "dropping source: {err}"),
        }
    }

    let passes = segment(samples).into_iter().map(smooth).collect();
    SatelliteTrack { satellite, passes }
}

/// Process already retrieved sources in parallel on the global rayon pool.
///
/// Sources are grouped by satellite; satellites without sources do not contribute.
#[must_use]
pub fn process_sources(sources: Vec<Source>) -> HourGrid {
    let mut by_satellite: BTreeMap<Satellite, Vec<Source>> = BTreeMap::default();
    for source in sources {
        by_satellite.entry(source.satellite).or_default().push(source);
    }

    let tracks: Vec<SatelliteTrack> = by_satellite
        .into_par_iter()
        .map(|(satellite, sources)| process_track(satellite, &sources))
        .collect();

    HourGrid::build(tracks)
}

/// Retrieves files for each satellite and processes them into an [HourGrid].
///
/// # Example
/// ```no_run
/// use aurora::{CacheDir, Pipeline};
/// use chrono::NaiveDate;
///
/// let grid = Pipeline::builder()
///     .retriever(Box::new(CacheDir::new("poes")))
///     .start_day(NaiveDate::from_ymd_opt(2012, 4, 22).unwrap())
///     .build()
///     .run()
///     .unwrap();
/// for hour in 0..aurora::HOURS {
///     println!("{hour}: {} passes", grid.hour(hour).count());
/// }
/// ```
#[derive(TypedBuilder)]
pub struct Pipeline {
    /// Source of the daily record files.
    retriever: Box<dyn Retriever>,
    /// The most recent day to retrieve; earlier days are tried if necessary.
    start_day: NaiveDate,
    /// Number of daily files wanted per satellite.
    #[builder(default = DayWalk::DEFAULT_WANTED)]
    wanted_files: usize,
    /// Maximum number of days tried per satellite.
    #[builder(default = DayWalk::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: usize,
    /// Number of worker threads. 0 lets rayon decide.
    #[builder(default)]
    num_threads: usize,
    /// Satellites to process.
    #[builder(default = Satellite::ALL.to_vec())]
    satellites: Vec<Satellite>,
}

impl Pipeline {
    #[must_use]
    pub fn day_walk(&self) -> DayWalk {
        DayWalk::new(self.start_day)
            .with_wanted(self.wanted_files)
            .with_max_attempts(self.max_attempts)
    }

    /// Retrieve and process every satellite to a [SatelliteTrack], in satellite order.
    /// Satellites listed more than once are processed once.
    ///
    /// # Errors
    /// [Error::ThreadPool](crate::Error::ThreadPool) if the worker pool cannot be
    /// created.
    pub fn tracks(&self) -> Result<Vec<SatelliteTrack>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("aurora::satellite{i}"))
            .num_threads(self.num_threads)
            .build()?;

        let mut satellites = self.satellites.clone();
        satellites.sort();
        satellites.dedup();

        let walk = self.day_walk();
        let retriever = self.retriever.as_ref();
        let mut tracks: Vec<SatelliteTrack> = pool.install(|| {
            satellites
                .par_iter()
                .map(|satellite| {
                    let span = span!(Level::DEBUG, "satellite", %satellite);
                    let _enter = span.enter();

                    let sources = walk.collect(retriever, *satellite);
                    let track = process_track(*satellite, &sources);
                    info!(
                        %satellite,
                        files = sources.len(),
                        passes = track.passes.len(),
                        "processed"
                    );
                    track
                })
                .collect()
        });
        tracks.sort_by_key(|t| t.satellite);
        Ok(tracks)
    }

    /// Run the complete pipeline.
    ///
    /// # Errors
    /// See [Pipeline::tracks].
    pub fn run(&self) -> Result<HourGrid> {
        let grid = HourGrid::build(self.tracks()?);
        match grid.reference_day() {
            Some(day) => info!(reference_day = %day.date_naive(), passes = grid.num_passes(), "grid complete"),
            None => info!("no samples retrieved; grid is empty"),
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheDir;

    fn data_line(time: &str, hour: u8, lat: f64, ted: f64) -> String {
        let mut fields: Vec<String> = time.split(' ').map(String::from).collect();
        fields.resize(38, "0".to_string());
        fields[3] = format!("{hour:02}");
        fields[7] = lat.to_string();
        fields[8] = "120.0".to_string();
        fields[37] = ted.to_string();
        fields.join(" ")
    }

    fn source(satellite: Satellite, day: NaiveDate, lines: &[String]) -> Source {
        Source {
            satellite,
            day,
            text: lines.join("\n"),
        }
    }

    #[test]
    fn bad_source_does_not_poison_others() {
        let day = NaiveDate::from_ymd_opt(2012, 4, 22).unwrap();
        let good = source(
            Satellite::Noaa16,
            day,
            &[
                data_line("2012 04 22 03 00 00", 3, 60.0, 10.0),
                data_line("2012 04 22 03 00 32", 3, 61.0, 30.0),
            ],
        );
        let bad = source(
            Satellite::Noaa16,
            day.pred_opt().unwrap(),
            &[
                data_line("2012 04 21 03 00 00", 3, 60.0, 10.0),
                data_line("2012 04 21 03 99 00", 3, 61.0, 30.0),
            ],
        );

        let track = process_track(Satellite::Noaa16, &[good, bad]);
        assert_eq!(track.passes.len(), 1);
        assert_eq!(track.passes[0].len(), 2);
        assert_eq!(track.passes[0].first().avg_intensity(), 20.0);
    }

    #[test]
    fn sources_for_other_satellites_ignored() {
        let day = NaiveDate::from_ymd_opt(2012, 4, 22).unwrap();
        let other = source(
            Satellite::Noaa17,
            day,
            &[data_line("2012 04 22 03 00 00", 3, 60.0, 10.0)],
        );
        assert!(process_track(Satellite::Noaa16, &[other]).is_empty());
    }

    #[test]
    fn empty_cache_runs_to_empty_grid() {
        let tmpdir = tempfile::tempdir().unwrap();
        let grid = Pipeline::builder()
            .retriever(Box::new(CacheDir::new(tmpdir.path())))
            .start_day(NaiveDate::from_ymd_opt(2012, 4, 22).unwrap())
            .num_threads(2)
            .build()
            .run()
            .unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.reference_day(), None);
    }

    #[test]
    fn tracks_are_in_satellite_order() {
        let tmpdir = tempfile::tempdir().unwrap();
        let tracks = Pipeline::builder()
            .retriever(Box::new(CacheDir::new(tmpdir.path())))
            .start_day(NaiveDate::from_ymd_opt(2012, 4, 22).unwrap())
            .satellites(vec![Satellite::Noaa19, Satellite::Metop02, Satellite::Noaa15])
            .build()
            .tracks()
            .unwrap();
        let sats: Vec<Satellite> = tracks.iter().map(|t| t.satellite).collect();
        assert_eq!(
            sats,
            vec![Satellite::Metop02, Satellite::Noaa15, Satellite::Noaa19]
        );
    }

    #[test]
    fn duplicate_satellites_processed_once() {
        let tmpdir = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2012, 4, 22).unwrap();
        let cache = CacheDir::new(tmpdir.path());
        let text = [
            data_line("2012 04 22 03 00 00", 3, 60.0, 10.0),
            data_line("2012 04 22 03 00 32", 3, 61.0, 30.0),
        ]
        .join("\n");
        cache.store(Satellite::Noaa19, day, text.as_bytes()).unwrap();

        let pipeline = Pipeline::builder()
            .retriever(Box::new(cache))
            .start_day(day)
            .satellites(vec![Satellite::Noaa19, Satellite::Noaa19])
            .build();
        assert_eq!(pipeline.tracks().unwrap().len(), 1);

        let grid = pipeline.run().unwrap();
        assert_eq!(grid.num_passes(), 1);
        assert_eq!(grid.hour(3).count(), 1);
    }
}
