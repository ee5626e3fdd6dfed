#![doc = include_str!("../README.md")]

mod error;

pub mod grid;
pub mod output;
pub mod pass;
pub mod pipeline;
pub mod record;
pub mod retrieve;
pub mod satellite;
pub mod smooth;

pub use error::{Error, Result};
pub use grid::{reference_day, HourGrid, SatelliteTrack, HOURS};
pub use pass::{segment, Pass};
pub use pipeline::{process_sources, process_track, Pipeline};
pub use record::{decode_samples, Sample};
pub use retrieve::{CacheDir, DayWalk, Retriever, Source};
pub use satellite::Satellite;
pub use smooth::{smooth, SmoothedSample};

#[cfg(feature = "download")]
pub use retrieve::HttpRetriever;
