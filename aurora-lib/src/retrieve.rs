//! Retrieval of daily averaged record files.
//!
//! A [Retriever] provides the raw text of a satellite's file for a single day, if it is
//! available. [DayWalk] decides which days to ask for.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

use crate::{Result, Satellite};

/// Provides the raw record text for a satellite and day.
pub trait Retriever: Send + Sync {
    /// Returns `Ok(None)` if there is no file for `day`.
    ///
    /// # Errors
    /// Any error retrieving a file that may exist.
    fn retrieve(&self, satellite: Satellite, day: NaiveDate) -> Result<Option<String>>;
}

/// Raw record text retrieved for a satellite and day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub satellite: Satellite,
    pub day: NaiveDate,
    pub text: String,
}

/// Walks backwards one day at a time from a start day until enough files have been
/// retrieved or the attempt limit is reached.
#[derive(Debug, Clone, Copy)]
pub struct DayWalk {
    start: NaiveDate,
    wanted: usize,
    max_attempts: usize,
}

impl DayWalk {
    pub const DEFAULT_WANTED: usize = 2;
    pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

    #[must_use]
    pub fn new(start: NaiveDate) -> Self {
        DayWalk {
            start,
            wanted: Self::DEFAULT_WANTED,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Stop once this many files have been retrieved.
    #[must_use]
    pub fn with_wanted(mut self, wanted: usize) -> Self {
        self.wanted = wanted;
        self
    }

    /// Try at most this many days.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The days that may be attempted, most recent first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.max_attempts as u64).map_while(move |n| start.checked_sub_days(Days::new(n)))
    }

    /// Retrieve up to `wanted` sources for `satellite`, most recent first.
    ///
    /// Retrieval errors are logged and treated the same as a missing day.
    pub fn collect<R: Retriever + ?Sized>(&self, retriever: &R, satellite: Satellite) -> Vec<Source> {
        let mut sources = Vec::default();
        for day in self.days() {
            if sources.len() >= self.wanted {
                break;
            }
            match retriever.retrieve(satellite, day) {
                Ok(Some(text)) => {
                    debug!(%satellite, %day, bytes = text.len(), "retrieved");
                    sources.push(Source {
                        satellite,
                        day,
                        text,
                    });
                }
                Ok(None) => debug!(%satellite, %day, "no file"),
                Err(err) => warn!(%satellite, %day, "retrieval failed: {err}"),
            }
        }
        sources
    }
}

/// Reads files previously stored in a local directory laid out like the archive, i.e.,
/// `<root>/<yyyy>/<sat>/<prefix><yyyymmdd>.txt`.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        CacheDir {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path for the file of `satellite` on `day`.
    #[must_use]
    pub fn path(&self, satellite: Satellite, day: NaiveDate) -> PathBuf {
        self.root.join(satellite.file_name(day))
    }

    /// Store `data` as the file for `satellite` on `day`, creating directories as
    /// necessary.
    ///
    /// # Errors
    /// Any I/O error creating directories or writing the file.
    pub fn store(&self, satellite: Satellite, day: NaiveDate, data: &[u8]) -> Result<PathBuf> {
        let path = self.path(satellite, day);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(path)
    }
}

impl Retriever for CacheDir {
    fn retrieve(&self, satellite: Satellite, day: NaiveDate) -> Result<Option<String>> {
        let path = self.path(satellite, day);
        match fs::read(&path) {
            Ok(data) => {
                debug!(?path, "cache hit");
                Ok(Some(String::from_utf8_lossy(&data).into_owned()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Downloads files from the POES archive, storing them in a [CacheDir]. Files already
/// in the cache are not downloaded again.
#[cfg(feature = "download")]
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    cache: CacheDir,
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "download")]
impl HttpRetriever {
    pub const DEFAULT_BASE_URL: &'static str = "http://satdat.ngdc.noaa.gov/sem/poes/data/avg/txt/";
    const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);
    /// Limit on the whole request, including reading the body.
    const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(150);

    /// # Errors
    /// If the HTTP client cannot be constructed.
    pub fn new(cache: CacheDir) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .timeout(Self::REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(HttpRetriever {
            cache,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Base URL the satellite file names are appended to. A trailing `/` is added if
    /// missing.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        self
    }

    #[must_use]
    pub fn url(&self, satellite: Satellite, day: NaiveDate) -> String {
        format!("{}{}", self.base_url, satellite.file_name(day))
    }
}

#[cfg(feature = "download")]
impl Retriever for HttpRetriever {
    fn retrieve(&self, satellite: Satellite, day: NaiveDate) -> Result<Option<String>> {
        if let Some(text) = self.cache.retrieve(satellite, day)? {
            return Ok(Some(text));
        }

        let url = self.url(satellite, day);
        info!("{url}");
        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            warn!(%status, "{url}");
            return Ok(None);
        }
        let body = resp.bytes()?;
        let path = self.cache.store(satellite, day, &body)?;
        debug!(?path, bytes = body.len(), "cached");

        Ok(Some(String::from_utf8_lossy(&body).into_owned()))
    }
}
