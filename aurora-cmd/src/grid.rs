use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use aurora::output::{hour_file_name, write_grid};
use aurora::{CacheDir, HttpRetriever, Pipeline, Retriever, HOURS};
use chrono::{NaiveDate, Utc};
use tracing::info;

pub struct Opts {
    pub cache_dir: PathBuf,
    pub output: PathBuf,
    pub date: Option<NaiveDate>,
    pub offline: bool,
    pub base_url: String,
    pub wanted_files: usize,
    pub max_attempts: usize,
    pub threads: usize,
    pub clobber: bool,
}

/// Hour files in `output` that already exist.
fn existing_outputs(output: &std::path::Path) -> Vec<PathBuf> {
    (0..HOURS)
        .map(|hour| output.join(hour_file_name(hour)))
        .filter(|path| path.exists())
        .collect()
}

pub fn grid(opts: &Opts) -> Result<()> {
    let existing = existing_outputs(&opts.output);
    if !opts.clobber && !existing.is_empty() {
        bail!("{:?} exists; use --clobber", existing[0]);
    }

    let cache = CacheDir::new(&opts.cache_dir);
    let retriever: Box<dyn Retriever> = if opts.offline {
        info!("using cached files in {:?}", cache.root());
        Box::new(cache)
    } else {
        Box::new(
            HttpRetriever::new(cache)
                .context("creating http client")?
                .with_base_url(&opts.base_url),
        )
    };

    let start_day = opts.date.unwrap_or_else(|| Utc::now().date_naive());
    info!("building grid for {start_day}");
    let grid = Pipeline::builder()
        .retriever(retriever)
        .start_day(start_day)
        .wanted_files(opts.wanted_files)
        .max_attempts(opts.max_attempts)
        .num_threads(opts.threads)
        .build()
        .run()
        .context("running pipeline")?;

    for hour in 0..HOURS {
        let passes = grid.hour(hour).count();
        if passes > 0 {
            info!(hour, passes, "bucketed");
        }
    }

    let paths = write_grid(&opts.output, &grid)
        .with_context(|| format!("writing hour files to {:?}", opts.output))?;
    info!("wrote {} hour files to {:?}", paths.len(), opts.output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(cache_dir: PathBuf, output: PathBuf, clobber: bool) -> Opts {
        Opts {
            cache_dir,
            output,
            date: NaiveDate::from_ymd_opt(2012, 4, 22),
            offline: true,
            base_url: HttpRetriever::DEFAULT_BASE_URL.to_string(),
            wanted_files: 2,
            max_attempts: 5,
            threads: 1,
            clobber,
        }
    }

    #[test]
    fn writes_then_refuses_to_clobber() {
        let tmpdir = tempfile::tempdir().unwrap();
        let cache = tmpdir.path().join("cache");
        let output = tmpdir.path().join("out");

        grid(&opts(cache.clone(), output.clone(), false)).unwrap();
        assert_eq!(existing_outputs(&output).len(), HOURS);

        assert!(grid(&opts(cache.clone(), output.clone(), false)).is_err());
        grid(&opts(cache, output, true)).unwrap();
    }
}
