use std::fs;
use std::io::{stdout, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use aurora::record::{records, Record, Summary};
use aurora::{segment, smooth, Satellite};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FileInfo {
    filename: String,
    summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
struct PassInfo {
    first: DateTime<Utc>,
    last: DateTime<Utc>,
    first_hour: u8,
    last_hour: u8,
    /// Crosses midnight so it covers no hours.
    wraps: bool,
    samples: usize,
    /// Samples with a defined fill value.
    filled: usize,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    satellite: Satellite,
    files: Vec<FileInfo>,
    summary: Summary,
    passes: Vec<PassInfo>,
}

fn summarize(satellite: Satellite, inputs: &[PathBuf]) -> Result<Info> {
    let mut files = Vec::default();
    let mut total = Summary::default();
    let mut samples = Vec::default();

    for path in inputs {
        // decoded the same way as cached downloads
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let text = String::from_utf8_lossy(&data);
        let mut summary = Summary::default();
        for record in records(satellite, text.as_bytes()) {
            let record = record.with_context(|| format!("decoding {}", path.display()))?;
            summary.add(&record);
            total.add(&record);
            if let Record::Sample(sample) = record {
                samples.push(sample);
            }
        }
        debug!(?path, samples = summary.samples, "decoded");
        files.push(FileInfo {
            filename: path.to_string_lossy().to_string(),
            summary,
        });
    }

    let passes = segment(samples)
        .into_iter()
        .map(smooth)
        .map(|pass| PassInfo {
            first: pass.first().sample().timestamp(),
            last: pass.last().sample().timestamp(),
            first_hour: *pass.coverage().start(),
            last_hour: *pass.coverage().end(),
            wraps: pass.coverage().is_empty(),
            samples: pass.len(),
            filled: pass.samples().iter().filter(|s| s.has_fill()).count(),
        })
        .collect();

    Ok(Info {
        satellite,
        files,
        summary: total,
        passes,
    })
}

pub fn info(satellite: Satellite, inputs: &[PathBuf], format: &Format) -> Result<()> {
    let info = summarize(satellite, inputs)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info)?;
            stdout()
                .write_all(data.as_bytes())
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ satellite }}
===============================================================================
{{ #each files }}{{ filename }}
    lines={{ summary.lines }} ignored={{ summary.ignored }} rejected={{ summary.rejected }} samples={{ summary.samples }}
{{ /each }}
Lines:    {{ summary.lines }}
Ignored:  {{ summary.ignored }}
Rejected: {{ summary.rejected }}
Samples:  {{ summary.samples }}
-------------------------------------------------------------------------------
First                  Last                   Hours     Samples  Filled
-------------------------------------------------------------------------------
{{ #each passes }}{{ first }}  {{ last }}  {{ first_hour }}-{{ last_hour }}{{ #if wraps }} wrap{{ /if }}  {{ samples }}  {{ filled }}
{{ /each }}";

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn data_line(time: &str, hour: u8, lat: f64, ted: f64) -> String {
        let mut fields: Vec<String> = time.split(' ').map(String::from).collect();
        fields.resize(38, "0".to_string());
        fields[3] = format!("{hour:02}");
        fields[7] = lat.to_string();
        fields[8] = "120.0".to_string();
        fields[37] = ted.to_string();
        fields.join(" ")
    }

    fn write_input(dir: &Path) -> PathBuf {
        let path = dir.join("poes_n18_20120422.txt");
        let lines = [
            "# header".to_string(),
            data_line("2012 04 22 23 55 00", 23, 60.0, 10.0),
            data_line("2012 04 22 23 55 32", 23, 20.0, 10.0),
            data_line("2012 04 22 02 00 00", 2, 61.0, -999.0),
            data_line("2012 04 22 02 00 32", 2, 62.0, 30.0),
            data_line("2012 04 23 00 02 00", 0, 63.0, 50.0),
        ];
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn summarize_counts_and_passes() {
        let tmpdir = tempfile::tempdir().unwrap();
        let input = write_input(tmpdir.path());

        let info = summarize(Satellite::Noaa18, &[input]).unwrap();

        assert_eq!(info.files.len(), 1);
        assert_eq!(
            info.summary,
            Summary {
                lines: 6,
                ignored: 1,
                rejected: 2,
                samples: 3,
            }
        );
        assert_eq!(info.passes.len(), 2);
        assert_eq!(info.passes[0].samples, 1);
        assert_eq!(info.passes[0].first_hour, 2);
        assert!(!info.passes[0].wraps);
        assert_eq!(info.passes[1].samples, 2);
        assert!(info.passes[1].wraps);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("poes_n18_20120422.txt");
        let mut data = b"# header \xff\xfe\n".to_vec();
        data.extend_from_slice(data_line("2012 04 22 02 00 32", 2, 62.0, 30.0).as_bytes());
        fs::write(&path, data).unwrap();

        let info = summarize(Satellite::Noaa18, &[path]).unwrap();

        assert_eq!(info.summary.lines, 2);
        assert_eq!(info.summary.ignored, 1);
        assert_eq!(info.summary.samples, 1);
    }

    #[test]
    fn missing_input_is_an_error() {
        let tmpdir = tempfile::tempdir().unwrap();
        let missing = tmpdir.path().join("nope.txt");
        assert!(summarize(Satellite::Noaa18, &[missing]).is_err());
    }

    #[test]
    fn text_includes_passes() {
        let tmpdir = tempfile::tempdir().unwrap();
        let input = write_input(tmpdir.path());
        let info = summarize(Satellite::Noaa18, &[input]).unwrap();

        let text = render_text(&info).unwrap();

        assert!(text.starts_with("noaa18\n"), "{text}");
        assert!(text.contains("Samples:  3"), "{text}");
        assert!(text.contains("23-0 wrap"), "{text}");
    }
}
