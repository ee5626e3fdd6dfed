//! The POES satellites whose averaged SEM-2 records feed the grid.
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A satellite carrying a Total Energy Detector.
///
/// Declaration order is significant: it is the order in which satellites are
/// processed, considered for the reference day, and accumulated into hour buckets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Satellite {
    Metop02,
    Noaa15,
    Noaa16,
    Noaa17,
    Noaa18,
    Noaa19,
}

impl Satellite {
    /// All satellites in declaration order.
    pub const ALL: [Satellite; 6] = [
        Satellite::Metop02,
        Satellite::Noaa15,
        Satellite::Noaa16,
        Satellite::Noaa17,
        Satellite::Noaa18,
        Satellite::Noaa19,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Satellite::Metop02 => "metop02",
            Satellite::Noaa15 => "noaa15",
            Satellite::Noaa16 => "noaa16",
            Satellite::Noaa17 => "noaa17",
            Satellite::Noaa18 => "noaa18",
            Satellite::Noaa19 => "noaa19",
        }
    }

    /// Archive directory and file name prefix, e.g., `noaa19/poes_n19_`.
    #[must_use]
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Satellite::Metop02 => "metop02/poes_m02_",
            Satellite::Noaa15 => "noaa15/poes_n15_",
            Satellite::Noaa16 => "noaa16/poes_n16_",
            Satellite::Noaa17 => "noaa17/poes_n17_",
            Satellite::Noaa18 => "noaa18/poes_n18_",
            Satellite::Noaa19 => "noaa19/poes_n19_",
        }
    }

    /// Relative path of the daily averaged file for `day`, i.e.,
    /// `<yyyy>/<prefix><yyyymmdd>.txt`. Used both as the archive URL suffix and as the
    /// cache path.
    #[must_use]
    pub fn file_name(&self, day: NaiveDate) -> String {
        format!(
            "{}/{}{}.txt",
            day.format("%Y"),
            self.file_prefix(),
            day.format("%Y%m%d")
        )
    }
}

impl Display for Satellite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Satellite {
    type Err = Error;

    /// Accepts the full name (`noaa19`) or the short archive code (`n19`, `m02`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Satellite::ALL
            .into_iter()
            .find(|sat| {
                let code = sat
                    .file_prefix()
                    .rsplit('_')
                    .nth(1)
                    .unwrap_or_default();
                wanted == sat.name() || wanted == code
            })
            .ok_or_else(|| Error::UnknownSatellite(s.to_string()))
    }
}
