// Copyright 2024 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Stopping power tables: location, parsing, and range integration
//!
//! Table resources are whitespace-delimited text with a fixed header and one
//! row per tabulated energy: energy (keV), electronic stopping power, and
//! nuclear stopping power. [`StoppingTable`] stores energies in MeV and the
//! summed stopping power, and integrates the cumulative
//! [range table](StoppingTable::cumulative_range) consumed by
//! [`StoppingPower`](crate::stopping::StoppingPower).

use crate::{Error, KEV_PER_MEV};
use itertools::Itertools;
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Layout of a stopping power table resource
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TableFormat {
    /// Number of leading header lines to skip (default: 4)
    pub header_lines: usize,
    /// Maximum number of data rows to read (default: 1000)
    pub max_rows: usize,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            header_lines: 4,
            max_rows: 1000,
        }
    }
}

impl TableFormat {
    /// Set the number of header lines to skip
    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    /// Set the maximum number of data rows to read
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }
}

/// Resolves the conventional table location for an (ion, material) pair,
/// `<dir>/Tables/<ion>_in_<material>`.
///
/// Examples:
/// ~~~
/// use degrader::table::table_path;
/// use std::path::Path;
/// let path = table_path(Path::new("/data"), "He", "mylar");
/// assert_eq!(path, Path::new("/data/Tables/He_in_mylar"));
/// ~~~
pub fn table_path(dir: &Path, ion: &str, material: &str) -> PathBuf {
    dir.join("Tables").join(format!("{ion}_in_{material}"))
}

/// Tabulated total stopping power versus energy for one (ion, material) pair.
///
/// Energies are in MeV and assumed strictly increasing; the source data is
/// trusted on this, the loader does not enforce it. The stopping power is
/// the sum of the electronic and nuclear contributions, in MeV per thickness
/// unit, and that thickness unit is shared by every `thickness` argument in
/// the crate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct StoppingTable {
    /// Tabulated energies, MeV
    energy: Vec<f64>,
    /// Total stopping power at each energy, MeV per thickness unit
    stopping_power: Vec<f64>,
}

impl StoppingTable {
    /// Creates a table directly from parallel energy (MeV) and total
    /// stopping power columns.
    ///
    /// # Panics
    ///
    /// Panics if the columns differ in length or hold fewer than two rows.
    ///
    /// Examples:
    /// ~~~
    /// use degrader::table::StoppingTable;
    /// let table = StoppingTable::from_columns(vec![1.0, 2.0], vec![2.0, 2.0]);
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.max_energy(), 2.0);
    /// ~~~
    pub fn from_columns(energy: Vec<f64>, stopping_power: Vec<f64>) -> Self {
        assert_eq!(energy.len(), stopping_power.len(), "column lengths differ");
        assert!(energy.len() >= 2, "a table needs at least two rows");
        Self {
            energy,
            stopping_power,
        }
    }

    /// Parses table text: `format.header_lines` leading lines are skipped,
    /// then every non-empty line must tokenize into exactly three
    /// whitespace-delimited numbers, energy (keV), electronic stopping
    /// power, and nuclear stopping power. Stored energies are converted to
    /// MeV and the two stopping power components are summed.
    ///
    /// A row that fails to tokenize fails the whole parse with
    /// [`Error::MalformedRow`] rather than passing garbage downstream.
    /// Reading stops at `format.max_rows` rows with a warning if data
    /// remains, and fewer than two usable rows is [`Error::TableTooShort`].
    ///
    /// Examples:
    /// ~~~
    /// use degrader::table::{StoppingTable, TableFormat};
    ///
    /// let text = "\
    /// He in mylar, SRIM-2013
    /// units: keV and MeV per mm
    /// -------------------------
    ///  energy  electronic  nuclear
    /// 1000.0  1.5   0.5
    /// 2000.0  1.25  0.25
    /// ";
    /// let table = StoppingTable::parse(text, TableFormat::default()).unwrap();
    /// assert_eq!(table.energies(), &[1.0, 2.0]);
    /// assert_eq!(table.stopping_powers(), &[2.0, 1.5]);
    /// ~~~
    pub fn parse(text: &str, format: TableFormat) -> Result<Self, Error> {
        let mut energy = Vec::new();
        let mut stopping_power = Vec::new();

        for (index, line) in text.lines().enumerate().skip(format.header_lines) {
            if line.trim().is_empty() {
                continue;
            }
            if energy.len() == format.max_rows {
                warn!(
                    "table truncated at {} rows, data remains on line {}",
                    format.max_rows,
                    index + 1
                );
                break;
            }
            let (energy_kev, electronic, nuclear) = parse_row(line, index + 1)?;
            energy.push(energy_kev / KEV_PER_MEV);
            stopping_power.push(electronic + nuclear);
        }

        if energy.len() < 2 {
            return Err(Error::TableTooShort { rows: energy.len() });
        }
        debug!(
            "parsed {} stopping power rows covering {} to {} MeV",
            energy.len(),
            energy[0],
            energy[energy.len() - 1]
        );
        Ok(Self {
            energy,
            stopping_power,
        })
    }

    /// Reads and parses a table file. An unreadable path fails with
    /// [`Error::TableNotFound`]; parsing follows [`StoppingTable::parse`].
    pub fn from_path(path: &Path, format: TableFormat) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::TableNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, format)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    /// True if the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// Tabulated energies, MeV
    pub fn energies(&self) -> &[f64] {
        &self.energy
    }

    /// Total stopping power per row, MeV per thickness unit
    pub fn stopping_powers(&self) -> &[f64] {
        &self.stopping_power
    }

    /// Lowest tabulated energy, MeV
    pub fn min_energy(&self) -> f64 {
        self.energy[0]
    }

    /// Highest tabulated energy, MeV
    pub fn max_energy(&self) -> f64 {
        self.energy[self.energy.len() - 1]
    }

    /// Integrates the reciprocal stopping power into a cumulative range
    /// table aligned with the energy column: `range[0] = 0` and each step
    /// adds the trapezoid `½(1/sp[i] + 1/sp[i-1])·(E[i] - E[i-1])·1000`,
    /// where the factor [`KEV_PER_MEV`] scales MeV·(unit/MeV) into the
    /// table's native thickness unit.
    ///
    /// Fails with [`Error::NonPositiveStopping`] if any stopping power is
    /// not strictly positive, which would poison the reciprocal.
    ///
    /// Examples:
    /// ~~~
    /// use degrader::table::StoppingTable;
    /// let table = StoppingTable::from_columns(vec![1.0, 2.0], vec![2.0, 2.0]);
    /// assert_eq!(table.cumulative_range().unwrap(), vec![0.0, 500.0]);
    /// ~~~
    pub fn cumulative_range(&self) -> Result<Vec<f64>, Error> {
        if let Some((index, &value)) = self
            .stopping_power
            .iter()
            .enumerate()
            .find(|(_, s)| !(**s > 0.0))
        {
            return Err(Error::NonPositiveStopping { index, value });
        }

        let mut range = Vec::with_capacity(self.len());
        range.push(0.0);
        let mut total = 0.0;
        for ((e0, s0), (e1, s1)) in self.energy.iter().zip(&self.stopping_power).tuple_windows() {
            total += 0.5 * (s0.recip() + s1.recip()) * (e1 - e0) * KEV_PER_MEV;
            range.push(total);
        }
        Ok(range)
    }
}

/// Tokenizes one data row into (energy_kev, electronic, nuclear)
fn parse_row(line: &str, line_number: usize) -> Result<(f64, f64, f64), Error> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let malformed = || Error::MalformedRow {
        line: line_number,
        content: line.trim().to_string(),
    };
    if let [energy, electronic, nuclear] = fields[..] {
        Ok((
            energy.parse().map_err(|_| malformed())?,
            electronic.parse().map_err(|_| malformed())?,
            nuclear.parse().map_err(|_| malformed())?,
        ))
    } else {
        Err(malformed())
    }
}
