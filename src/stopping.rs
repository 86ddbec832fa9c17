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

//! Energy loss transforms for one (ion, material) pair
//!
//! [`StoppingPower`] bundles a stopping power table with its cumulative
//! range table. The range picture turns both transform directions into a
//! pair of interpolations: an ion entering at E and leaving at E′ satisfies
//! range(E) − range(E′) = thickness, so every transform is a walk along the
//! range axis.

use crate::interp::interp1d;
use crate::table::{table_path, StoppingTable, TableFormat};
use crate::Error;
use log::debug;
use std::path::Path;

/// Energy loss model for one ion travelling through one material.
///
/// Owns the stopping power table and its derived cumulative range table.
/// Immutable once constructed and all-owned data, so sharing it read-only
/// across threads is fine.
#[derive(Clone, Debug)]
pub struct StoppingPower {
    /// Ion identifier, e.g. "He"
    ion: String,
    /// Material identifier, e.g. "mylar"
    material: String,
    /// Tabulated stopping power
    table: StoppingTable,
    /// Cumulative range aligned with the table rows, thickness units
    range: Vec<f64>,
}

impl StoppingPower {
    /// Builds the model from an existing table by deriving its range table.
    /// Fails if the table holds a non-positive stopping power.
    pub fn new(
        ion: impl Into<String>,
        material: impl Into<String>,
        table: StoppingTable,
    ) -> Result<Self, Error> {
        let range = table.cumulative_range()?;
        Ok(Self {
            ion: ion.into(),
            material: material.into(),
            table,
            range,
        })
    }

    /// Loads the `<ion>_in_<material>` table from the conventional location
    /// under `dir` (see [`table_path`]) and builds the model.
    pub fn from_table_dir(
        dir: &Path,
        ion: &str,
        material: &str,
        format: TableFormat,
    ) -> Result<Self, Error> {
        debug!(
            "loading {ion} in {material} stopping power table from {}",
            dir.display()
        );
        let table = StoppingTable::from_path(&table_path(dir, ion, material), format)?;
        Self::new(ion, material, table)
    }

    /// Ion identifier
    pub fn ion(&self) -> &str {
        &self.ion
    }

    /// Material identifier
    pub fn material(&self) -> &str {
        &self.material
    }

    /// The underlying stopping power table
    pub fn table(&self) -> &StoppingTable {
        &self.table
    }

    /// Cumulative range per table row, thickness units
    pub fn range_table(&self) -> &[f64] {
        &self.range
    }

    /// Projected range of an ion of the given energy (MeV) in the table's
    /// thickness unit. Fails with [`Error::OutOfRange`] outside the
    /// tabulated energies.
    pub fn range(&self, energy: f64) -> Result<f64, Error> {
        interp1d(self.table.energies(), &self.range, energy)
    }

    /// Energy left after crossing a degrader of the given thickness, or
    /// `0.0` when the ion ranges out inside it.
    ///
    /// An ion whose projected range does not exceed `thickness` is fully
    /// absorbed. Absorption is a physical outcome, not an error; the error
    /// channel stays reserved for energies outside the table.
    ///
    /// Examples:
    /// ~~~
    /// use degrader::stopping::StoppingPower;
    /// use degrader::table::StoppingTable;
    /// let table = StoppingTable::from_columns(vec![1.0, 2.0], vec![2.0, 2.0]);
    /// let model = StoppingPower::new("He", "mylar", table).unwrap();
    /// assert_eq!(model.energy_out(2.0, 250.0).unwrap(), 1.5);
    /// assert_eq!(model.energy_out(2.0, 500.0).unwrap(), 0.0); // ranged out
    /// ~~~
    pub fn energy_out(&self, energy_in: f64, thickness: f64) -> Result<f64, Error> {
        let range_in = self.range(energy_in)?;
        if range_in <= thickness {
            debug!(
                "{} MeV {} ranged out in {} (range {} <= thickness {})",
                energy_in, self.ion, self.material, range_in, thickness
            );
            return Ok(0.0);
        }
        interp1d(&self.range, self.table.energies(), range_in - thickness)
    }

    /// Energy an ion must enter with to leave a degrader of the given
    /// thickness at `energy_out`.
    ///
    /// The inverse of [`energy_out`](StoppingPower::energy_out). No
    /// absorption case exists in this direction; an implied entry energy
    /// beyond the table fails with [`Error::OutOfRange`].
    pub fn energy_in(&self, energy_out: f64, thickness: f64) -> Result<f64, Error> {
        let range_out = self.range(energy_out)?;
        interp1d(&self.range, self.table.energies(), range_out + thickness)
    }

    /// Degrader thickness that takes an ion from `energy_in` down to
    /// `energy_out`, as the difference of the two projected ranges.
    pub fn thickness(&self, energy_in: f64, energy_out: f64) -> Result<f64, Error> {
        Ok(self.range(energy_in)? - self.range(energy_out)?)
    }
}
