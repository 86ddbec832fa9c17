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

//! # Degrader
//!
//! A library for calculating the mean energy loss of ions passing through
//! degrader materials, using tabulated stopping powers such as those
//! produced by SRIM.
//!
//! A [`stopping::StoppingPower`] model is built from the stopping power
//! table of one (ion, material) pair. On construction the table is
//! integrated into a cumulative range table; energies can then be
//! transformed across a degrader of given thickness in either direction,
//! and whole energy spectra can be propagated bin by bin.
//!
//! Examples:
//! ~~~
//! use degrader::stopping::StoppingPower;
//! use degrader::table::StoppingTable;
//!
//! // Two-point table: 1 and 2 MeV with a constant total stopping power
//! let table = StoppingTable::from_columns(vec![1.0, 2.0], vec![2.0, 2.0]);
//! let helium = StoppingPower::new("He", "mylar", table).unwrap();
//!
//! // Projected range grows linearly when the stopping power is constant
//! assert_eq!(helium.range(2.0).unwrap(), 500.0);
//!
//! // A 250 unit degrader takes a 2 MeV ion down to 1.5 MeV
//! assert_eq!(helium.energy_out(2.0, 250.0).unwrap(), 1.5);
//! ~~~

#[cfg(test)]
extern crate approx;

use std::path::PathBuf;
use thiserror::Error;

pub mod interp;
pub mod spectrum;
pub mod stopping;
pub mod table;

/// Number of keV in one MeV.
///
/// Table energies are divided by this on load (sources tabulate keV) and the
/// range integral is multiplied by it, keeping the two unit conversions
/// consistent by construction.
///
/// Examples:
/// ~~~
/// use degrader::KEV_PER_MEV;
/// let energy_kev = 5500.0; // alpha from ²⁴¹Am decay
/// assert_eq!(energy_kev / KEV_PER_MEV, 5.5); // in MeV
/// ~~~
pub const KEV_PER_MEV: f64 = 1000.0;

/// Errors from table loading, interpolation, and energy-loss transforms.
///
/// Full absorption of a particle is deliberately *not* an error: transforms
/// report it as a zero output energy, see
/// [`stopping::StoppingPower::energy_out`].
#[derive(Debug, Error)]
pub enum Error {
    /// The stopping power table could not be located or read
    #[error("cannot read stopping power table {}: {source}", .path.display())]
    TableNotFound { path: PathBuf, source: std::io::Error },

    /// A table row did not tokenize into three numeric fields
    #[error("malformed table row at line {line}: {content:?}")]
    MalformedRow { line: usize, content: String },

    /// Fewer than two usable rows survived parsing
    #[error("stopping power table has {rows} usable row(s), need at least two")]
    TableTooShort { rows: usize },

    /// Interpolation query outside the tabulated domain
    #[error("value {value} is outside the tabulated domain [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    /// Range integration encountered a stopping power that is not strictly positive
    #[error("non-positive stopping power {value} at table row {index}")]
    NonPositiveStopping { index: usize, value: f64 },
}
