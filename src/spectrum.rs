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

//! Propagation of energy spectra through a degrader
//!
//! A measured spectrum is a histogram of particle yields over uniformly
//! spaced energy bins. Pushing it through a degrader warps the energy axis
//! nonlinearly, so yields are redistributed with the bin widths: each bin
//! keeps its particle count while its width changes, which scales the yield
//! by dE_in/dE_out. Bins that range out inside the material transmit
//! nothing.

use crate::stopping::StoppingPower;
use crate::Error;
use itertools::{izip, Itertools};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transmitted energies below this (MeV) count as fully stopped; stopping
/// power sources do not tabulate below ~5 keV.
const STOPPED_THRESHOLD: f64 = 0.005;

/// Stands in for the width of a bin whose lower edge collapsed onto the
/// absorption boundary, keeping the yield ratio finite.
const ZERO_BIN_GUARD: f64 = 1e10;

/// An energy histogram: centered, uniformly spaced energy bins paired with
/// per-bin particle yields.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct EnergySpectrum {
    /// Bin centers, MeV
    energies: Vec<f64>,
    /// Particle yield per bin
    yields: Vec<f64>,
}

impl EnergySpectrum {
    /// Creates a spectrum from bin centers (MeV) and their yields.
    ///
    /// # Panics
    ///
    /// Panics if the sequences differ in length or hold fewer than two bins.
    ///
    /// Examples:
    /// ~~~
    /// use degrader::spectrum::EnergySpectrum;
    /// let spectrum = EnergySpectrum::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 5.0]);
    /// assert_eq!(spectrum.total_yield(), 35.0);
    /// ~~~
    pub fn new(energies: Vec<f64>, yields: Vec<f64>) -> Self {
        assert_eq!(energies.len(), yields.len(), "bin and yield lengths differ");
        assert!(energies.len() >= 2, "a spectrum needs at least two bins");
        Self { energies, yields }
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// True if the spectrum holds no bins
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Bin centers, MeV
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Yield per bin
    pub fn yields(&self) -> &[f64] {
        &self.yields
    }

    /// Summed yield over all bins
    pub fn total_yield(&self) -> f64 {
        self.yields.iter().sum()
    }
}

impl StoppingPower {
    /// Propagates a spectrum through a degrader of the given thickness.
    ///
    /// Bin edges are reconstructed from the centers, every edge is pushed
    /// through [`energy_out`](StoppingPower::energy_out), and yields are
    /// rescaled by the ratio of old to new bin width. Edges that range out,
    /// that fall below the tabulated energies, or that come out under 5 keV
    /// collapse to 0; a bin whose edges both collapse transmits nothing,
    /// and a bin straddling the absorption boundary keeps a vanishing yield
    /// via a guard width instead of dividing by a near-zero width. Edges
    /// beyond the top of the table fail with [`Error::OutOfRange`].
    ///
    /// Total yield is conserved bin by bin while nothing is absorbed, and
    /// strictly decreases when bins range out.
    ///
    /// Examples:
    /// ~~~
    /// use degrader::spectrum::EnergySpectrum;
    /// use degrader::stopping::StoppingPower;
    /// use degrader::table::StoppingTable;
    ///
    /// // Constant stopping power: the degrader shifts every bin down by 1 MeV
    /// let energies = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// let table = StoppingTable::from_columns(energies, vec![2.0; 6]);
    /// let model = StoppingPower::new("He", "mylar", table).unwrap();
    ///
    /// let spectrum = EnergySpectrum::new(vec![3.0, 4.0, 5.0], vec![10.0, 20.0, 30.0]);
    /// let transmitted = model.transmitted_spectrum(&spectrum, 500.0).unwrap();
    /// assert_eq!(transmitted.energies(), &[2.0, 3.0, 4.0]);
    /// assert_eq!(transmitted.yields(), &[10.0, 20.0, 30.0]);
    /// ~~~
    pub fn transmitted_spectrum(
        &self,
        spectrum: &EnergySpectrum,
        thickness: f64,
    ) -> Result<EnergySpectrum, Error> {
        let edges_in = edges_from_centers(spectrum.energies());
        let mut edges_out = Vec::with_capacity(edges_in.len());
        for &edge in &edges_in {
            // below the table an ion cannot get through anything
            let out = if edge < self.table().min_energy() {
                0.0
            } else {
                self.energy_out(edge, thickness)?
            };
            edges_out.push(if out < STOPPED_THRESHOLD { 0.0 } else { out });
        }

        let widths_in = guarded_diff(&edges_in);
        let widths_out = guarded_diff(&edges_out);
        let yields = izip!(spectrum.yields(), &widths_in, &widths_out)
            .map(|(yield_in, din, dout)| {
                if *dout == 0.0 {
                    0.0
                } else {
                    yield_in * din / dout
                }
            })
            .collect();
        Ok(EnergySpectrum::new(centers_from_edges(&edges_out), yields))
    }

    /// Reconstructs the spectrum in front of the degrader from one measured
    /// behind it, the inverse of
    /// [`transmitted_spectrum`](StoppingPower::transmitted_spectrum).
    ///
    /// Every edge goes through [`energy_in`](StoppingPower::energy_in), so
    /// no absorption can occur; a measured bin implying an entry energy
    /// beyond the table fails with [`Error::OutOfRange`].
    pub fn incident_spectrum(
        &self,
        spectrum: &EnergySpectrum,
        thickness: f64,
    ) -> Result<EnergySpectrum, Error> {
        let edges_out = edges_from_centers(spectrum.energies());
        let edges_in = edges_out
            .iter()
            .map(|&edge| self.energy_in(edge, thickness))
            .collect::<Result<Vec<_>, _>>()?;

        let widths_out = diff(&edges_out);
        let widths_in = diff(&edges_in);
        let yields = izip!(spectrum.yields(), &widths_out, &widths_in)
            .map(|(yield_out, dout, din)| yield_out * dout / din)
            .collect();
        Ok(EnergySpectrum::new(centers_from_edges(&edges_in), yields))
    }
}

/// Bin edges around uniformly spaced centers, one more edge than centers.
/// The spacing is taken from the first two centers.
fn edges_from_centers(centers: &[f64]) -> Vec<f64> {
    let half_dx = 0.5 * (centers[1] - centers[0]);
    let mut edges = Vec::with_capacity(centers.len() + 1);
    edges.push(centers[0] - half_dx);
    edges.extend(centers.iter().map(|center| center + half_dx));
    edges
}

/// Bin centers between edges, one fewer center than edges. The spacing is
/// taken from the first two edges.
fn centers_from_edges(edges: &[f64]) -> Vec<f64> {
    let half_dx = 0.5 * (edges[1] - edges[0]);
    edges[..edges.len() - 1]
        .iter()
        .map(|edge| edge + half_dx)
        .collect()
}

/// Pairwise differences
fn diff(values: &[f64]) -> Vec<f64> {
    values.iter().tuple_windows().map(|(a, b)| b - a).collect()
}

/// Pairwise differences with the absorption guard: a zero lower edge under
/// a live upper edge yields [`ZERO_BIN_GUARD`] instead of the raw width.
fn guarded_diff(edges: &[f64]) -> Vec<f64> {
    edges
        .iter()
        .tuple_windows()
        .map(|(lower, upper)| {
            if *lower == 0.0 && *upper != 0.0 {
                ZERO_BIN_GUARD
            } else {
                upper - lower
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::StoppingTable;
    use approx::assert_relative_eq;

    /// 1 to 10 MeV with constant stopping power 2: range(E) = 500·(E − 1)
    fn model() -> StoppingPower {
        let energies: Vec<f64> = (1..=10).map(f64::from).collect();
        let stopping = vec![2.0; energies.len()];
        StoppingPower::new("He", "mylar", StoppingTable::from_columns(energies, stopping))
            .unwrap()
    }

    // --- bin conversions ---

    #[test]
    fn test_edges_from_centers() {
        assert_eq!(
            edges_from_centers(&[1.0, 2.0, 3.0]),
            vec![0.5, 1.5, 2.5, 3.5]
        );
    }

    #[test]
    fn test_centers_from_edges() {
        assert_eq!(
            centers_from_edges(&[0.5, 1.5, 2.5, 3.5]),
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_edge_center_round_trip() {
        let centers = [2.0, 2.5, 3.0, 3.5];
        let edges = edges_from_centers(&centers);
        assert_eq!(centers_from_edges(&edges), centers);
    }

    #[test]
    fn test_plain_diff() {
        assert_eq!(diff(&[0.0, 1.0, 3.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_guarded_diff_flags_absorption_boundary() {
        // A zero lower edge under a live upper edge takes the guard width
        assert_eq!(
            guarded_diff(&[0.0, 0.0, 1.0, 3.0]),
            vec![0.0, ZERO_BIN_GUARD, 2.0]
        );
    }

    // --- propagation ---

    #[test]
    fn test_translation_preserves_yields() {
        // Constant stopping power shifts all bins equally, so bin widths
        // and therefore yields survive unchanged
        let model = model();
        let spectrum =
            EnergySpectrum::new(vec![4.0, 5.0, 6.0, 7.0], vec![5.0, 7.0, 11.0, 13.0]);
        let out = model.transmitted_spectrum(&spectrum, 1000.0).unwrap();
        assert_eq!(out.energies(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out.yields(), spectrum.yields());
        assert_eq!(out.total_yield(), spectrum.total_yield());
    }

    #[test]
    fn test_absorbed_bins_transmit_nothing() {
        let model = model();
        let spectrum = EnergySpectrum::new(vec![2.0, 3.0, 4.0], vec![10.0, 10.0, 10.0]);
        // Edges 1.5 and 2.5 MeV range out inside 750 units (250 and 750),
        // edge 3.5 survives at 2 MeV and edge 4.5 at 3 MeV
        let out = model.transmitted_spectrum(&spectrum, 750.0).unwrap();
        assert_eq!(out.energies(), &[0.0, 0.0, 2.0]);
        // Fully absorbed bin transmits nothing
        assert_eq!(out.yields()[0], 0.0);
        // Bin straddling the absorption boundary keeps a vanishing yield
        assert_relative_eq!(out.yields()[1], 1e-9);
        // Fully transmitted bin keeps its count
        assert_eq!(out.yields()[2], 10.0);
        assert!(out.total_yield() < spectrum.total_yield());
    }

    #[test]
    fn test_edges_below_table_count_as_stopped() {
        // Both edges of the first bin sit below the 1 MeV table start
        let model = model();
        let spectrum = EnergySpectrum::new(vec![0.2, 1.2], vec![6.0, 6.0]);
        let out = model.transmitted_spectrum(&spectrum, 50.0).unwrap();
        assert_eq!(out.yields()[0], 0.0);
        assert!(out.yields()[1] < 1e-8);
        assert!(out.total_yield() < spectrum.total_yield());
    }

    #[test]
    fn test_stopped_threshold_clamps_to_zero() {
        // The table reaches below 5 keV, and 598 units leave the lowest
        // edge at 4 keV, under the stopped threshold
        let table = StoppingTable::from_columns(vec![0.001, 1.0, 2.0], vec![2.0, 2.0, 2.0]);
        let model = StoppingPower::new("He", "mylar", table).unwrap();
        let spectrum = EnergySpectrum::new(vec![1.4, 1.8], vec![10.0, 10.0]);
        let out = model.transmitted_spectrum(&spectrum, 598.0).unwrap();
        // Without the clamp the first bin would keep its full yield
        assert!(out.yields()[0] < 1e-8);
        assert_relative_eq!(out.yields()[1], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transmitted_rejects_edges_beyond_table() {
        let model = model();
        // Upper edge at 10.5 MeV exceeds the 10 MeV table top
        let spectrum = EnergySpectrum::new(vec![9.0, 10.0], vec![1.0, 1.0]);
        assert!(matches!(
            model.transmitted_spectrum(&spectrum, 100.0),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_incident_inverts_transmitted() {
        let model = model();
        let measured = EnergySpectrum::new(vec![4.0, 5.0, 6.0], vec![3.0, 5.0, 8.0]);
        let transmitted = model.transmitted_spectrum(&measured, 1000.0).unwrap();
        let recovered = model.incident_spectrum(&transmitted, 1000.0).unwrap();
        for (a, b) in recovered.energies().iter().zip(measured.energies()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
        for (a, b) in recovered.yields().iter().zip(measured.yields()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_incident_rejects_bins_beyond_table() {
        let model = model();
        // 2500 units upstream of 8 MeV implies more than 10 MeV of entry
        let spectrum = EnergySpectrum::new(vec![7.0, 8.0], vec![1.0, 1.0]);
        assert!(matches!(
            model.incident_spectrum(&spectrum, 2500.0),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "lengths differ")]
    fn test_spectrum_needs_aligned_columns() {
        let _ = EnergySpectrum::new(vec![1.0, 2.0], vec![1.0]);
    }
}
