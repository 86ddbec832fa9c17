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

//! Piecewise-linear interpolation on monotonic grids
//!
//! Every lookup in the crate goes through [`interp1d`]: energy to range,
//! range to energy, and the per-edge transforms of spectrum propagation.

use crate::Error;
use num::Float;

/// Piecewise-linear interpolation of `ys` over the monotonically increasing
/// grid `xs`, evaluated at `x`.
///
/// Queries that hit a grid node return the tabulated ordinate untouched;
/// queries between nodes interpolate linearly between the bracketing pair.
/// Queries outside `[xs[0], xs[last]]` (NaN included) fail with
/// [`Error::OutOfRange`], so a legitimate negative ordinate can never be
/// mistaken for an error condition.
///
/// # Panics
///
/// Panics if the slices differ in length or hold fewer than two points.
///
/// Examples:
/// ~~~
/// use degrader::interp::interp1d;
/// let xs = [0.0, 1.0, 3.0];
/// let ys = [0.0, 10.0, 30.0];
/// assert_eq!(interp1d(&xs, &ys, 0.5).unwrap(), 5.0);
/// assert_eq!(interp1d(&xs, &ys, 1.0).unwrap(), 10.0);
/// assert!(interp1d(&xs, &ys, 3.5).is_err());
/// ~~~
pub fn interp1d<T: Float>(xs: &[T], ys: &[T], x: T) -> Result<T, Error> {
    assert_eq!(xs.len(), ys.len(), "grid and ordinate lengths differ");
    assert!(xs.len() >= 2, "interpolation needs at least two points");

    let (min, max) = (xs[0], xs[xs.len() - 1]);
    if !(x >= min && x <= max) {
        return Err(Error::OutOfRange {
            value: x.to_f64().unwrap_or(f64::NAN),
            min: min.to_f64().unwrap_or(f64::NAN),
            max: max.to_f64().unwrap_or(f64::NAN),
        });
    }

    // largest i with xs[i] <= x, clamped so that i + 1 stays in bounds
    let i = (xs.partition_point(|&v| v <= x) - 1).min(xs.len() - 2);
    if x == xs[i] {
        return Ok(ys[i]);
    }
    if x == xs[i + 1] {
        return Ok(ys[i + 1]);
    }
    let slope = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]);
    Ok(ys[i] + (x - xs[i]) * slope)
}
