/*
    Multiflip, open-loop quadrotor flip simulation
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::linalg::Vector3;
use crate::time::{Duration, Epoch};
use crate::vehicle::QuadParams;
use std::fmt;

/// A single open-loop command segment: a constant collective thrust and a constant
/// desired angular acceleration held between two epochs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Maneuver {
    /// Start epoch of the maneuver
    pub start: Epoch,
    /// End epoch of the maneuver
    pub end: Epoch,
    /// Collective thrust over the segment, in newtons
    pub thrust_n: f64,
    /// Desired angular acceleration in the body frame, in radians per second squared
    pub ang_accel_rad_s2: Vector3<f64>,
}

impl Maneuver {
    pub fn new(start: Epoch, end: Epoch, thrust_n: f64, ang_accel_rad_s2: Vector3<f64>) -> Self {
        Self {
            start,
            end,
            thrust_n,
            ang_accel_rad_s2,
        }
    }

    /// Creates a segment which holds the hover thrust of the provided vehicle.
    pub fn hover(start: Epoch, end: Epoch, params: &QuadParams) -> Self {
        Self::new(start, end, params.hover_thrust_n(), Vector3::zeros())
    }

    /// Returns the duration of this maneuver
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Maneuver @ {:.3} N on {} for {} (ending on {})\n\tangular accel: [{:.3}, {:.3}, {:.3}] rad/s^2",
            self.thrust_n,
            self.start,
            self.duration(),
            self.end,
            self.ang_accel_rad_s2.x,
            self.ang_accel_rad_s2.y,
            self.ang_accel_rad_s2.z,
        )
    }
}

#[cfg(test)]
mod ut_maneuver {
    use super::{Maneuver, QuadParams, Vector3};
    use crate::time::{Epoch, Unit};

    #[test]
    fn hover_segment() {
        let params = QuadParams::default();
        let start = Epoch::from_tai_seconds(0.0);
        let mnvr = Maneuver::hover(start, start + 2 * Unit::Second, &params);

        assert_eq!(mnvr.duration(), 2 * Unit::Second);
        assert_eq!(mnvr.thrust_n, params.hover_thrust_n());
        assert_eq!(mnvr.ang_accel_rad_s2, Vector3::zeros());
    }
}
