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

use super::{GuidanceError, Maneuver, NegativeThrustSnafu, OpenLoopCtrl};
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::vehicle::{QuadParams, QuadState};
use snafu::ensure;
use std::fmt;
use std::sync::Arc;

/// An open-loop schedule of maneuver segments. Segments are half-open: a segment
/// commands from its start epoch up to, but excluding, its end epoch, so back-to-back
/// segments hand over cleanly. Outside of any segment, and between segments, the
/// sequence commands the idle thrust with zero angular acceleration, i.e. the vehicle
/// holds its hover authority.
#[derive(Clone, Debug)]
pub struct CmdSequence {
    /// Maneuvers should be provided in chronological order, first maneuver first in the list
    pub mnvrs: Vec<Maneuver>,
    /// Collective thrust held outside of any maneuver segment, in newtons
    pub idle_thrust_n: f64,
}

impl CmdSequence {
    /// Builds a schedule from the vector of maneuvers, must be provided in chronological order.
    pub fn from_mnvrs(mnvrs: Vec<Maneuver>, params: &QuadParams) -> Arc<Self> {
        Arc::new(Self {
            mnvrs,
            idle_thrust_n: params.hover_thrust_n(),
        })
    }

    /// Builds an empty schedule: the vehicle holds its hover thrust indefinitely.
    pub fn hover(params: &QuadParams) -> Arc<Self> {
        Self::from_mnvrs(Vec::new(), params)
    }

    /// Returns the start epoch of the first maneuver, if any
    pub fn start_epoch(&self) -> Option<Epoch> {
        self.mnvrs.first().map(|mnvr| mnvr.start)
    }

    /// Returns the end epoch of the last maneuver, if any
    pub fn end_epoch(&self) -> Option<Epoch> {
        self.mnvrs.last().map(|mnvr| mnvr.end)
    }

    /// Find the maneuver with the closest start epoch that is less than or equal to the provided epoch
    fn maneuver_at(&self, epoch: Epoch) -> Option<&Maneuver> {
        let index = self.mnvrs.binary_search_by_key(&epoch, |mnvr| mnvr.start);
        match index {
            Err(0) => None, // No maneuvers start before the current epoch
            Ok(index) => Some(&self.mnvrs[index]),
            Err(index) => Some(&self.mnvrs[index - 1]), // Return the maneuver with the closest start epoch
        }
    }
}

impl fmt::Display for CmdSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CmdSequence with {} maneuvers", self.mnvrs.len())
    }
}

impl OpenLoopCtrl for CmdSequence {
    fn thrust_n(&self, osc: &QuadState) -> Result<f64, GuidanceError> {
        match self.maneuver_at(osc.epoch) {
            Some(mnvr) if osc.epoch < mnvr.end => {
                ensure!(
                    mnvr.thrust_n >= 0.0,
                    NegativeThrustSnafu {
                        thrust_n: mnvr.thrust_n
                    }
                );
                Ok(mnvr.thrust_n)
            }
            _ => Ok(self.idle_thrust_n),
        }
    }

    fn ang_accel_rad_s2(&self, osc: &QuadState) -> Result<Vector3<f64>, GuidanceError> {
        match self.maneuver_at(osc.epoch) {
            Some(mnvr) if osc.epoch < mnvr.end => Ok(mnvr.ang_accel_rad_s2),
            _ => Ok(Vector3::zeros()),
        }
    }
}

#[cfg(test)]
mod ut_sequence {
    use super::{CmdSequence, Maneuver, OpenLoopCtrl, Vector3};
    use crate::time::{Epoch, Unit};
    use crate::vehicle::{QuadParams, QuadState};

    #[test]
    fn dispatch_and_idle() {
        let params = QuadParams::default();
        let t0 = Epoch::from_tai_seconds(0.0);

        let seq = CmdSequence::from_mnvrs(
            vec![
                Maneuver::new(
                    t0,
                    t0 + 1 * Unit::Second,
                    12.0,
                    Vector3::new(5.0, 0.0, 0.0),
                ),
                Maneuver::new(
                    t0 + 2 * Unit::Second,
                    t0 + 3 * Unit::Second,
                    4.0,
                    Vector3::new(-5.0, 0.0, 0.0),
                ),
            ],
            &params,
        );

        let mut state = QuadState::hover(t0 + 500 * Unit::Millisecond);
        assert_eq!(seq.thrust_n(&state).unwrap(), 12.0);
        assert_eq!(seq.ang_accel_rad_s2(&state).unwrap().x, 5.0);

        // In the gap between the two segments, the sequence commands hover
        state.epoch = t0 + 1500 * Unit::Millisecond;
        assert_eq!(seq.thrust_n(&state).unwrap(), params.hover_thrust_n());
        assert_eq!(seq.ang_accel_rad_s2(&state).unwrap(), Vector3::zeros());

        state.epoch = t0 + 2500 * Unit::Millisecond;
        assert_eq!(seq.thrust_n(&state).unwrap(), 4.0);
        assert_eq!(seq.ang_accel_rad_s2(&state).unwrap().x, -5.0);

        // Before the first segment and after the last one, the sequence is idle
        state.epoch = t0 - 1 * Unit::Second;
        assert_eq!(seq.thrust_n(&state).unwrap(), params.hover_thrust_n());
        state.epoch = t0 + 10 * Unit::Second;
        assert_eq!(seq.thrust_n(&state).unwrap(), params.hover_thrust_n());
    }

    #[test]
    fn negative_thrust_is_rejected() {
        let params = QuadParams::default();
        let t0 = Epoch::from_tai_seconds(0.0);
        let seq = CmdSequence::from_mnvrs(
            vec![Maneuver::new(
                t0,
                t0 + 1 * Unit::Second,
                -1.0,
                Vector3::zeros(),
            )],
            &params,
        );

        let state = QuadState::hover(t0 + 100 * Unit::Millisecond);
        assert!(seq.thrust_n(&state).is_err());
    }
}
