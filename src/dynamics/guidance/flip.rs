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

use super::{
    CmdSequence, CollectiveBoundsSnafu, GuidanceError, Maneuver, NoTurnsSnafu,
    NonPositiveRateSnafu, UnreachableRateSnafu,
};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch, Unit};
use crate::vehicle::QuadParams;
use snafu::ensure;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Reduced maximum collective acceleration of the flight arena vehicles, in m/s^2
pub const BETA_UP_M_S2: f64 = 21.58;

/// Reduced minimum collective acceleration of the flight arena vehicles, in m/s^2
pub const BETA_DOWN_M_S2: f64 = 3.92;

/// Maximum commandable body rate, 1800 deg/s in radians per second
pub const MAX_RATE_RAD_S: f64 = PI * 10.0;

/// Duration of the accelerate and recover phases, in seconds
const RAMP_S: f64 = 0.2;

/// Fraction of the maximum collective held during the accelerate and recover phases
const COLLECTIVE_FRACTION: f64 = 0.9;

/// The five phase multi-flip parameterization: accelerate, start rotate, coast,
/// stop rotate, recover, all rotating about the body X axis.
///
/// The accelerate and recover phases hold a high collective to trade altitude for the
/// rotation, the start and stop phases saturate the differential thrust, and the coast
/// phase holds the peak body rate at minimum collective. The coast duration is solved
/// so that the five phases integrate to exactly `turns` full revolutions, which brings
/// the vehicle back to level with zero body rate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlipParams {
    /// Number of complete turns about the body X axis
    pub turns: u32,
    /// Maximum reduced collective acceleration, in m/s^2
    pub beta_up_m_s2: f64,
    /// Minimum reduced collective acceleration, in m/s^2
    pub beta_down_m_s2: f64,
    /// Peak body rate about the flip axis, in rad/s
    pub max_rate_rad_s: f64,
    /// The vehicle flying the maneuver
    pub vehicle: QuadParams,
}

/// One phase of the flip: a constant collective thrust and roll acceleration held for
/// a duration.
#[derive(Copy, Clone, Debug)]
struct Phase {
    thrust_n: f64,
    roll_accel_rad_s2: f64,
    duration_s: f64,
}

impl FlipParams {
    /// Builds the parameterization of an `turns`-flip with the acceleration bounds and
    /// peak rate of the published flight experiments.
    pub fn new(turns: u32, vehicle: QuadParams) -> Result<Self, GuidanceError> {
        ensure!(turns >= 1, NoTurnsSnafu { turns });
        Ok(Self {
            turns,
            beta_up_m_s2: BETA_UP_M_S2,
            beta_down_m_s2: BETA_DOWN_M_S2,
            max_rate_rad_s: MAX_RATE_RAD_S,
            vehicle,
        })
    }

    /// Sets the reduced collective acceleration bounds, in m/s^2.
    pub fn with_collective_bounds(
        mut self,
        beta_up_m_s2: f64,
        beta_down_m_s2: f64,
    ) -> Result<Self, GuidanceError> {
        ensure!(
            beta_down_m_s2 > 0.0 && beta_down_m_s2 < beta_up_m_s2,
            CollectiveBoundsSnafu {
                beta_up_m_s2,
                beta_down_m_s2
            }
        );
        self.beta_up_m_s2 = beta_up_m_s2;
        self.beta_down_m_s2 = beta_down_m_s2;
        Ok(self)
    }

    /// Sets the peak body rate of the coast phase, in rad/s.
    pub fn with_max_rate(mut self, max_rate_rad_s: f64) -> Result<Self, GuidanceError> {
        ensure!(
            max_rate_rad_s > 0.0,
            NonPositiveRateSnafu {
                rate_rad_s: max_rate_rad_s
            }
        );
        self.max_rate_rad_s = max_rate_rad_s;
        Ok(self)
    }

    /// Roll acceleration of the start rotate phase: all of the differential thrust
    /// available between the collective bounds, in rad/s^2.
    fn saturated_roll_accel(&self) -> f64 {
        let v = &self.vehicle;
        v.mass_kg * v.arm_length_m * (self.beta_up_m_s2 - self.beta_down_m_s2)
            / (4.0 * v.ixx_kg_m2())
    }

    /// Roll acceleration of the accelerate phase (its opposite is the recover phase):
    /// the slight counter rotation left over when the collective is near its maximum.
    fn ramp_roll_accel(&self) -> f64 {
        let v = &self.vehicle;
        let p0 = COLLECTIVE_FRACTION * self.beta_up_m_s2;
        -v.mass_kg * v.arm_length_m * (self.beta_up_m_s2 - p0) / (4.0 * v.ixx_kg_m2())
    }

    fn phases(&self) -> Result<[Phase; 5], GuidanceError> {
        ensure!(
            self.beta_down_m_s2 > 0.0 && self.beta_down_m_s2 < self.beta_up_m_s2,
            CollectiveBoundsSnafu {
                beta_up_m_s2: self.beta_up_m_s2,
                beta_down_m_s2: self.beta_down_m_s2
            }
        );
        ensure!(
            self.max_rate_rad_s > 0.0,
            NonPositiveRateSnafu {
                rate_rad_s: self.max_rate_rad_s
            }
        );

        let v = &self.vehicle;
        let p0 = COLLECTIVE_FRACTION * self.beta_up_m_s2;
        let peak = self.max_rate_rad_s;

        let a_ramp = self.ramp_roll_accel();
        let a_start = self.saturated_roll_accel();
        let a_stop = -a_start;
        let a_recover = -a_ramp;

        // Rate profile: 0 -> rate_1 during accelerate, rate_1 -> peak during start
        // rotate, peak held while coasting, peak -> rate_4 during stop rotate, and
        // rate_4 -> 0 during recover.
        let rate_1 = a_ramp * RAMP_S;
        let rate_4 = -a_recover * RAMP_S;

        let d_start = (peak - rate_1) / a_start;
        let d_stop = (rate_4 - peak) / a_stop;

        // Roll angle swept by every phase but the coast
        let angle_accelerate = 0.5 * a_ramp * RAMP_S.powi(2);
        let angle_start = rate_1 * d_start + 0.5 * a_start * d_start.powi(2);
        let angle_stop = peak * d_stop + 0.5 * a_stop * d_stop.powi(2);
        let angle_recover = rate_4 * RAMP_S + 0.5 * a_recover * RAMP_S.powi(2);

        // The coast makes up the rest of the full revolutions
        let angle_coast = 2.0 * PI * f64::from(self.turns)
            - (angle_accelerate + angle_start + angle_stop + angle_recover);
        ensure!(
            angle_coast >= 0.0,
            UnreachableRateSnafu {
                rate_rad_s: peak,
                turns: self.turns
            }
        );
        let d_coast = angle_coast / peak;

        let saturated_thrust =
            v.mass_kg * self.beta_up_m_s2 - 2.0 * a_start.abs() * v.ixx_kg_m2() / v.arm_length_m;

        Ok([
            Phase {
                thrust_n: v.mass_kg * p0,
                roll_accel_rad_s2: a_ramp,
                duration_s: RAMP_S,
            },
            Phase {
                thrust_n: saturated_thrust,
                roll_accel_rad_s2: a_start,
                duration_s: d_start,
            },
            Phase {
                thrust_n: v.mass_kg * self.beta_down_m_s2,
                roll_accel_rad_s2: 0.0,
                duration_s: d_coast,
            },
            Phase {
                thrust_n: saturated_thrust,
                roll_accel_rad_s2: a_stop,
                duration_s: d_stop,
            },
            Phase {
                thrust_n: v.mass_kg * p0,
                roll_accel_rad_s2: a_recover,
                duration_s: RAMP_S,
            },
        ])
    }

    /// Emits the chronological command schedule of this flip, starting at the provided
    /// epoch. Phases shorter than `min_phase` are dropped and consume no time, which
    /// matches how the flight software squashes degenerate sections.
    pub fn to_sequence(
        &self,
        start: Epoch,
        min_phase: Duration,
    ) -> Result<Arc<CmdSequence>, GuidanceError> {
        let mut mnvrs = Vec::with_capacity(5);
        let mut epoch = start;
        for phase in self.phases()? {
            let duration = phase.duration_s * Unit::Second;
            if duration < min_phase {
                continue;
            }
            mnvrs.push(Maneuver::new(
                epoch,
                epoch + duration,
                phase.thrust_n,
                Vector3::new(phase.roll_accel_rad_s2, 0.0, 0.0),
            ));
            epoch += duration;
        }

        Ok(CmdSequence::from_mnvrs(mnvrs, &self.vehicle))
    }
}

impl fmt::Display for FlipParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "FlipParams: {} turn(s) about +X at up to {:.3} rad/s, collective within [{}, {}] m/s^2",
            self.turns, self.max_rate_rad_s, self.beta_down_m_s2, self.beta_up_m_s2
        )
    }
}

#[cfg(test)]
mod ut_flip {
    use super::{Duration, Epoch, FlipParams, PI};
    use crate::vehicle::QuadParams;
    use approx::assert_relative_eq;

    #[test]
    fn rate_profile_closes() {
        let flip = FlipParams::new(3, QuadParams::default()).unwrap();
        let phases = flip.phases().unwrap();

        // Walk the piecewise linear rate profile
        let mut rate = 0.0;
        let mut angle = 0.0;
        let mut peak: f64 = 0.0;
        for phase in &phases {
            angle += rate * phase.duration_s + 0.5 * phase.roll_accel_rad_s2 * phase.duration_s.powi(2);
            rate += phase.roll_accel_rad_s2 * phase.duration_s;
            peak = peak.max(rate);
        }

        assert_relative_eq!(rate, 0.0, epsilon = 1e-10);
        assert_relative_eq!(angle, 3.0 * 2.0 * PI, max_relative = 1e-10);
        assert_relative_eq!(peak, flip.max_rate_rad_s, max_relative = 1e-10);
    }

    #[test]
    fn sequence_is_contiguous() {
        let flip = FlipParams::new(1, QuadParams::default()).unwrap();
        let start = Epoch::from_tai_seconds(0.0);
        let seq = flip.to_sequence(start, Duration::ZERO).unwrap();

        assert_eq!(seq.mnvrs.len(), 5);
        assert_eq!(seq.start_epoch().unwrap(), start);
        for pair in seq.mnvrs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "phases must be contiguous");
        }
        for mnvr in &seq.mnvrs {
            assert!(mnvr.duration().to_seconds() > 0.0);
            assert!(mnvr.thrust_n > 0.0);
        }
    }

    #[test]
    fn degenerate_phases_are_dropped() {
        let flip = FlipParams::new(1, QuadParams::default()).unwrap();
        let start = Epoch::from_tai_seconds(0.0);
        // A minimum phase duration longer than the ramps drops them all but the coast
        // and the saturated rotations
        let seq = flip
            .to_sequence(start, Duration::from_seconds(0.21))
            .unwrap();
        assert!(seq.mnvrs.len() < 5);
        // The remaining phases stay contiguous
        for pair in seq.mnvrs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn parameter_validation() {
        let params = QuadParams::default();
        assert!(FlipParams::new(0, params).is_err());
        assert!(FlipParams::new(1, params)
            .unwrap()
            .with_collective_bounds(3.92, 21.58)
            .is_err());
        assert!(FlipParams::new(1, params)
            .unwrap()
            .with_max_rate(-1.0)
            .is_err());
    }

    #[test]
    fn too_fast_for_one_turn() {
        // An absurd peak rate cannot be reached and stopped within a single turn
        let flip = FlipParams::new(1, QuadParams::default())
            .unwrap()
            .with_max_rate(500.0)
            .unwrap();
        assert!(flip.phases().is_err());
    }
}
