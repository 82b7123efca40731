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
use crate::vehicle::QuadState;
use snafu::Snafu;

use std::fmt;

mod maneuver;
pub use maneuver::Maneuver;

mod sequence;
pub use sequence::CmdSequence;

mod flip;
pub use flip::FlipParams;

/// The `OpenLoopCtrl` trait is implemented by open-loop command generators: given the
/// current vehicle state, they return the collective thrust and the desired angular
/// acceleration without any feedback on the achieved motion.
pub trait OpenLoopCtrl: fmt::Display + Send + Sync {
    /// Returns the collective thrust commanded at this state, in newtons.
    fn thrust_n(&self, osc: &QuadState) -> Result<f64, GuidanceError>;

    /// Returns the desired angular acceleration in the body frame at this state,
    /// in radians per second squared.
    fn ang_accel_rad_s2(&self, osc: &QuadState) -> Result<Vector3<f64>, GuidanceError>;
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GuidanceError {
    #[snafu(display("commanded collective thrust must be non-negative, got {thrust_n} N"))]
    NegativeThrust { thrust_n: f64 },
    #[snafu(display("a flip maneuver requires at least one turn, got {turns}"))]
    NoTurns { turns: u32 },
    #[snafu(display(
        "collective acceleration bounds must satisfy 0 < beta_down < beta_up, got beta_up = {beta_up_m_s2} m/s^2 and beta_down = {beta_down_m_s2} m/s^2"
    ))]
    CollectiveBounds {
        beta_up_m_s2: f64,
        beta_down_m_s2: f64,
    },
    #[snafu(display("maximum body rate must be strictly positive, got {rate_rad_s} rad/s"))]
    NonPositiveRate { rate_rad_s: f64 },
    #[snafu(display(
        "cannot reach {rate_rad_s} rad/s and stop again within {turns} turns, lower the rate or add turns"
    ))]
    UnreachableRate { rate_rad_s: f64, turns: u32 },
}
