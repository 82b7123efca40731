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

use super::{State, TimeTagged};
use crate::errors::StateError;
use crate::linalg::{Const, OVector, Quaternion, UnitQuaternion, Vector3};
use crate::sim::StateParameter;
use crate::time::Epoch;
use approx::{AbsDiffEq, RelativeEq};
use std::fmt;

/// The complete rigid-body state of a quadrotor: inertial position and velocity,
/// body-to-inertial attitude quaternion, and body-frame angular rates.
///
/// The serialized vector is ordered position, velocity, quaternion (scalar first),
/// body rates, for a total of thirteen components. The inertial frame is Z-up.
#[derive(Copy, Clone, Debug)]
pub struct QuadState {
    /// Time tag of this state
    pub epoch: Epoch,
    /// Inertial position in meters
    pub radius_m: Vector3<f64>,
    /// Inertial velocity in meters per second
    pub velocity_m_s: Vector3<f64>,
    /// Rotation from the body frame to the inertial frame
    pub attitude: UnitQuaternion<f64>,
    /// Angular velocity in the body frame, in radians per second
    pub body_rate_rad_s: Vector3<f64>,
    /// Rotor thrusts commanded at this epoch in newtons, refreshed by the dynamics
    /// after every accepted step (not an integrated quantity)
    pub motor_thrusts_n: [f64; 4],
}

impl QuadState {
    /// Creates a new quadrotor state from its components.
    pub fn new(
        epoch: Epoch,
        radius_m: Vector3<f64>,
        velocity_m_s: Vector3<f64>,
        attitude: UnitQuaternion<f64>,
        body_rate_rad_s: Vector3<f64>,
    ) -> Self {
        Self {
            epoch,
            radius_m,
            velocity_m_s,
            attitude,
            body_rate_rad_s,
            motor_thrusts_n: [0.0; 4],
        }
    }

    /// Creates a level, motionless state at the origin, i.e. the initial condition of
    /// a maneuver started from a perfect hover.
    pub fn hover(epoch: Epoch) -> Self {
        Self::new(
            epoch,
            Vector3::zeros(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            Vector3::zeros(),
        )
    }

    /// Returns the magnitude of the position vector, in meters
    pub fn rmag_m(&self) -> f64 {
        self.radius_m.norm()
    }

    /// Returns the magnitude of the velocity vector, in meters per second
    pub fn vmag_m_s(&self) -> f64 {
        self.velocity_m_s.norm()
    }

    /// Returns the roll angle in radians (ZYX Euler sequence)
    pub fn roll_rad(&self) -> f64 {
        self.attitude.euler_angles().0
    }

    /// Returns the pitch angle in radians (ZYX Euler sequence)
    pub fn pitch_rad(&self) -> f64 {
        self.attitude.euler_angles().1
    }

    /// Returns the yaw angle in radians (ZYX Euler sequence)
    pub fn yaw_rad(&self) -> f64 {
        self.attitude.euler_angles().2
    }

    /// Returns the roll angle in degrees
    pub fn roll_deg(&self) -> f64 {
        self.roll_rad().to_degrees()
    }

    /// Returns the pitch angle in degrees
    pub fn pitch_deg(&self) -> f64 {
        self.pitch_rad().to_degrees()
    }

    /// Returns the yaw angle in degrees
    pub fn yaw_deg(&self) -> f64 {
        self.yaw_rad().to_degrees()
    }

    /// Returns the tilt angle in radians: the geodesic angle between the body Z axis
    /// and the inertial Z axis. Zero means the vehicle is level, pi means inverted.
    pub fn tilt_rad(&self) -> f64 {
        let body_z_inertial = self.attitude * Vector3::z();
        body_z_inertial.z.clamp(-1.0, 1.0).acos()
    }

    /// Returns the tilt angle in degrees
    pub fn tilt_deg(&self) -> f64 {
        self.tilt_rad().to_degrees()
    }

    /// Returns the norm of the attitude quaternion. This is exactly one after every
    /// completed propagator step.
    pub fn attitude_norm(&self) -> f64 {
        self.attitude.into_inner().norm()
    }

    /// Returns the total commanded thrust at this epoch, in newtons
    pub fn total_thrust_n(&self) -> f64 {
        self.motor_thrusts_n.iter().sum()
    }
}

impl PartialEq for QuadState {
    /// Two states are equal if their epochs and all of their components are equal.
    fn eq(&self, other: &Self) -> bool {
        self.epoch == other.epoch
            && self.radius_m == other.radius_m
            && self.velocity_m_s == other.velocity_m_s
            && self.attitude == other.attitude
            && self.body_rate_rad_s == other.body_rate_rad_s
            && self.motor_thrusts_n == other.motor_thrusts_n
    }
}

impl Default for QuadState {
    fn default() -> Self {
        Self::zeros()
    }
}

impl fmt::Display for QuadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let decimals = f.precision().unwrap_or(6);
        write!(
            f,
            "[{}] position = [{:.*}, {:.*}, {:.*}] m\tvelocity = [{:.*}, {:.*}, {:.*}] m/s\troll = {:.*} deg\tpitch = {:.*} deg\tyaw = {:.*} deg\trate = [{:.*}, {:.*}, {:.*}] rad/s",
            self.epoch,
            decimals, self.radius_m.x,
            decimals, self.radius_m.y,
            decimals, self.radius_m.z,
            decimals, self.velocity_m_s.x,
            decimals, self.velocity_m_s.y,
            decimals, self.velocity_m_s.z,
            decimals, self.roll_deg(),
            decimals, self.pitch_deg(),
            decimals, self.yaw_deg(),
            decimals, self.body_rate_rad_s.x,
            decimals, self.body_rate_rad_s.y,
            decimals, self.body_rate_rad_s.z,
        )
    }
}

impl fmt::LowerExp for QuadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let decimals = f.precision().unwrap_or(6);
        let q = self.attitude.into_inner();
        write!(
            f,
            "[{}] position = [{:.*e}, {:.*e}, {:.*e}] m\tvelocity = [{:.*e}, {:.*e}, {:.*e}] m/s\tattitude = ({:.*e}, {:.*e}, {:.*e}, {:.*e})\trate = [{:.*e}, {:.*e}, {:.*e}] rad/s",
            self.epoch,
            decimals, self.radius_m.x,
            decimals, self.radius_m.y,
            decimals, self.radius_m.z,
            decimals, self.velocity_m_s.x,
            decimals, self.velocity_m_s.y,
            decimals, self.velocity_m_s.z,
            decimals, q.w,
            decimals, q.i,
            decimals, q.j,
            decimals, q.k,
            decimals, self.body_rate_rad_s.x,
            decimals, self.body_rate_rad_s.y,
            decimals, self.body_rate_rad_s.z,
        )
    }
}

impl TimeTagged for QuadState {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }
}

impl State for QuadState {
    type Size = Const<13>;
    type VecLength = Const<13>;

    fn zeros() -> Self {
        Self::hover(Epoch::from_tai_seconds(0.0))
    }

    fn to_vector(&self) -> OVector<f64, Const<13>> {
        let q = self.attitude.into_inner();
        OVector::<f64, Const<13>>::from_column_slice(&[
            self.radius_m.x,
            self.radius_m.y,
            self.radius_m.z,
            self.velocity_m_s.x,
            self.velocity_m_s.y,
            self.velocity_m_s.z,
            q.w,
            q.i,
            q.j,
            q.k,
            self.body_rate_rad_s.x,
            self.body_rate_rad_s.y,
            self.body_rate_rad_s.z,
        ])
    }

    /// Sets this state from the provided vector. The quaternion components are stored
    /// as provided: the norm drifts freely within a step and the dynamics `finally`
    /// hook renormalizes it once the step is accepted.
    fn set(&mut self, epoch: Epoch, vector: &OVector<f64, Const<13>>) {
        self.epoch = epoch;
        self.radius_m = Vector3::new(vector[0], vector[1], vector[2]);
        self.velocity_m_s = Vector3::new(vector[3], vector[4], vector[5]);
        self.attitude = UnitQuaternion::new_unchecked(Quaternion::new(
            vector[6], vector[7], vector[8], vector[9],
        ));
        self.body_rate_rad_s = Vector3::new(vector[10], vector[11], vector[12]);
    }

    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }

    fn value(&self, param: StateParameter) -> Result<f64, StateError> {
        match param {
            StateParameter::X => Ok(self.radius_m.x),
            StateParameter::Y => Ok(self.radius_m.y),
            StateParameter::Z => Ok(self.radius_m.z),
            StateParameter::VX => Ok(self.velocity_m_s.x),
            StateParameter::VY => Ok(self.velocity_m_s.y),
            StateParameter::VZ => Ok(self.velocity_m_s.z),
            StateParameter::Rmag => Ok(self.rmag_m()),
            StateParameter::Vmag => Ok(self.vmag_m_s()),
            StateParameter::QuatW => Ok(self.attitude.into_inner().w),
            StateParameter::QuatX => Ok(self.attitude.into_inner().i),
            StateParameter::QuatY => Ok(self.attitude.into_inner().j),
            StateParameter::QuatZ => Ok(self.attitude.into_inner().k),
            StateParameter::Roll => Ok(self.roll_deg()),
            StateParameter::Pitch => Ok(self.pitch_deg()),
            StateParameter::Yaw => Ok(self.yaw_deg()),
            StateParameter::Tilt => Ok(self.tilt_deg()),
            StateParameter::RollRate => Ok(self.body_rate_rad_s.x.to_degrees()),
            StateParameter::PitchRate => Ok(self.body_rate_rad_s.y.to_degrees()),
            StateParameter::YawRate => Ok(self.body_rate_rad_s.z.to_degrees()),
            StateParameter::MotorThrust1 => Ok(self.motor_thrusts_n[0]),
            StateParameter::MotorThrust2 => Ok(self.motor_thrusts_n[1]),
            StateParameter::MotorThrust3 => Ok(self.motor_thrusts_n[2]),
            StateParameter::MotorThrust4 => Ok(self.motor_thrusts_n[3]),
            StateParameter::TotalThrust => Ok(self.total_thrust_n()),
        }
    }
}

impl AbsDiffEq for QuadState {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-12
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.radius_m.abs_diff_eq(&other.radius_m, epsilon)
            && self.velocity_m_s.abs_diff_eq(&other.velocity_m_s, epsilon)
            && self
                .attitude
                .into_inner()
                .coords
                .abs_diff_eq(&other.attitude.into_inner().coords, epsilon)
            && self
                .body_rate_rad_s
                .abs_diff_eq(&other.body_rate_rad_s, epsilon)
    }
}

impl RelativeEq for QuadState {
    fn default_max_relative() -> Self::Epsilon {
        1e-9
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.radius_m
            .relative_eq(&other.radius_m, epsilon, max_relative)
            && self
                .velocity_m_s
                .relative_eq(&other.velocity_m_s, epsilon, max_relative)
            && self.attitude.into_inner().coords.relative_eq(
                &other.attitude.into_inner().coords,
                epsilon,
                max_relative,
            )
            && self
                .body_rate_rad_s
                .relative_eq(&other.body_rate_rad_s, epsilon, max_relative)
    }
}

#[cfg(test)]
mod ut_state {
    use super::{Epoch, QuadState, State, UnitQuaternion, Vector3};

    #[test]
    fn vector_round_trip() {
        let epoch = Epoch::from_gregorian_tai_at_midnight(2023, 11, 25);
        let attitude = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
        let state = QuadState::new(
            epoch,
            Vector3::new(1.0, -2.0, 3.5),
            Vector3::new(0.1, 0.2, -0.3),
            attitude,
            Vector3::new(3.1, -0.5, 0.01),
        );

        let mut rebuilt = QuadState::hover(epoch);
        rebuilt.set(epoch, &state.to_vector());

        assert_eq!(rebuilt, state, "vector round trip changed the state");
    }

    #[test]
    fn tilt_of_inverted_vehicle() {
        let epoch = Epoch::from_tai_seconds(0.0);
        let mut state = QuadState::hover(epoch);
        assert!((state.tilt_rad()).abs() < f64::EPSILON);

        // Half a flip about body X leaves the vehicle upside down
        state.attitude = UnitQuaternion::from_scaled_axis(Vector3::x() * core::f64::consts::PI);
        assert!((state.tilt_rad() - core::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn euler_accessors_match_construction() {
        let epoch = Epoch::from_tai_seconds(0.0);
        let mut state = QuadState::hover(epoch);
        state.attitude = UnitQuaternion::from_euler_angles(0.25, -0.12, 0.8);

        assert!((state.roll_rad() - 0.25).abs() < 1e-12);
        assert!((state.pitch_rad() + 0.12).abs() < 1e-12);
        assert!((state.yaw_rad() - 0.8).abs() < 1e-12);
    }
}
