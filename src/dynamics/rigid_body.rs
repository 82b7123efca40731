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

use super::guidance::{CmdSequence, OpenLoopCtrl};
use super::{Dynamics, DynamicsError, DynamicsGuidanceSnafu};
use crate::linalg::{Const, OVector, Quaternion, UnitQuaternion, Vector3};
use crate::vehicle::{QuadParams, QuadState, STD_GRAVITY};
use crate::State;
use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;

/// Newton-Euler dynamics of a quadrotor driven by an open-loop guidance law.
///
/// At every integration step, the guidance is queried for the collective thrust and
/// the desired angular acceleration, which are held for the whole step. The desired
/// acceleration is inverted into body moments, distributed over the four rotors by the
/// mixer, and the resulting rotor thrusts feed the translational and rotational
/// equations of motion.
#[derive(Clone)]
pub struct RigidBody {
    pub params: QuadParams,
    pub guidance: Arc<dyn OpenLoopCtrl>,
}

impl RigidBody {
    /// Initializes the dynamics from the vehicle parameters and a guidance law.
    pub fn new(params: QuadParams, guidance: Arc<dyn OpenLoopCtrl>) -> Self {
        Self { params, guidance }
    }

    /// Initializes the dynamics of a vehicle which only holds its hover thrust.
    pub fn hovering(params: QuadParams) -> Self {
        Self::new(params, CmdSequence::hover(&params))
    }

    /// Queries the guidance at the provided state and returns the rotor thrusts which
    /// track the commanded collective thrust and angular acceleration.
    pub fn motor_thrusts(&self, osc: &QuadState) -> Result<[f64; 4], DynamicsError> {
        let thrust_n = self
            .guidance
            .thrust_n(osc)
            .context(DynamicsGuidanceSnafu)?;
        let ang_accel = self
            .guidance
            .ang_accel_rad_s2(osc)
            .context(DynamicsGuidanceSnafu)?;

        let moments = self.params.moments_for(&ang_accel, &osc.body_rate_rad_s);
        Ok(self.params.motor_thrusts(thrust_n, &moments))
    }
}

impl fmt::Display for RigidBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RigidBody of {} with {}", self.params, self.guidance)
    }
}

impl Dynamics for RigidBody {
    type StateType = QuadState;

    fn eom(
        &self,
        delta_t: f64,
        state_vec: &OVector<f64, Const<13>>,
        state_ctx: &QuadState,
    ) -> Result<OVector<f64, Const<13>>, DynamicsError> {
        // Rebuild the state at this integration stage.
        let osc = state_ctx.set_with_delta_seconds(delta_t, state_vec);

        // The command is sampled at the start of the step and held through the stages,
        // matching the discrete control rate of the flight hardware. Sampling at the
        // stage epochs instead would smear the command handover across the step which
        // contains a phase boundary.
        let thrust_n = self
            .guidance
            .thrust_n(state_ctx)
            .context(DynamicsGuidanceSnafu)?;
        let ang_accel = self
            .guidance
            .ang_accel_rad_s2(state_ctx)
            .context(DynamicsGuidanceSnafu)?;

        // The inversion into rotor thrusts does use the stage body rates, so the
        // gyroscopic feedforward matches the rates it compensates.
        let moments = self.params.moments_for(&ang_accel, &osc.body_rate_rad_s);
        let motor_thrusts = self.params.motor_thrusts(thrust_n, &moments);
        let torque = self.params.body_moments(&motor_thrusts);
        let omega = osc.body_rate_rad_s;
        let omega_dot = self.params.angular_acceleration(&torque, &omega);

        // The raw quaternion drifts off the unit sphere within a step, so the rotation
        // to the inertial frame uses a normalized copy.
        let q_raw = osc.attitude.into_inner();
        let body_to_inertial = UnitQuaternion::new_normalize(q_raw);
        let specific_thrust =
            Vector3::new(0.0, 0.0, motor_thrusts.iter().sum::<f64>() / self.params.mass_kg);
        let accel = body_to_inertial * specific_thrust - Vector3::new(0.0, 0.0, STD_GRAVITY);

        // Quaternion kinematics: q_dot = 0.5 * q * (0, omega)
        let q_dot = q_raw * Quaternion::new(0.0, omega.x, omega.y, omega.z) * 0.5;

        Ok(OVector::<f64, Const<13>>::from_column_slice(&[
            osc.velocity_m_s.x,
            osc.velocity_m_s.y,
            osc.velocity_m_s.z,
            accel.x,
            accel.y,
            accel.z,
            q_dot.w,
            q_dot.i,
            q_dot.j,
            q_dot.k,
            omega_dot.x,
            omega_dot.y,
            omega_dot.z,
        ]))
    }

    /// Renormalizes the attitude quaternion and refreshes the rotor thrusts stored on
    /// the state once the step is accepted.
    fn finally(&self, next_state: QuadState) -> Result<QuadState, DynamicsError> {
        let mut state = next_state;
        state.attitude = UnitQuaternion::new_normalize(state.attitude.into_inner());
        state.motor_thrusts_n = self.motor_thrusts(&state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod ut_rigid_body {
    use super::{Dynamics, QuadParams, QuadState, RigidBody, State};
    use crate::time::Epoch;

    #[test]
    fn hover_derivative_is_zero() {
        let dynamics = RigidBody::hovering(QuadParams::default());
        let state = QuadState::hover(Epoch::from_tai_seconds(0.0));

        let deriv = dynamics
            .eom(0.0, &state.to_vector(), &state)
            .expect("hover guidance never fails");

        for (i, component) in deriv.iter().enumerate() {
            assert!(
                component.abs() < 1e-13,
                "non-zero derivative component {i}: {component}"
            );
        }
    }

    #[test]
    fn finally_populates_motor_thrusts() {
        let params = QuadParams::default();
        let dynamics = RigidBody::hovering(params);
        let state = QuadState::hover(Epoch::from_tai_seconds(0.0));

        let state = dynamics.finally(state).expect("hover guidance never fails");
        let per_motor = params.hover_thrust_n() / 4.0;
        for thrust in &state.motor_thrusts_n {
            assert!((thrust - per_motor).abs() < 1e-12);
        }
    }
}
