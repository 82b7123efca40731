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

use super::STD_GRAVITY;
use crate::io::{ConfigError, InvalidConfigSnafu};
use crate::linalg::{Matrix3, Vector3};
use snafu::ensure;
use std::fmt;

/// The physical parameters of a quadrotor in the cross configuration: rotors 1 and 3
/// on the body X axis, rotors 2 and 4 on the body Y axis, with rotors 1 and 3 spinning
/// opposite to rotors 2 and 4.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadParams {
    /// Total mass in kilograms
    pub mass_kg: f64,
    /// Distance from the center of mass to each rotor axis, in meters
    pub arm_length_m: f64,
    /// Body inertia tensor in kilogram square meters
    pub inertia_kg_m2: Matrix3<f64>,
    /// Ratio of the drag moment to the thrust of a rotor, in meters
    pub thrust_to_drag_m: f64,
    inertia_inv: Matrix3<f64>,
}

impl QuadParams {
    /// Builds the parameters from a diagonal inertia tensor, checking that every
    /// physical quantity is strictly positive.
    pub fn new(
        mass_kg: f64,
        arm_length_m: f64,
        inertia_diag_kg_m2: Vector3<f64>,
        thrust_to_drag_m: f64,
    ) -> Result<Self, ConfigError> {
        ensure!(
            mass_kg > 0.0,
            InvalidConfigSnafu {
                msg: format!("mass must be strictly positive, got {mass_kg} kg")
            }
        );
        ensure!(
            arm_length_m > 0.0,
            InvalidConfigSnafu {
                msg: format!("arm length must be strictly positive, got {arm_length_m} m")
            }
        );
        ensure!(
            thrust_to_drag_m > 0.0,
            InvalidConfigSnafu {
                msg: format!(
                    "thrust to drag ratio must be strictly positive, got {thrust_to_drag_m} m"
                )
            }
        );
        ensure!(
            inertia_diag_kg_m2.min() > 0.0,
            InvalidConfigSnafu {
                msg: format!("inertia diagonal must be strictly positive, got {inertia_diag_kg_m2}")
            }
        );

        let inertia_kg_m2 = Matrix3::from_diagonal(&inertia_diag_kg_m2);
        let inertia_inv = Matrix3::from_diagonal(&Vector3::new(
            1.0 / inertia_diag_kg_m2.x,
            1.0 / inertia_diag_kg_m2.y,
            1.0 / inertia_diag_kg_m2.z,
        ));

        Ok(Self {
            mass_kg,
            arm_length_m,
            inertia_kg_m2,
            thrust_to_drag_m,
            inertia_inv,
        })
    }

    /// Returns the moment of inertia about the body X axis, in kilogram square meters
    pub fn ixx_kg_m2(&self) -> f64 {
        self.inertia_kg_m2[(0, 0)]
    }

    /// Returns the moment of inertia about the body Y axis, in kilogram square meters
    pub fn iyy_kg_m2(&self) -> f64 {
        self.inertia_kg_m2[(1, 1)]
    }

    /// Returns the moment of inertia about the body Z axis, in kilogram square meters
    pub fn izz_kg_m2(&self) -> f64 {
        self.inertia_kg_m2[(2, 2)]
    }

    /// Returns the total thrust which exactly balances the weight of the vehicle, in newtons
    pub fn hover_thrust_n(&self) -> f64 {
        self.mass_kg * STD_GRAVITY
    }

    /// Motor mixer: distributes a collective thrust and body moments `[Mp, Mq, Mr]`
    /// over the four rotors. Inverse of [Self::body_moments] for the moments and of a
    /// plain sum for the thrust.
    pub fn motor_thrusts(&self, total_thrust_n: f64, moments_n_m: &Vector3<f64>) -> [f64; 4] {
        let yaw_add = total_thrust_n + moments_n_m.z / self.thrust_to_drag_m;
        let yaw_sub = total_thrust_n - moments_n_m.z / self.thrust_to_drag_m;
        let roll = 2.0 * moments_n_m.x / self.arm_length_m;
        let pitch = 2.0 * moments_n_m.y / self.arm_length_m;

        [
            (yaw_add - pitch) / 4.0,
            (yaw_sub + roll) / 4.0,
            (yaw_add + pitch) / 4.0,
            (yaw_sub - roll) / 4.0,
        ]
    }

    /// Returns the body moments `[Mp, Mq, Mr]` produced by the provided rotor thrusts,
    /// in newton meters.
    pub fn body_moments(&self, motor_thrusts_n: &[f64; 4]) -> Vector3<f64> {
        let [t1, t2, t3, t4] = *motor_thrusts_n;
        Vector3::new(
            self.arm_length_m * (t2 - t4),
            self.arm_length_m * (t3 - t1),
            self.thrust_to_drag_m * (t1 - t2 + t3 - t4),
        )
    }

    /// Feedforward inversion of the rotational equations of motion: returns the body
    /// moments which reproduce the desired angular acceleration exactly at the current
    /// body rates.
    pub fn moments_for(
        &self,
        ang_accel_rad_s2: &Vector3<f64>,
        body_rate_rad_s: &Vector3<f64>,
    ) -> Vector3<f64> {
        let gyro = (self.inertia_inv * body_rate_rad_s).cross(&(self.inertia_kg_m2 * body_rate_rad_s));
        self.inertia_kg_m2 * (ang_accel_rad_s2 + gyro)
    }

    /// Rotational equations of motion: returns the angular acceleration in the body
    /// frame given the applied torque and the current body rates.
    pub fn angular_acceleration(
        &self,
        torque_n_m: &Vector3<f64>,
        body_rate_rad_s: &Vector3<f64>,
    ) -> Vector3<f64> {
        let gyro = (self.inertia_inv * body_rate_rad_s).cross(&(self.inertia_kg_m2 * body_rate_rad_s));
        self.inertia_inv * torque_n_m - gyro
    }
}

impl Default for QuadParams {
    /// Parameters of the flying machine arena quadrotor used in the flip experiments.
    fn default() -> Self {
        let inertia_diag = Vector3::new(0.0053, 0.0053, 0.0086);
        Self {
            mass_kg: 1.0,
            arm_length_m: 0.2,
            inertia_kg_m2: Matrix3::from_diagonal(&inertia_diag),
            thrust_to_drag_m: 0.018,
            inertia_inv: Matrix3::from_diagonal(&Vector3::new(
                1.0 / inertia_diag.x,
                1.0 / inertia_diag.y,
                1.0 / inertia_diag.z,
            )),
        }
    }
}

impl fmt::Display for QuadParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "QuadParams {{ mass = {} kg, arm = {} m, inertia diag = [{}, {}, {}] kg m^2, kappa = {} m }}",
            self.mass_kg,
            self.arm_length_m,
            self.ixx_kg_m2(),
            self.iyy_kg_m2(),
            self.izz_kg_m2(),
            self.thrust_to_drag_m
        )
    }
}

#[cfg(test)]
mod ut_params {
    use super::{QuadParams, Vector3};
    use approx::assert_relative_eq;

    #[test]
    fn mixer_round_trip() {
        let params = QuadParams::default();
        let moments = Vector3::new(0.21, -0.05, 0.013);
        let total = 11.5;

        let thrusts = params.motor_thrusts(total, &moments);
        let rebuilt = params.body_moments(&thrusts);

        assert_relative_eq!(rebuilt.x, moments.x, max_relative = 1e-12);
        assert_relative_eq!(rebuilt.y, moments.y, max_relative = 1e-12);
        assert_relative_eq!(rebuilt.z, moments.z, max_relative = 1e-12);
        assert_relative_eq!(thrusts.iter().sum::<f64>(), total, max_relative = 1e-12);
    }

    #[test]
    fn feedforward_inversion_is_exact() {
        let params = QuadParams::default();
        let rates = Vector3::new(4.0, -1.5, 0.2);
        let desired = Vector3::new(100.0, 3.0, -0.5);

        let moments = params.moments_for(&desired, &rates);
        let achieved = params.angular_acceleration(&moments, &rates);

        assert_relative_eq!(achieved.x, desired.x, max_relative = 1e-12);
        assert_relative_eq!(achieved.y, desired.y, max_relative = 1e-12);
        assert_relative_eq!(achieved.z, desired.z, max_relative = 1e-12);
    }

    #[test]
    fn hover_thrust_balances_weight() {
        let params = QuadParams::default();
        assert_relative_eq!(params.hover_thrust_n(), 9.81, max_relative = 1e-12);
    }

    #[test]
    fn rejects_nonphysical_parameters() {
        assert!(QuadParams::new(0.0, 0.2, Vector3::new(1.0, 1.0, 1.0), 0.018).is_err());
        assert!(QuadParams::new(1.0, -0.2, Vector3::new(1.0, 1.0, 1.0), 0.018).is_err());
        assert!(QuadParams::new(1.0, 0.2, Vector3::new(1.0, 0.0, 1.0), 0.018).is_err());
        assert!(QuadParams::new(1.0, 0.2, Vector3::new(1.0, 1.0, 1.0), 0.0).is_err());
    }
}
