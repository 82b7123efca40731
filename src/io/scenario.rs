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

use super::{duration_from_str, duration_to_str, ConfigError, ConfigRepr};
use crate::dynamics::guidance::FlipParams;
use crate::linalg::Vector3;
use crate::time::{Duration, Unit};
use crate::vehicle::QuadParams;
use serde_derive::{Deserialize, Serialize};

/// The YAML representation of a complete simulation scenario: the vehicle flying it,
/// the flip parameterization, and the run options.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ScenarioSerde {
    pub vehicle: VehicleSerde,
    pub flip: FlipSerde,
    #[serde(default)]
    pub run: RunSerde,
}

impl ConfigRepr for ScenarioSerde {}

/// The YAML representation of the vehicle physical parameters.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct VehicleSerde {
    pub mass_kg: f64,
    pub arm_length_m: f64,
    /// Diagonal of the body inertia tensor, in kg m^2
    pub inertia_diag_kg_m2: [f64; 3],
    pub thrust_to_drag_m: f64,
}

impl VehicleSerde {
    pub fn to_params(&self) -> Result<QuadParams, ConfigError> {
        let [ixx, iyy, izz] = self.inertia_diag_kg_m2;
        QuadParams::new(
            self.mass_kg,
            self.arm_length_m,
            Vector3::new(ixx, iyy, izz),
            self.thrust_to_drag_m,
        )
    }
}

/// The YAML representation of the flip parameterization. Unset bounds default to the
/// published flight experiment values.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FlipSerde {
    pub turns: u32,
    #[serde(default)]
    pub beta_up_m_s2: Option<f64>,
    #[serde(default)]
    pub beta_down_m_s2: Option<f64>,
    #[serde(default)]
    pub max_rate_deg_s: Option<f64>,
}

impl FlipSerde {
    pub fn to_flip(&self, vehicle: QuadParams) -> Result<FlipParams, ConfigError> {
        let mut flip = FlipParams::new(self.turns, vehicle)
            .map_err(|e| ConfigError::InvalidConfig { msg: e.to_string() })?;

        if self.beta_up_m_s2.is_some() || self.beta_down_m_s2.is_some() {
            flip = flip
                .with_collective_bounds(
                    self.beta_up_m_s2.unwrap_or(flip.beta_up_m_s2),
                    self.beta_down_m_s2.unwrap_or(flip.beta_down_m_s2),
                )
                .map_err(|e| ConfigError::InvalidConfig { msg: e.to_string() })?;
        }

        if let Some(max_rate_deg_s) = self.max_rate_deg_s {
            flip = flip
                .with_max_rate(max_rate_deg_s.to_radians())
                .map_err(|e| ConfigError::InvalidConfig { msg: e.to_string() })?;
        }

        Ok(flip)
    }
}

/// The YAML representation of the run options: integration step and the hover tail
/// appended after the maneuver to show the recovery.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RunSerde {
    #[serde(
        serialize_with = "duration_to_str",
        deserialize_with = "duration_from_str"
    )]
    pub step: Duration,
    #[serde(
        serialize_with = "duration_to_str",
        deserialize_with = "duration_from_str"
    )]
    pub recovery_tail: Duration,
}

impl Default for RunSerde {
    /// The integration step of the original flight experiments and a two second tail.
    fn default() -> Self {
        Self {
            step: 5 * Unit::Millisecond,
            recovery_tail: 2 * Unit::Second,
        }
    }
}

#[cfg(test)]
mod ut_scenario {
    use super::{ConfigRepr, ScenarioSerde, Unit};

    #[test]
    fn load_from_yaml() {
        let yaml = r#"
- vehicle:
    mass_kg: 1.0
    arm_length_m: 0.2
    inertia_diag_kg_m2: [0.0053, 0.0053, 0.0086]
    thrust_to_drag_m: 0.018
  flip:
    turns: 3
  run:
    step: 5 ms
    recovery_tail: 2 s
"#;

        let scenarios = ScenarioSerde::loads_many(yaml).unwrap();
        assert_eq!(scenarios.len(), 1);

        let scenario = &scenarios[0];
        let params = scenario.vehicle.to_params().unwrap();
        assert!((params.mass_kg - 1.0).abs() < f64::EPSILON);
        assert!((params.ixx_kg_m2() - 0.0053).abs() < f64::EPSILON);

        let flip = scenario.flip.to_flip(params).unwrap();
        assert_eq!(flip.turns, 3);

        assert_eq!(scenario.run.step, 5 * Unit::Millisecond);
        assert_eq!(scenario.run.recovery_tail, 2 * Unit::Second);
    }

    #[test]
    fn run_options_default() {
        let yaml = r#"
- vehicle:
    mass_kg: 1.0
    arm_length_m: 0.2
    inertia_diag_kg_m2: [0.0053, 0.0053, 0.0086]
    thrust_to_drag_m: 0.018
  flip:
    turns: 1
"#;

        let scenarios = ScenarioSerde::loads_many(yaml).unwrap();
        assert_eq!(scenarios[0].run.step, 5 * Unit::Millisecond);
    }

    #[test]
    fn invalid_vehicle_is_rejected() {
        let yaml = r#"
- vehicle:
    mass_kg: -1.0
    arm_length_m: 0.2
    inertia_diag_kg_m2: [0.0053, 0.0053, 0.0086]
    thrust_to_drag_m: 0.018
  flip:
    turns: 1
"#;

        let scenarios = ScenarioSerde::loads_many(yaml).unwrap();
        assert!(scenarios[0].vehicle.to_params().is_err());
    }
}
