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

use crate::io::InputOutputError;
use arrow::datatypes::{DataType, Field};
use core::fmt;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr};

/// The scalar parameters of a quadrotor state which can be logged and exported.
#[derive(Copy, Clone, Debug, PartialEq, Sequence, Serialize, Deserialize)]
pub enum StateParameter {
    /// X component of the position (m)
    X,
    /// Y component of the position (m)
    Y,
    /// Z component of the position (m)
    Z,
    /// X component of the velocity (m/s)
    VX,
    /// Y component of the velocity (m/s)
    VY,
    /// Z component of the velocity (m/s)
    VZ,
    /// Norm of the position vector (m)
    Rmag,
    /// Norm of the velocity vector (m/s)
    Vmag,
    /// Scalar component of the attitude quaternion
    QuatW,
    /// First vector component of the attitude quaternion
    QuatX,
    /// Second vector component of the attitude quaternion
    QuatY,
    /// Third vector component of the attitude quaternion
    QuatZ,
    /// Roll angle (deg)
    Roll,
    /// Pitch angle (deg)
    Pitch,
    /// Yaw angle (deg)
    Yaw,
    /// Tilt angle from the upright attitude (deg)
    Tilt,
    /// Body rate about the X axis (deg/s)
    RollRate,
    /// Body rate about the Y axis (deg/s)
    PitchRate,
    /// Body rate about the Z axis (deg/s)
    YawRate,
    /// Thrust of the first rotor (N)
    MotorThrust1,
    /// Thrust of the second rotor (N)
    MotorThrust2,
    /// Thrust of the third rotor (N)
    MotorThrust3,
    /// Thrust of the fourth rotor (N)
    MotorThrust4,
    /// Total thrust of the four rotors (N)
    TotalThrust,
}

impl StateParameter {
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::X | Self::Y | Self::Z | Self::Rmag => "m",

            Self::VX | Self::VY | Self::VZ | Self::Vmag => "m/s",

            Self::Roll | Self::Pitch | Self::Yaw | Self::Tilt => "deg",

            Self::RollRate | Self::PitchRate | Self::YawRate => "deg/s",

            Self::MotorThrust1
            | Self::MotorThrust2
            | Self::MotorThrust3
            | Self::MotorThrust4
            | Self::TotalThrust => "N",

            // The quaternion components are dimensionless
            _ => "",
        }
    }

    /// Returns the parquet field of this parameter
    pub(crate) fn to_field(self, more_meta: Option<Vec<(String, String)>>) -> Field {
        let mut meta = HashMap::new();
        meta.insert("unit".to_string(), self.unit().to_string());
        if let Some(more_data) = more_meta {
            for (k, v) in more_data {
                meta.insert(k, v);
            }
        }

        Field::new(format!("{self}"), DataType::Float64, false).with_metadata(meta)
    }
}

impl FromStr for StateParameter {
    type Err = InputOutputError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let keyword = s
            .split_whitespace()
            .next()
            .ok_or(InputOutputError::UnknownParameter {
                param: s.to_string(),
            })?;

        match keyword.to_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            "vx" => Ok(Self::VX),
            "vy" => Ok(Self::VY),
            "vz" => Ok(Self::VZ),
            "rmag" => Ok(Self::Rmag),
            "vmag" => Ok(Self::Vmag),
            "q_w" => Ok(Self::QuatW),
            "q_x" => Ok(Self::QuatX),
            "q_y" => Ok(Self::QuatY),
            "q_z" => Ok(Self::QuatZ),
            "roll" => Ok(Self::Roll),
            "pitch" => Ok(Self::Pitch),
            "yaw" => Ok(Self::Yaw),
            "tilt" => Ok(Self::Tilt),
            "roll_rate" => Ok(Self::RollRate),
            "pitch_rate" => Ok(Self::PitchRate),
            "yaw_rate" => Ok(Self::YawRate),
            "motor_thrust_1" => Ok(Self::MotorThrust1),
            "motor_thrust_2" => Ok(Self::MotorThrust2),
            "motor_thrust_3" => Ok(Self::MotorThrust3),
            "motor_thrust_4" => Ok(Self::MotorThrust4),
            "total_thrust" => Ok(Self::TotalThrust),
            _ => Err(InputOutputError::UnknownParameter {
                param: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StateParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match *self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::VX => "vx",
            Self::VY => "vy",
            Self::VZ => "vz",
            Self::Rmag => "rmag",
            Self::Vmag => "vmag",
            Self::QuatW => "q_w",
            Self::QuatX => "q_x",
            Self::QuatY => "q_y",
            Self::QuatZ => "q_z",
            Self::Roll => "roll",
            Self::Pitch => "pitch",
            Self::Yaw => "yaw",
            Self::Tilt => "tilt",
            Self::RollRate => "roll_rate",
            Self::PitchRate => "pitch_rate",
            Self::YawRate => "yaw_rate",
            Self::MotorThrust1 => "motor_thrust_1",
            Self::MotorThrust2 => "motor_thrust_2",
            Self::MotorThrust3 => "motor_thrust_3",
            Self::MotorThrust4 => "motor_thrust_4",
            Self::TotalThrust => "total_thrust",
        };
        let unit = if self.unit().is_empty() {
            String::new()
        } else {
            format!(" ({})", self.unit())
        };
        write!(f, "{repr}{unit}")
    }
}

#[cfg(test)]
mod ut_state_param {
    use super::{FromStr, StateParameter};
    use enum_iterator::all;

    #[test]
    fn test_str_to_from() {
        for s in all::<StateParameter>() {
            let as_str = format!("{s}");
            let loaded = StateParameter::from_str(&as_str).unwrap();

            assert_eq!(loaded, s);
        }
    }
}
