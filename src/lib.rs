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

/*! # multiflip

Open-loop multi-flip maneuvers for quadrotors: rigid-body propagation, five phase
flip sequencing, and trajectory export for plotting and animation tooling.

The maneuver parameterization follows Lupashin, Schoellig, Sherback, and D'Andrea,
"A simple learning strategy for high-speed quadrocopter multi-flips" (ICRA 2010),
and the rigid-body model follows Mahony, Kumar, and Corke, "Multirotor aerial
vehicles: Modeling, estimation, and control of quadrotor" (RAM 2012).
*/

/// Provides all the propagators / integrators available in `multiflip`.
pub mod propagators;

/// Provides the rigid-body dynamics and the open-loop maneuver sequencing which drives them.
pub mod dynamics;

/// Provides the quadrotor state, its physical parameters, and the motor mixer.
pub mod vehicle;

mod errors;
pub use self::errors::StateError;

/// All the input/output needs for this library, including scenario files and trajectory export.
pub mod io;

/// The simulation driver, the trajectory log, and the loggable state parameters.
pub mod sim;

#[macro_use]
extern crate log;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use nalgebra::base::*;
    pub use nalgebra::geometry::{Quaternion, UnitQuaternion};
}

/// Re-export some useful things
pub use self::vehicle::{QuadParams, QuadState, State, TimeTagged};
