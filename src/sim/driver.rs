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

use super::trajectory::Traj;
use crate::dynamics::guidance::{CmdSequence, GuidanceError};
use crate::dynamics::RigidBody;
use crate::io::scenario::ScenarioSerde;
use crate::io::ConfigError;
use crate::propagators::{PropOpts, PropagationError, Propagator, RSSQuadStep};
use crate::time::{Duration, Epoch, Unit};
use crate::vehicle::{QuadParams, QuadState};
use snafu::prelude::*;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SimError {
    #[snafu(display("simulation setup error: {source}"))]
    SimConfig { source: ConfigError },
    #[snafu(display("simulation schedule error: {source}"))]
    SimGuidance { source: GuidanceError },
    #[snafu(display("simulation propagation error: {source}"))]
    SimPropagation { source: PropagationError },
}

/// The simulation driver: binds a vehicle, an initial state, and a command schedule,
/// and runs the rigid body dynamics through the full schedule plus a hover tail to
/// show the recovery.
pub struct Simulation {
    pub params: QuadParams,
    pub init_state: QuadState,
    pub schedule: Arc<CmdSequence>,
    pub opts: PropOpts<RSSQuadStep>,
    /// Hover span appended after the last maneuver
    pub recovery_tail: Duration,
}

impl Simulation {
    /// Builds a simulation with the default five millisecond fixed step and a two
    /// second recovery tail.
    pub fn new(params: QuadParams, init_state: QuadState, schedule: Arc<CmdSequence>) -> Self {
        Self {
            params,
            init_state,
            schedule,
            opts: PropOpts::default(),
            recovery_tail: 2 * Unit::Second,
        }
    }

    /// Builds the simulation described by a YAML scenario, hovering at the origin at
    /// the provided start epoch.
    ///
    /// Phases shorter than two integration steps are squashed by the sequencer since
    /// the propagator cannot resolve them.
    pub fn from_scenario(scenario: &ScenarioSerde, start: Epoch) -> Result<Self, SimError> {
        let params = scenario.vehicle.to_params().context(SimConfigSnafu)?;
        let flip = scenario.flip.to_flip(params).context(SimConfigSnafu)?;

        let min_phase = 2 * scenario.run.step;
        let schedule = flip
            .to_sequence(start, min_phase)
            .context(SimGuidanceSnafu)?;

        Ok(Self {
            params,
            init_state: QuadState::hover(start),
            schedule,
            opts: PropOpts::with_fixed_step(scenario.run.step),
            recovery_tail: scenario.run.recovery_tail,
        })
    }

    /// Runs the full schedule phase by phase, then the recovery tail, and returns the
    /// final state along with the complete trajectory log.
    ///
    /// Each phase ends with an exact partial step onto its boundary epoch, so the
    /// guidance handover always happens on a logged sample.
    pub fn run(&self) -> Result<(QuadState, Traj<QuadState>), SimError> {
        let dynamics = RigidBody::new(self.params, self.schedule.clone());
        let setup = Propagator::rk4(dynamics, self.opts);
        let mut prop = setup.with(self.init_state);

        let mut traj = Traj::new();
        traj.states.push(self.init_state);

        for (ii, mnvr) in self.schedule.mnvrs.iter().enumerate() {
            info!("phase {}/{}: {}", ii + 1, self.schedule.mnvrs.len(), mnvr);
            let (_, phase_traj) = prop
                .until_epoch_with_traj(mnvr.end)
                .context(SimPropagationSnafu)?;
            traj += &phase_traj;
        }

        if self.recovery_tail > Duration::ZERO {
            info!("recovery: holding hover for {}", self.recovery_tail);
            let (_, tail_traj) = prop
                .for_duration_with_traj(self.recovery_tail)
                .context(SimPropagationSnafu)?;
            traj += &tail_traj;
        }

        traj.finalize();
        info!("{traj}");

        Ok((prop.state, traj))
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Simulation of {} from {} with {} and a {} recovery tail",
            self.schedule,
            self.init_state.epoch,
            self.opts,
            self.recovery_tail
        )
    }
}

#[cfg(test)]
mod ut_driver {
    use super::{CmdSequence, Duration, Epoch, QuadParams, QuadState, Simulation};
    use crate::time::Unit;

    #[test]
    fn empty_schedule_without_tail_is_a_single_sample() {
        let params = QuadParams::default();
        let t0 = Epoch::from_tai_seconds(0.0);
        let mut sim = Simulation::new(params, QuadState::hover(t0), CmdSequence::hover(&params));
        sim.recovery_tail = Duration::ZERO;

        let (end_state, traj) = sim.run().unwrap();
        assert_eq!(traj.states.len(), 1);
        assert_eq!(traj.first().epoch, t0);
        assert_eq!(end_state.epoch, t0);
    }

    #[test]
    fn hover_station_keeping() {
        let params = QuadParams::default();
        let t0 = Epoch::from_tai_seconds(0.0);
        let mut sim = Simulation::new(params, QuadState::hover(t0), CmdSequence::hover(&params));
        sim.recovery_tail = 1 * Unit::Second;

        let (end_state, traj) = sim.run().unwrap();
        assert_eq!(end_state.epoch, t0 + 1 * Unit::Second);
        // The hover thrust exactly cancels gravity: the vehicle does not move
        assert!(end_state.radius_m.norm() < 1e-9);
        assert!(end_state.velocity_m_s.norm() < 1e-9);
        // One sample per step, plus the initial state
        assert_eq!(traj.states.len(), 201);
    }
}
