use multiflip::dynamics::guidance::FlipParams;
use multiflip::dynamics::RigidBody;
use multiflip::propagators::{PropOpts, Propagator};
use multiflip::sim::Simulation;
use multiflip::time::{Duration, Epoch, Unit};
use multiflip::vehicle::{QuadParams, QuadState};

#[test]
fn attitude_stays_unit_through_flip() {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);
    let schedule = FlipParams::new(2, params)
        .unwrap()
        .to_sequence(start, 10 * Unit::Millisecond)
        .unwrap();
    let end = schedule.end_epoch().unwrap();

    let dynamics = RigidBody::new(params, schedule);
    let setup = Propagator::default(dynamics);
    let mut prop = setup.with(QuadState::hover(start));

    let (_, traj) = prop.until_epoch_with_traj(end).unwrap();

    for state in &traj.states {
        assert!(
            (state.attitude_norm() - 1.0).abs() < 1e-12,
            "attitude drifted off the unit sphere at {}",
            state.epoch
        );
    }
}

#[test]
fn time_accounting_with_partial_final_step() {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);

    let dynamics = RigidBody::hovering(params);
    let setup = Propagator::default(dynamics);
    let mut prop = setup.with(QuadState::hover(start));

    // Not a multiple of the 5 ms step: the last step must be an exact partial one
    let duration = 1.2345 * Unit::Second;
    let (end_state, traj) = prop.for_duration_with_traj(duration).unwrap();

    assert_eq!(end_state.epoch, start + duration);
    assert_eq!(traj.first().epoch, start);
    assert_eq!(traj.last().epoch, start + duration);

    // 246 whole steps, one partial step, and the initial state
    assert_eq!(traj.states.len(), 248);
}

#[test]
fn propagation_is_idempotent() {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);
    let schedule = FlipParams::new(3, params)
        .unwrap()
        .to_sequence(start, 10 * Unit::Millisecond)
        .unwrap();

    let sim = Simulation::new(params, QuadState::hover(start), schedule);

    let (first_end, first_traj) = sim.run().unwrap();
    let (second_end, second_traj) = sim.run().unwrap();

    // Bitwise identical: same inputs, same arithmetic, same log
    assert_eq!(first_end, second_end);
    assert_eq!(first_traj.states.len(), second_traj.states.len());
    for (s1, s2) in first_traj.states.iter().zip(second_traj.states.iter()) {
        assert_eq!(s1, s2);
    }
}

#[test]
fn zero_duration_is_a_no_op() {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);
    let init = QuadState::hover(start);

    let dynamics = RigidBody::hovering(params);
    let setup = Propagator::default(dynamics);
    let mut prop = setup.with(init);

    let end_state = prop.for_duration(Duration::ZERO).unwrap();
    assert_eq!(end_state, init);

    let (end_state, traj) = prop.for_duration_with_traj(Duration::ZERO).unwrap();
    assert_eq!(end_state, init);
    assert_eq!(traj.states.len(), 1);
}

#[test]
fn adaptive_step_matches_fixed_step_hover() {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);

    let dynamics = RigidBody::hovering(params);
    let fixed = Propagator::default(dynamics.clone());
    let adaptive = Propagator::dormand45(dynamics, PropOpts::with_tolerance(1e-12));

    let fixed_end = fixed
        .with(QuadState::hover(start))
        .for_duration(2 * Unit::Second)
        .unwrap();
    let adaptive_end = adaptive
        .with(QuadState::hover(start))
        .for_duration(2 * Unit::Second)
        .unwrap();

    assert_eq!(fixed_end.epoch, adaptive_end.epoch);
    assert!((fixed_end.radius_m - adaptive_end.radius_m).norm() < 1e-9);
    assert!((fixed_end.velocity_m_s - adaptive_end.velocity_m_s).norm() < 1e-9);
}
