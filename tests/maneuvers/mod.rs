use multiflip::dynamics::guidance::FlipParams;
use multiflip::io::scenario::ScenarioSerde;
use multiflip::io::ConfigRepr;
use multiflip::sim::Simulation;
use multiflip::time::{Epoch, Unit};
use multiflip::vehicle::{QuadParams, QuadState};
use rstest::rstest;
use std::f64::consts::PI;

/// Net rotation about the body X axis, from the trapezoidal integration of the logged
/// roll rate. The rate profile is piecewise linear in time and the log contains every
/// phase boundary, so the quadrature is exact up to floating point noise.
fn net_roll_rad(traj: &multiflip::sim::trajectory::Traj<QuadState>) -> f64 {
    traj.states
        .windows(2)
        .map(|pair| {
            let dt = (pair[1].epoch - pair[0].epoch).to_seconds();
            0.5 * (pair[0].body_rate_rad_s.x + pair[1].body_rate_rad_s.x) * dt
        })
        .sum()
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn flip_returns_to_level(#[case] turns: u32) {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);

    let schedule = FlipParams::new(turns, params)
        .unwrap()
        .to_sequence(start, 10 * Unit::Millisecond)
        .unwrap();
    let schedule_end = schedule.end_epoch().unwrap();

    let sim = Simulation::new(params, QuadState::hover(start), schedule);
    let (end_state, traj) = sim.run().unwrap();

    // The run covers the whole schedule plus the recovery tail
    assert_eq!(end_state.epoch, schedule_end + sim.recovery_tail);

    // Open-loop recovery: back to level with no residual rotation
    assert!(
        end_state.tilt_deg() < 1.0,
        "{turns}-flip ended {:.3} deg off level",
        end_state.tilt_deg()
    );
    assert!(
        end_state.body_rate_rad_s.norm() < 1e-6,
        "{turns}-flip ended with residual rates {:.3e} rad/s",
        end_state.body_rate_rad_s.norm()
    );

    // The vehicle went through the inverted attitude
    let max_tilt = traj
        .states
        .iter()
        .map(|s| s.tilt_deg())
        .fold(0.0_f64, f64::max);
    assert!(max_tilt > 170.0, "max tilt was only {max_tilt:.1} deg");

    // A roll about the body X axis keeps the translation in the y-z plane
    for state in &traj.states {
        assert!(state.radius_m.x.abs() < 1e-9);
        assert!(state.body_rate_rad_s.y.abs() < 1e-9);
        assert!(state.body_rate_rad_s.z.abs() < 1e-9);
    }

    // And the five phases integrate to exactly `turns` revolutions
    let net_roll = net_roll_rad(&traj);
    assert!(
        (net_roll - 2.0 * PI * f64::from(turns)).abs() < 1e-3,
        "net roll of the {turns}-flip was {net_roll:.6} rad"
    );
}

#[test]
fn scenario_driven_flip() {
    let yaml = r#"
- vehicle:
    mass_kg: 1.0
    arm_length_m: 0.2
    inertia_diag_kg_m2: [0.0053, 0.0053, 0.0086]
    thrust_to_drag_m: 0.018
  flip:
    turns: 2
  run:
    step: 5 ms
    recovery_tail: 1 s
"#;
    let scenarios = ScenarioSerde::loads_many(yaml).unwrap();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);

    let sim = Simulation::from_scenario(&scenarios[0], start).unwrap();
    let (end_state, traj) = sim.run().unwrap();

    assert!(end_state.tilt_deg() < 1.0);
    assert!((net_roll_rad(&traj) - 4.0 * PI).abs() < 1e-3);
}

#[test]
fn reduced_rate_flip_coasts_longer() {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);

    let fast = FlipParams::new(1, params)
        .unwrap()
        .to_sequence(start, 10 * Unit::Millisecond)
        .unwrap();
    let slow = FlipParams::new(1, params)
        .unwrap()
        .with_max_rate(1080.0_f64.to_radians())
        .unwrap()
        .to_sequence(start, 10 * Unit::Millisecond)
        .unwrap();

    // Lower peak rate, longer maneuver
    assert!(slow.end_epoch().unwrap() > fast.end_epoch().unwrap());

    let sim = Simulation::new(params, QuadState::hover(start), slow);
    let (end_state, traj) = sim.run().unwrap();
    assert!(end_state.tilt_deg() < 1.0);
    assert!((net_roll_rad(&traj) - 2.0 * PI).abs() < 1e-3);
}
