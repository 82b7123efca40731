extern crate log;
extern crate multiflip;
extern crate pretty_env_logger as pel;

use hifitime::{Epoch, Unit};
use multiflip::dynamics::guidance::CmdSequence;
use multiflip::io::ExportCfg;
use multiflip::sim::{Simulation, StateParameter};
use multiflip::vehicle::{QuadParams, QuadState};

use std::error::Error;
use std::fs::create_dir_all;

fn main() -> Result<(), Box<dyn Error>> {
    pel::init();

    // The default vehicle is the one meter class quadrotor of the flight arena
    // experiments: one kilogram, 0.2 m arms.
    let params = QuadParams::default();
    println!("{params}");
    println!("hover thrust: {:.3} N", params.hover_thrust_n());

    // An empty schedule: the vehicle holds its hover authority indefinitely.
    let schedule = CmdSequence::hover(&params);

    let epoch = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);
    let mut sim = Simulation::new(params, QuadState::hover(epoch), schedule);
    sim.recovery_tail = 5 * Unit::Second;

    let (end_state, trajectory) = sim.run()?;

    println!("{end_state}");
    println!("{trajectory}");

    // A perfect hover: the vehicle must not have moved.
    println!(
        "position drift: {:.3e} m, velocity drift: {:.3e} m/s",
        end_state.radius_m.norm(),
        end_state.velocity_m_s.norm()
    );

    // Export the full log to parquet for plotting, decimated to 10 Hz.
    create_dir_all("./output_data")?;
    trajectory.to_parquet(
        "./output_data/01_hover.parquet",
        ExportCfg::builder()
            .fields(vec![
                StateParameter::Z,
                StateParameter::VZ,
                StateParameter::Tilt,
                StateParameter::TotalThrust,
            ])
            .step(100 * Unit::Millisecond)
            .build(),
    )?;

    Ok(())
}
