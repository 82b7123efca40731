extern crate log;
extern crate multiflip;
extern crate pretty_env_logger as pel;

use hifitime::Epoch;
use multiflip::io::scenario::ScenarioSerde;
use multiflip::io::xyzv::XyzvExporter;
use multiflip::io::{ConfigRepr, ExportCfg};
use multiflip::sim::Simulation;

use std::error::Error;
use std::fs::create_dir_all;

fn main() -> Result<(), Box<dyn Error>> {
    pel::init();

    // Load the triple flip scenario: the vehicle, the flip parameterization, and the
    // run options all live in the YAML file.
    let scenarios = ScenarioSerde::load_many("./data/multi_flip.yaml")?;

    create_dir_all("./output_data")?;

    let epoch = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);

    for (num, scenario) in scenarios.iter().enumerate() {
        let sim = Simulation::from_scenario(scenario, epoch)?;
        println!("{sim}");

        let (end_state, trajectory) = sim.run()?;

        println!("{end_state}");
        println!("{trajectory}");
        println!(
            "final tilt: {:.3} deg, altitude loss: {:.3} m, residual rates: {:.3e} rad/s",
            end_state.tilt_deg(),
            -end_state.radius_m.z,
            end_state.body_rate_rad_s.norm()
        );

        // Full rate export for plotting.
        trajectory.to_parquet(
            format!("./output_data/02_multi_flip_{num}.parquet"),
            ExportCfg::default(),
        )?;

        // And the whitespace-delimited XYZV file for animation tooling.
        let mut exporter =
            XyzvExporter::from_path(format!("./output_data/02_multi_flip_{num}.xyzv"))?;
        for state in &trajectory.states {
            exporter.append(state)?;
        }
        exporter.flush()?;
    }

    Ok(())
}
