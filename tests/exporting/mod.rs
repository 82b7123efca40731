use multiflip::dynamics::guidance::CmdSequence;
use multiflip::io::xyzv::XyzvExporter;
use multiflip::io::ExportCfg;
use multiflip::sim::{Simulation, StateParameter};
use multiflip::time::{Epoch, Unit};
use multiflip::vehicle::{QuadParams, QuadState};
use polars::prelude::*;
use std::fs::{create_dir_all, File};

fn hover_run() -> (QuadState, multiflip::sim::trajectory::Traj<QuadState>) {
    let params = QuadParams::default();
    let start = Epoch::from_gregorian_utc_at_midnight(2023, 11, 25);
    let mut sim = Simulation::new(params, QuadState::hover(start), CmdSequence::hover(&params));
    sim.recovery_tail = 1 * Unit::Second;
    sim.run().unwrap()
}

#[test]
fn parquet_has_one_row_per_sample() {
    let (_, traj) = hover_run();

    create_dir_all("output_data").unwrap();
    let path = traj
        .to_parquet("output_data/ut_hover_full.parquet", ExportCfg::default())
        .unwrap();

    let df = ParquetReader::new(File::open(path).unwrap())
        .finish()
        .unwrap();
    assert_eq!(df.height(), traj.states.len());

    // The three epoch columns plus one column per exportable parameter
    assert!(df.column("Epoch:Gregorian UTC").is_ok());
    assert!(df.column("Epoch:TAI (s)").is_ok());
    assert!(df.column("z (m)").is_ok());
    assert!(df.column("tilt (deg)").is_ok());
    assert!(df.column("total_thrust (N)").is_ok());
}

#[test]
fn parquet_decimated_export() {
    let (_, traj) = hover_run();

    create_dir_all("output_data").unwrap();
    let path = traj
        .to_parquet(
            "output_data/ut_hover_decimated.parquet",
            ExportCfg::builder()
                .fields(vec![StateParameter::Z, StateParameter::VZ])
                .step(100 * Unit::Millisecond)
                .build(),
        )
        .unwrap();

    let df = ParquetReader::new(File::open(path).unwrap())
        .finish()
        .unwrap();
    // One second of hover at 10 Hz, bounds included
    assert_eq!(df.height(), 11);
    assert!(df.column("z (m)").is_ok());
    assert!(df.column("vz (m/s)").is_ok());
    // Only the requested fields made it through
    assert!(df.column("roll (deg)").is_err());
}

#[test]
fn xyzv_has_one_row_per_sample() {
    let (_, traj) = hover_run();

    create_dir_all("output_data").unwrap();
    let path = "output_data/ut_hover.xyzv";
    let mut exporter = XyzvExporter::from_path(path).unwrap();
    for state in &traj.states {
        exporter.append(state).unwrap();
    }
    exporter.flush().unwrap();

    let contents = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), traj.states.len());

    // The first sample defines the time origin and the hover attitude is identity
    let first: Vec<&str> = lines[0].split(' ').collect();
    assert_eq!(first.len(), 8);
    assert_eq!(first[0], "0.000000");
    assert_eq!(first[7], "1.000000000000");
}
