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

use super::traj_it::TrajIterator;
use super::{ExportCfg, TrajError};
use crate::io::pq_writer;
use crate::linalg::allocator::Allocator;
use crate::linalg::DefaultAllocator;
use crate::sim::StateParameter;
use crate::time::{Duration, Epoch, TimeSeries, Unit};
use crate::State;
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use enum_iterator::all;
use parquet::arrow::ArrowWriter;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::iter::Iterator;
use std::ops;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Store a trajectory of any State.
#[derive(Clone, PartialEq)]
pub struct Traj<S: State>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    /// Optionally name this trajectory
    pub name: Option<String>,
    /// We use a vector because we know that the states are produced in a chronological manner (the direction does not matter).
    pub states: Vec<S>,
}

impl<S: State> Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    pub fn new() -> Self {
        Self {
            name: None,
            states: Vec::new(),
        }
    }

    /// Orders the states chronologically and removes duplicate epochs, can be used to
    /// store the states out of order.
    ///
    /// When two samples share an epoch, as happens at the boundary between two
    /// back-to-back propagations, the one logged last wins: it is the first sample of
    /// the later segment, i.e. the state after the guidance handover.
    pub fn finalize(&mut self) {
        // The sort is stable, so equal epochs keep their log order.
        self.states.sort_by_key(|a| a.epoch());
        self.states.reverse();
        self.states.dedup_by_key(|a| a.epoch());
        self.states.reverse();
    }

    /// Returns the sample closest to this specific epoch, erroring if outside of the
    /// logged span. There is no interpolation: the log is dense enough at the
    /// integration rate that the nearest sample is the state at that epoch.
    pub fn at(&self, epoch: Epoch) -> Result<S, TrajError> {
        if self.states.is_empty() || self.first().epoch() > epoch || self.last().epoch() < epoch {
            return Err(TrajError::NoDataAt { epoch });
        }
        match self
            .states
            .binary_search_by(|state| state.epoch().cmp(&epoch))
        {
            Ok(idx) => Ok(self.states[idx]),
            Err(idx) => {
                // The binary search returns where this epoch would be inserted, so the
                // bracketing samples are at idx-1 and idx. Bounds were checked above.
                let before = self.states[idx - 1];
                let after = self.states[idx];
                if epoch - before.epoch() <= after.epoch() - epoch {
                    Ok(before)
                } else {
                    Ok(after)
                }
            }
        }
    }

    /// Returns the first state in this trajectory
    pub fn first(&self) -> &S {
        // This is done after we've ordered the states we received, so we can just return the first state.
        self.states.first().unwrap()
    }

    /// Returns the last state in this trajectory
    pub fn last(&self) -> &S {
        self.states.last().unwrap()
    }

    /// Creates an iterator through the trajectory by the provided step size
    pub fn every(&self, step: Duration) -> TrajIterator<S> {
        self.every_between(step, self.first().epoch(), self.last().epoch())
    }

    /// Creates an iterator through the trajectory by the provided step size between the provided bounds
    pub fn every_between(&self, step: Duration, start: Epoch, end: Epoch) -> TrajIterator<S> {
        TrajIterator {
            time_series: TimeSeries::inclusive(start, end, step),
            traj: self,
        }
    }

    /// Store this trajectory to a parquet file with the default configuration.
    pub fn to_parquet_simple<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, Box<dyn Error>> {
        self.to_parquet(path, ExportCfg::default())
    }

    /// Store this trajectory to a parquet file, one state per sample at this
    /// trajectory's own rate unless the config sets an epoch range or step.
    pub fn to_parquet<P: AsRef<Path>>(
        &self,
        path: P,
        cfg: ExportCfg,
    ) -> Result<PathBuf, Box<dyn Error>> {
        if self.states.is_empty() {
            return Err(Box::new(TrajError::CreationError {
                msg: "no states to export".to_string(),
            }));
        }

        // Build the schema
        let mut hdrs = vec![
            Field::new("Epoch:Gregorian UTC", DataType::Utf8, false),
            Field::new("Epoch:Gregorian TAI", DataType::Utf8, false),
            Field::new("Epoch:TAI (s)", DataType::Float64, false),
        ];

        let mut fields = match cfg.fields.clone() {
            Some(fields) => fields,
            None => all::<StateParameter>().collect(),
        };

        // Check that we can retrieve this information
        fields.retain(|param| match self.first().value(*param) {
            Ok(_) => true,
            Err(_) => {
                warn!("Removed unavailable field `{param}` from trajectory export",);
                false
            }
        });

        for field in &fields {
            hdrs.push(field.to_field(None));
        }

        // Build the schema
        let schema = Arc::new(Schema::new(hdrs));
        let mut record = Vec::new();

        // Build the list of exported states
        let states: Vec<S> =
            if cfg.start_epoch.is_some() || cfg.end_epoch.is_some() || cfg.step.is_some() {
                let start = cfg.start_epoch.unwrap_or_else(|| self.first().epoch());
                let end = cfg.end_epoch.unwrap_or_else(|| self.last().epoch());
                let step = cfg.step.unwrap_or_else(|| 5 * Unit::Millisecond);

                self.every_between(step, start, end).collect()
            } else {
                self.states.clone()
            };

        record.push(Arc::new(StringArray::from(
            states
                .iter()
                .map(|s| format!("{}", s.epoch()))
                .collect::<Vec<String>>(),
        )) as ArrayRef);

        record.push(Arc::new(StringArray::from(
            states
                .iter()
                .map(|s| format!("{:x}", s.epoch()))
                .collect::<Vec<String>>(),
        )) as ArrayRef);

        record.push(Arc::new(Float64Array::from(
            states
                .iter()
                .map(|s| s.epoch().to_tai_seconds())
                .collect::<Vec<f64>>(),
        )) as ArrayRef);

        // Add all of the fields
        for field in fields {
            record.push(Arc::new(Float64Array::from(
                states
                    .iter()
                    .map(|s| s.value(field).unwrap())
                    .collect::<Vec<f64>>(),
            )) as ArrayRef);
        }

        let mut metadata = HashMap::new();
        metadata.insert("Purpose".to_string(), "Trajectory data".to_string());
        if let Some(add_meta) = cfg.metadata.clone() {
            for (k, v) in add_meta {
                metadata.insert(k, v);
            }
        }

        let props = pq_writer(Some(metadata));

        let path_buf = cfg.actual_path(path);

        let file = File::create(&path_buf)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), props)?;

        let batch = RecordBatch::try_new(schema, record)?;
        writer.write(&batch)?;
        writer.close()?;

        info!("Trajectory written to {}", path_buf.display());

        // Return the path this was written to
        Ok(path_buf)
    }
}

impl<S: State> ops::Add for Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    type Output = Traj<S>;

    /// Add one trajectory to another. If they do not overlap, a warning will be printed.
    fn add(self, other: Traj<S>) -> Self::Output {
        self + &other
    }
}

impl<S: State> ops::Add<&Traj<S>> for Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    type Output = Traj<S>;

    /// Add one trajectory to another. If they do not overlap, a warning will be printed.
    fn add(self, other: &Traj<S>) -> Self::Output {
        let (first, second) = if self.first().epoch() < other.first().epoch() {
            (&self, other)
        } else {
            (other, &self)
        };

        if first.last().epoch() < second.first().epoch() {
            let gap = second.first().epoch() - first.last().epoch();
            warn!(
                "Resulting merged trajectory will have a time-gap of {} starting at {}",
                gap,
                first.last().epoch()
            );
        }

        let mut me = self.clone();
        for state in &other.states {
            me.states.push(*state);
        }
        me.finalize();
        me
    }
}

impl<S: State> ops::AddAssign for Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    fn add_assign(&mut self, rhs: Self) {
        *self = self.clone() + rhs;
    }
}

impl<S: State> ops::AddAssign<&Traj<S>> for Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    fn add_assign(&mut self, rhs: &Self) {
        *self = self.clone() + rhs;
    }
}

impl<S: State> fmt::Display for Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dur = self.last().epoch() - self.first().epoch();
        write!(
            f,
            "Trajectory from {} to {} ({}, or {:.3} s) [{} states]",
            self.first().epoch(),
            self.last().epoch(),
            dur,
            dur.to_seconds(),
            self.states.len()
        )
    }
}

impl<S: State> fmt::Debug for Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}",)
    }
}

impl<S: State> Default for Traj<S>
where
    DefaultAllocator:
        Allocator<S::VecLength> + Allocator<S::Size> + Allocator<S::Size, S::Size>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod ut_traj {
    use super::Traj;
    use crate::time::{Epoch, Unit};
    use crate::vehicle::QuadState;

    #[test]
    fn finalize_keeps_later_duplicate() {
        let t0 = Epoch::from_tai_seconds(0.0);
        let mut first = QuadState::hover(t0);
        first.motor_thrusts_n = [1.0; 4];
        let mut second = QuadState::hover(t0);
        second.motor_thrusts_n = [2.0; 4];

        let mut traj = Traj::new();
        traj.states.push(first);
        traj.states.push(QuadState::hover(t0 + 1 * Unit::Second));
        traj.states.push(second);
        traj.finalize();

        assert_eq!(traj.states.len(), 2);
        assert_eq!(traj.first().motor_thrusts_n, [2.0; 4]);
    }

    #[test]
    fn at_returns_nearest_sample() {
        let t0 = Epoch::from_tai_seconds(0.0);
        let mut traj = Traj::new();
        for ii in 0..=10 {
            traj.states
                .push(QuadState::hover(t0 + (5 * ii) * Unit::Millisecond));
        }
        traj.finalize();

        // Exact sample
        let sample = traj.at(t0 + 10 * Unit::Millisecond).unwrap();
        assert_eq!(sample.epoch, t0 + 10 * Unit::Millisecond);
        // Nearest sample
        let sample = traj.at(t0 + 11 * Unit::Millisecond).unwrap();
        assert_eq!(sample.epoch, t0 + 10 * Unit::Millisecond);
        let sample = traj.at(t0 + 13 * Unit::Millisecond).unwrap();
        assert_eq!(sample.epoch, t0 + 15 * Unit::Millisecond);
        // Out of bounds
        assert!(traj.at(t0 - 1 * Unit::Second).is_err());
        assert!(traj.at(t0 + 1 * Unit::Minute).is_err());
    }

    #[test]
    fn merge_is_chronological() {
        let t0 = Epoch::from_tai_seconds(0.0);
        let mut earlier = Traj::new();
        let mut later = Traj::new();
        for ii in 0..=4 {
            earlier
                .states
                .push(QuadState::hover(t0 + ii * Unit::Second));
            later
                .states
                .push(QuadState::hover(t0 + (ii + 4) * Unit::Second));
        }
        earlier.finalize();
        later.finalize();

        let merged = later + &earlier;
        assert_eq!(merged.first().epoch, t0);
        assert_eq!(merged.last().epoch, t0 + 8 * Unit::Second);
        // The shared boundary epoch is logged once
        assert_eq!(merged.states.len(), 9);
    }
}
