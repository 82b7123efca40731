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

use super::{CsvSnafu, InputOutputError};
use crate::time::Epoch;
use crate::vehicle::QuadState;
use csv::{QuoteStyle, Writer, WriterBuilder};
use snafu::ResultExt;
use std::fs::File;
use std::path::Path;

/// Exports a trajectory to the whitespace-delimited XYZV data type consumed by
/// external animation tooling: one `t x y z qx qy qz qw` row per sample, with the
/// time in seconds past the first exported sample.
pub struct XyzvExporter {
    wtr: Writer<File>,
    ref_epoch: Option<Epoch>,
}

impl XyzvExporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, InputOutputError> {
        Ok(Self {
            wtr: WriterBuilder::new()
                .delimiter(b' ')
                .quote_style(QuoteStyle::Never)
                .has_headers(false)
                .from_path(path)
                .context(CsvSnafu {
                    action: "creating XYZV file",
                })?,
            ref_epoch: None,
        })
    }

    /// Appends one row. The first appended state defines the time origin.
    pub fn append(&mut self, state: &QuadState) -> Result<(), InputOutputError> {
        let ref_epoch = *self.ref_epoch.get_or_insert(state.epoch);
        let q = state.attitude.into_inner();

        self.wtr
            .write_record(&[
                format!("{:.6}", (state.epoch - ref_epoch).to_seconds()),
                format!("{:.9}", state.radius_m.x),
                format!("{:.9}", state.radius_m.y),
                format!("{:.9}", state.radius_m.z),
                format!("{:.12}", q.i),
                format!("{:.12}", q.j),
                format!("{:.12}", q.k),
                format!("{:.12}", q.w),
            ])
            .context(CsvSnafu {
                action: "writing to XYZV file",
            })
    }

    pub fn flush(&mut self) -> Result<(), InputOutputError> {
        self.wtr.flush().map_err(|e| InputOutputError::StdIOError {
            source: e.into(),
            action: "flushing XYZV file",
        })
    }
}
