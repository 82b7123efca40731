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

use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, DimName, OVector};

// This determines when to take into consideration the magnitude of the state_delta and
// prevents dividing by too small of a number.
const REL_ERR_THRESH: f64 = 0.1;

/// The Error Control trait manages how a propagator computes the error in the current step.
pub trait ErrorCtrl: Copy + Send + Sync
where
    Self: Sized,
{
    /// Computes the actual error of the current step.
    ///
    /// The `error_est` is the estimated error computed from the difference in the two stages of
    /// adaptive step size integrators. The `candidate` variable is the candidate state, and `cur_state`
    /// is the current state. This function must return the error.
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>;
}

/// An RSS step error control which effectively computes the L2 norm of the provided vector of size 3
///
/// Note that this error controller should be preferably be used only with slices of a state with the same units.
/// For example, one should probably use this for position independently of using it for the velocity.
#[derive(Clone, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub struct RSSStep;
impl ErrorCtrl for RSSStep {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        let mag = (candidate - cur_state).norm();
        let err = error_est.norm();
        if mag > REL_ERR_THRESH {
            err / mag
        } else {
            err
        }
    }
}

/// An RSS state error control: when in doubt, use this error controller, especially for high accuracy.
///
/// This is a more stringent error control method than [RSSStep]: it weighs the error by the
/// average magnitude of the state over the step rather than by the change in the state, so a
/// near-stationary component does not inflate the relative error.
#[derive(Clone, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub struct RSSState;
impl ErrorCtrl for RSSState {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        let mag = 0.5 * (candidate + cur_state).norm();
        let err = error_est.norm();
        if mag > REL_ERR_THRESH {
            err / mag
        } else {
            err
        }
    }
}

/// A largest error control which effectively computes the largest error at each component
///
/// This is a standard error computation algorithm, but it's arguably bad if the state's components have different units.
/// It calculates the largest local estimate of the error from the integration (`error_est`)
/// given the difference in the candidate state and the previous state (`state_delta`).
#[derive(Clone, Copy)]
pub struct LargestError;
impl ErrorCtrl for LargestError {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        let state_delta = candidate - cur_state;
        let mut max_err = 0.0;
        for (i, prop_err_i) in error_est.iter().enumerate() {
            let err = if state_delta[i] > REL_ERR_THRESH {
                (prop_err_i / state_delta[i]).abs()
            } else {
                prop_err_i.abs()
            };
            if err > max_err {
                max_err = err;
            }
        }
        max_err
    }
}

/// An RSS state error control for the 13-dimensional rigid body state, evaluating the error
/// separately on the position, velocity, attitude quaternion and body rate slices, and
/// returning the largest.
///
/// The slices carry different units, so a plain norm over the full vector would let the
/// largest-magnitude component (usually the body rates during a flip) mask a drift in the
/// position. Falls back to [RSSStep] for states of any other dimension.
#[derive(Clone, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub struct RSSQuadStep;
impl ErrorCtrl for RSSQuadStep {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        if N::dim() < 13 {
            return RSSStep::estimate(error_est, candidate, cur_state);
        }

        let err_radius = RSSStep::estimate::<crate::linalg::Const<3>>(
            &error_est.fixed_rows::<3>(0).into_owned(),
            &candidate.fixed_rows::<3>(0).into_owned(),
            &cur_state.fixed_rows::<3>(0).into_owned(),
        );
        let err_velocity = RSSStep::estimate::<crate::linalg::Const<3>>(
            &error_est.fixed_rows::<3>(3).into_owned(),
            &candidate.fixed_rows::<3>(3).into_owned(),
            &cur_state.fixed_rows::<3>(3).into_owned(),
        );
        let err_attitude = RSSStep::estimate::<crate::linalg::Const<4>>(
            &error_est.fixed_rows::<4>(6).into_owned(),
            &candidate.fixed_rows::<4>(6).into_owned(),
            &cur_state.fixed_rows::<4>(6).into_owned(),
        );
        let err_rate = RSSStep::estimate::<crate::linalg::Const<3>>(
            &error_est.fixed_rows::<3>(10).into_owned(),
            &candidate.fixed_rows::<3>(10).into_owned(),
            &cur_state.fixed_rows::<3>(10).into_owned(),
        );

        err_radius.max(err_velocity).max(err_attitude).max(err_rate)
    }
}

#[cfg(test)]
mod ut_error_ctrl {
    use super::{ErrorCtrl, RSSQuadStep, RSSStep};
    use crate::linalg::{Const, OVector, Vector3};

    #[test]
    fn rss_step_small_magnitude() {
        let err = Vector3::new(1e-9, 0.0, 0.0);
        let candidate = Vector3::new(1e-3, 0.0, 0.0);
        let cur_state = Vector3::zeros();
        // Below the relative threshold, the error is absolute
        assert!((RSSStep::estimate(&err, &candidate, &cur_state) - 1e-9).abs() < f64::EPSILON);
    }

    #[test]
    fn quad_step_takes_largest_slice() {
        let mut err = OVector::<f64, Const<13>>::zeros();
        // Large relative error on the body rates only
        err[10] = 1e-3;
        let mut candidate = OVector::<f64, Const<13>>::zeros();
        candidate[10] = 10.0;
        let cur_state = OVector::<f64, Const<13>>::zeros();

        let est = RSSQuadStep::estimate(&err, &candidate, &cur_state);
        assert!((est - 1e-4).abs() < 1e-12);
    }
}
