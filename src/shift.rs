use ndarray::{Array1, ArrayBase, Data, Ix1, s};

use crate::RESTING_POTENTIAL;

/// Copy of `voltage` delayed by `offset` samples.
///
/// The first `offset` samples are filled with [`RESTING_POTENTIAL`] and
/// whatever is shifted past the end of the trace is dropped.
pub fn delayed<T: Data<Elem = f64>>(voltage: &ArrayBase<T, Ix1>, offset: usize) -> Array1<f64> {
    let n = voltage.len();
    let offset = offset.min(n);
    let mut out = Array1::from_elem(n, RESTING_POTENTIAL);
    out.slice_mut(s![offset..])
        .assign(&voltage.slice(s![..n - offset]));
    out
}
