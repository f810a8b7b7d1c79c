//! PyO3 Python bindings for the streaming rank-order filter.
//!
//! This crate provides thin Python bindings for the rank_core library.
//! All algorithm logic is in rank_core; this crate only handles
//! Python/NumPy type conversions and numpy-style axis normalization.

use numpy::{PyArrayDyn, PyReadonlyArrayDyn, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use rank_core::rank_filter_axis;

/// Resolve a possibly-negative numpy-style axis against `ndim`.
fn normalize_axis(axis: isize, ndim: usize) -> PyResult<usize> {
    let resolved = if axis < 0 { axis + ndim as isize } else { axis };
    if resolved < 0 || resolved as usize >= ndim {
        return Err(PyValueError::new_err(format!(
            "axis {} is out of bounds for array of dimension {}",
            axis, ndim
        )));
    }
    Ok(resolved as usize)
}

/// Rank-order filter along `axis` of a float32 array.
///
/// Output value at each position is the window value at sorted rank
/// `round(rank * 2 * half_length)`, with mirror-reflected boundaries.
#[pyfunction]
#[pyo3(signature = (input, half_length, rank=0.5, axis=-1))]
pub fn rank_filter_f32<'py>(
    py: Python<'py>,
    input: PyReadonlyArrayDyn<f32>,
    half_length: usize,
    rank: f64,
    axis: isize,
) -> PyResult<&'py PyArrayDyn<f32>> {
    let view = input.as_array();
    let axis = normalize_axis(axis, view.ndim())?;
    let output = rank_filter_axis(view, half_length, rank, axis)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(output.to_pyarray(py))
}

/// Rank-order filter along `axis` of a float64 array.
#[pyfunction]
#[pyo3(signature = (input, half_length, rank=0.5, axis=-1))]
pub fn rank_filter_f64<'py>(
    py: Python<'py>,
    input: PyReadonlyArrayDyn<f64>,
    half_length: usize,
    rank: f64,
    axis: isize,
) -> PyResult<&'py PyArrayDyn<f64>> {
    let view = input.as_array();
    let axis = normalize_axis(axis, view.ndim())?;
    let output = rank_filter_axis(view, half_length, rank, axis)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(output.to_pyarray(py))
}

#[pymodule]
fn _rank_filter(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(rank_filter_f32, m)?)?;
    m.add_function(wrap_pyfunction!(rank_filter_f64, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
