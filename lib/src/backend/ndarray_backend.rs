use super::{stable_sigmoid, Backend};
use ndarray::{concatenate, s, Array1, Array2, Axis};
use std::ops::Range;

/// CPU backend built on the `ndarray` crate.
///
/// # Type mappings
/// - `Scalar`: `f64`
/// - `Tensor1D`: `ndarray::Array1<f64>`
/// - `Tensor2D`: [`NdarrayTensor2D`] wrapper around `ndarray::Array2<f64>`
///
/// Produces the same values as [`CpuBackend`](super::CpuBackend) up to
/// floating-point summation order.
#[derive(Clone, Debug, Copy)]
pub struct NdarrayBackend;

/// Wrapper type for 2D tensors using ndarray's `Array2<f64>`.
///
/// # Example
/// ```
/// use logitfit::backend::NdarrayTensor2D;
///
/// let tensor = NdarrayTensor2D::from(&[
///     vec![1.0, 2.0, 3.0],
///     vec![4.0, 5.0, 6.0],
/// ][..]);
/// assert_eq!(tensor.0.shape(), &[2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct NdarrayTensor2D(pub Array2<f64>);

impl From<&[Vec<f64>]> for NdarrayTensor2D {
    /// Converts a slice of row vectors into a 2D tensor.
    ///
    /// # Panics
    /// Panics if rows have inconsistent lengths.
    fn from(x: &[Vec<f64>]) -> Self {
        let rows = x.len();
        if rows == 0 {
            return NdarrayTensor2D(Array2::zeros((0, 0)));
        }
        let cols = x[0].len();
        assert!(
            x.iter().all(|r| r.len() == cols),
            "All rows must have same length"
        );
        NdarrayTensor2D(Array2::from_shape_fn((rows, cols), |(i, j)| x[i][j]))
    }
}

impl Backend for NdarrayBackend {
    type Scalar = f64;
    type Tensor1D = Array1<f64>;
    type Tensor2D = NdarrayTensor2D;
    fn zeros_1d(len: usize) -> Self::Tensor1D {
        Array1::zeros(len)
    }

    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        NdarrayTensor2D(Array2::zeros((rows, cols)))
    }

    fn from_vec_1d(data: Vec<f64>) -> Self::Tensor1D {
        Array1::from_vec(data)
    }

    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    fn from_vec_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D {
        assert_eq!(data.len(), rows * cols, "Inconsistent shape");
        NdarrayTensor2D(Array2::from_shape_fn((rows, cols), |(i, j)| {
            data[i * cols + j]
        }))
    }

    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Length mismatch");
        a + b
    }

    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Length mismatch");
        a - b
    }

    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Length mismatch");
        a * b
    }

    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t * *s
    }

    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t + *s
    }

    fn map_1d<F>(t: &Self::Tensor1D, f: F) -> Self::Tensor1D
    where
        F: Fn(Self::Scalar) -> Self::Scalar,
    {
        t.mapv(f)
    }

    fn sigmoid_1d(x: &Self::Tensor1D) -> Self::Tensor1D {
        x.mapv(stable_sigmoid)
    }

    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.sum()
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.to_vec()
    }

    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.iter().copied().collect()
    }

    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }

    fn get_1d(t: &Self::Tensor1D, index: usize) -> Self::Scalar {
        t[index]
    }

    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        t.0.dim()
    }

    fn slice_1d(t: &Self::Tensor1D, range: Range<usize>) -> Self::Tensor1D {
        t.slice(s![range]).to_owned()
    }

    fn concat_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a.iter().chain(b.iter()).copied().collect()
    }

    fn slice_rows_2d(t: &Self::Tensor2D, range: Range<usize>) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.slice(s![range, ..]).to_owned())
    }

    fn row_2d(t: &Self::Tensor2D, index: usize) -> Self::Tensor1D {
        t.0.row(index).to_owned()
    }

    fn stack_columns_1d(columns: &[Self::Tensor1D]) -> Self::Tensor2D {
        if columns.is_empty() {
            return NdarrayTensor2D(Array2::zeros((0, 0)));
        }
        let rows = columns[0].len();
        assert!(
            columns.iter().all(|c| c.len() == rows),
            "All columns must have same length"
        );
        let views: Vec<_> = columns.iter().map(|c| c.view().insert_axis(Axis(1))).collect();
        let stacked = match concatenate(Axis(1), &views) {
            Ok(stacked) => stacked,
            Err(e) => panic!("column stacking failed: {e}"),
        };
        NdarrayTensor2D(stacked)
    }

    fn matvec(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.0.ncols(), x.len(), "Dimension mismatch in matvec");
        a.0.dot(x)
    }

    fn matvec_transposed(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(
            a.0.nrows(),
            x.len(),
            "Dimension mismatch in matvec_transposed"
        );
        a.0.t().dot(x)
    }
}

#[cfg(test)]
#[cfg(feature = "ndarray")]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn tensor2d_from(data: &[Vec<f64>]) -> NdarrayTensor2D {
        NdarrayTensor2D::from(data)
    }

    #[test]
    fn test_from_vec_2d_row_major() {
        let t = NdarrayBackend::from_vec_2d(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(NdarrayBackend::shape(&t), (2, 3));
        assert_eq!(t.0[[1, 0]], 4.0);
        assert_eq!(
            NdarrayBackend::to_vec_2d(&t),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_matvec_and_transposed() {
        let a = tensor2d_from(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let y = NdarrayBackend::matvec(&a, &array![1.0, 0.0, -1.0]);
        assert_eq!(y, array![-2.0, -2.0]);

        let yt = NdarrayBackend::matvec_transposed(&a, &array![1.0, 2.0]);
        assert_eq!(yt, array![9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_sigmoid_stable() {
        let s = NdarrayBackend::sigmoid_1d(&array![-800.0, 0.0, 800.0]);
        assert_abs_diff_eq!(s[0], 0.0);
        assert_abs_diff_eq!(s[1], 0.5);
        assert_abs_diff_eq!(s[2], 1.0);
    }

    #[test]
    fn test_slicing() {
        let a = tensor2d_from(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        let tail = NdarrayBackend::slice_rows_2d(&a, 1..3);
        assert_eq!(NdarrayBackend::to_vec_2d(&tail), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(NdarrayBackend::row_2d(&a, 0), array![1.0, 2.0]);

        let v = array![1.0, 2.0, 3.0];
        assert_eq!(NdarrayBackend::slice_1d(&v, 1..3), array![2.0, 3.0]);
        assert_eq!(
            NdarrayBackend::concat_1d(&v, &array![4.0]),
            array![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_stack_columns() {
        let t = NdarrayBackend::stack_columns_1d(&[array![1.0, 3.0], array![2.0, 4.0]]);
        assert_eq!(NdarrayBackend::shape(&t), (2, 2));
        assert_eq!(NdarrayBackend::to_vec_2d(&t), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_nested_vec() {
        let t = tensor2d_from(&[]);
        assert_eq!(NdarrayBackend::shape(&t), (0, 0));
    }
}
