use super::{stable_sigmoid, Backend};
use std::ops::Range;

#[derive(Clone, Debug, Copy)]
pub struct CpuBackend;

/// Row-major matrix: `(data, rows, cols)`.
#[derive(Debug, Clone)]
pub struct CpuTensor2D(pub Vec<f64>, pub usize, pub usize);

impl CpuTensor2D {
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols, "Inconsistent shape");
        Self(data, rows, cols)
    }

    fn row_slice(&self, index: usize) -> &[f64] {
        let cols = self.2;
        &self.0[index * cols..(index + 1) * cols]
    }
}

impl From<&[Vec<f64>]> for CpuTensor2D {
    fn from(x: &[Vec<f64>]) -> Self {
        if x.is_empty() {
            return CpuTensor2D::new(Vec::new(), 0, 0);
        }
        let rows = x.len();
        let cols = x[0].len();
        assert!(
            x.iter().all(|row| row.len() == cols),
            "All rows must have same length"
        );
        let data: Vec<f64> = x.iter().flat_map(|row| row.iter()).copied().collect();
        CpuTensor2D::new(data, rows, cols)
    }
}

impl Backend for CpuBackend {
    type Scalar = f64;
    type Tensor1D = Vec<f64>;
    type Tensor2D = CpuTensor2D;
    // --- Constructors ---
    fn zeros_1d(len: usize) -> Self::Tensor1D {
        vec![0.; len]
    }
    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(vec![0.; rows * cols], rows, cols)
    }
    fn from_vec_1d(data: Vec<f64>) -> Self::Tensor1D {
        data
    }
    fn from_vec_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(data, rows, cols)
    }

    // --- Element-wise ops ---
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Length mismatch");
        a.iter().zip(b.iter()).map(|(a, b)| a + b).collect()
    }
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Length mismatch");
        a.iter().zip(b.iter()).map(|(a, b)| a - b).collect()
    }
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Length mismatch");
        a.iter().zip(b.iter()).map(|(a, b)| a * b).collect()
    }
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x * s).collect()
    }
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x + s).collect()
    }
    fn map_1d<F>(t: &Self::Tensor1D, f: F) -> Self::Tensor1D
    where
        F: Fn(Self::Scalar) -> Self::Scalar,
    {
        t.iter().map(|&x| f(x)).collect()
    }
    fn sigmoid_1d(x: &Self::Tensor1D) -> Self::Tensor1D {
        x.iter().map(|&z| stable_sigmoid(z)).collect()
    }

    // --- Reductions ---
    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.iter().sum::<f64>()
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    // --- Access ---
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.clone()
    }
    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.clone()
    }
    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }
    fn get_1d(t: &Self::Tensor1D, index: usize) -> Self::Scalar {
        t[index]
    }
    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        (t.1, t.2)
    }

    // --- Slicing ---
    fn slice_1d(t: &Self::Tensor1D, range: Range<usize>) -> Self::Tensor1D {
        t[range].to_vec()
    }
    fn concat_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        let mut out = Vec::with_capacity(a.len() + b.len());
        out.extend_from_slice(a);
        out.extend_from_slice(b);
        out
    }
    fn slice_rows_2d(t: &Self::Tensor2D, range: Range<usize>) -> Self::Tensor2D {
        assert!(range.end <= t.1, "Row range out of bounds");
        let cols = t.2;
        let rows = range.len();
        let data = t.0[range.start * cols..range.end * cols].to_vec();
        CpuTensor2D::new(data, rows, cols)
    }
    fn row_2d(t: &Self::Tensor2D, index: usize) -> Self::Tensor1D {
        assert!(index < t.1, "Row index out of bounds");
        t.row_slice(index).to_vec()
    }
    fn stack_columns_1d(columns: &[Self::Tensor1D]) -> Self::Tensor2D {
        let cols = columns.len();
        let rows = columns.first().map_or(0, Vec::len);
        assert!(
            columns.iter().all(|c| c.len() == rows),
            "All columns must have same length"
        );
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            data.extend(columns.iter().map(|c| c[i]));
        }
        CpuTensor2D::new(data, rows, cols)
    }

    // --- Linear algebra ---
    fn matvec(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.2, x.len(), "Dimension mismatch in matvec");
        (0..a.1)
            .map(|i| {
                a.row_slice(i)
                    .iter()
                    .zip(x.iter())
                    .map(|(w, v)| w * v)
                    .sum::<f64>()
            })
            .collect()
    }

    fn matvec_transposed(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.1, x.len(), "Dimension mismatch in matvec_transposed");
        let mut out = vec![0.0; a.2];
        for (i, &xi) in x.iter().enumerate() {
            for (o, v) in out.iter_mut().zip(a.row_slice(i)) {
                *o += v * xi;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_tensor2d_from_rows() {
        let t = CpuTensor2D::from(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]][..]);
        assert_eq!(CpuBackend::shape(&t), (3, 2));
        assert_eq!(CpuBackend::row_2d(&t, 2), vec![5.0, 6.0]);
    }

    #[test]
    #[should_panic(expected = "Inconsistent shape")]
    fn test_cpu_tensor2d_inconsistent_shape() {
        let _ = CpuTensor2D::new(vec![1.0, 2.0, 3.0], 2, 2);
    }

    #[test]
    fn test_matvec() {
        let a = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let x = vec![1.0, 0.0, -1.0];
        assert_eq!(CpuBackend::matvec(&a, &x), vec![-2.0, -2.0]);
    }

    #[test]
    fn test_matvec_transposed() {
        let a = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let x = vec![1.0, 2.0];
        assert_eq!(CpuBackend::matvec_transposed(&a, &x), vec![9.0, 12.0, 15.0]);
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch in matvec")]
    fn test_matvec_dimension_mismatch() {
        let a = CpuTensor2D::new(vec![1.0, 2.0], 1, 2);
        let _ = CpuBackend::matvec(&a, &vec![1.0]);
    }

    #[test]
    fn test_sigmoid_1d_extremes() {
        let s = CpuBackend::sigmoid_1d(&vec![-800.0, 0.0, 800.0]);
        assert_eq!(s, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_slice_rows_and_stack_columns() {
        let a = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let tail = CpuBackend::slice_rows_2d(&a, 1..3);
        assert_eq!(tail.0, vec![3.0, 4.0, 5.0, 6.0]);

        let empty = CpuBackend::slice_rows_2d(&a, 3..3);
        assert_eq!(CpuBackend::shape(&empty), (0, 2));

        let stacked = CpuBackend::stack_columns_1d(&[vec![1.0, 3.0], vec![2.0, 4.0]]);
        assert_eq!(stacked.0, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(CpuBackend::shape(&stacked), (2, 2));
    }

    #[test]
    fn test_concat_and_slice_1d() {
        let a = vec![1.0, 2.0];
        let b = vec![3.0];
        let c = CpuBackend::concat_1d(&a, &b);
        assert_eq!(c, vec![1.0, 2.0, 3.0]);
        assert_eq!(CpuBackend::slice_1d(&c, 1..3), vec![2.0, 3.0]);
    }
}
