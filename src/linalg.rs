//! Strided vector primitives used by the selection and reproduction code.
//!
//! Every routine takes BLAS-style `(length, slice, increment)` triples: the
//! `i`-th logical element of `x` is `x[i * incx]`. The optimizer only talks to
//! the [`LinearAlgebra`] trait, so the portable loops in [`Portable`] and the
//! `nalgebra`-backed [`Dense`] backend (feature `nalgebra`) are
//! interchangeable. Backends must agree up to floating-point rounding.
//!
//! # Panics
//!
//! All routines panic if a slice is too short for the requested length and
//! increment, like slice indexing does.

/// Binary elementwise operation selector for [`LinearAlgebra::elementwise`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Elementwise {
    /// `out = x + y`
    Add,
    /// `out = x - y`
    Sub,
    /// `out = x * y`
    Mul,
    /// `out = x / y`
    Div,
    /// `out = x ^ y`
    Pow,
}

impl Elementwise {
    #[inline]
    fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Add => x + y,
            Self::Sub => x - y,
            Self::Mul => x * y,
            Self::Div => x / y,
            Self::Pow => x.powf(y),
        }
    }
}

/// Strided vector arithmetic.
///
/// The required methods are the primitive kernels; the provided methods are
/// contiguous shorthands built on them.
pub trait LinearAlgebra {
    /// `out[i*incout] = op(x[i*incx], y[i*incy])` for `i < n`.
    #[allow(clippy::too_many_arguments)]
    fn elementwise(
        &self,
        op: Elementwise,
        n: usize,
        x: &[f64],
        incx: usize,
        y: &[f64],
        incy: usize,
        out: &mut [f64],
        incout: usize,
    );

    /// `out[i*incout] = exp(x[i*incx])`.
    fn exp(&self, n: usize, x: &[f64], incx: usize, out: &mut [f64], incout: usize);

    /// `x = alpha * x`.
    fn scal(&self, n: usize, alpha: f64, x: &mut [f64], incx: usize);

    /// Inner product of `x` and `y`.
    fn dot(&self, n: usize, x: &[f64], incx: usize, y: &[f64], incy: usize) -> f64;

    /// `y = alpha * x + y`.
    fn axpy(&self, n: usize, alpha: f64, x: &[f64], incx: usize, y: &mut [f64], incy: usize);

    /// `y = x + beta * y`.
    fn xpby(&self, n: usize, x: &[f64], incx: usize, beta: f64, y: &mut [f64], incy: usize);

    /// `y = x`.
    fn copy(&self, n: usize, x: &[f64], incx: usize, y: &mut [f64], incy: usize);

    /// A zero-filled scratch buffer of length `n`.
    fn allocate(&self, n: usize) -> Vec<f64> {
        vec![0.0; n]
    }

    /// Contiguous `out = x - y`.
    fn sub(&self, x: &[f64], y: &[f64], out: &mut [f64]) {
        self.elementwise(Elementwise::Sub, out.len(), x, 1, y, 1, out, 1);
    }

    /// Contiguous `out = x / y`.
    fn div(&self, x: &[f64], y: &[f64], out: &mut [f64]) {
        self.elementwise(Elementwise::Div, out.len(), x, 1, y, 1, out, 1);
    }

    /// Contiguous `out = x * y`.
    fn mul(&self, x: &[f64], y: &[f64], out: &mut [f64]) {
        self.elementwise(Elementwise::Mul, out.len(), x, 1, y, 1, out, 1);
    }

    /// Contiguous `out = x + y`.
    fn add(&self, x: &[f64], y: &[f64], out: &mut [f64]) {
        self.elementwise(Elementwise::Add, out.len(), x, 1, y, 1, out, 1);
    }
}

/// Plain-loop backend with no dependencies. The default everywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Portable;

impl LinearAlgebra for Portable {
    fn elementwise(
        &self,
        op: Elementwise,
        n: usize,
        x: &[f64],
        incx: usize,
        y: &[f64],
        incy: usize,
        out: &mut [f64],
        incout: usize,
    ) {
        for i in 0..n {
            out[i * incout] = op.apply(x[i * incx], y[i * incy]);
        }
    }

    fn exp(&self, n: usize, x: &[f64], incx: usize, out: &mut [f64], incout: usize) {
        for i in 0..n {
            out[i * incout] = x[i * incx].exp();
        }
    }

    fn scal(&self, n: usize, alpha: f64, x: &mut [f64], incx: usize) {
        for i in 0..n {
            x[i * incx] *= alpha;
        }
    }

    fn dot(&self, n: usize, x: &[f64], incx: usize, y: &[f64], incy: usize) -> f64 {
        (0..n).map(|i| x[i * incx] * y[i * incy]).sum()
    }

    fn axpy(&self, n: usize, alpha: f64, x: &[f64], incx: usize, y: &mut [f64], incy: usize) {
        for i in 0..n {
            y[i * incy] += alpha * x[i * incx];
        }
    }

    fn xpby(&self, n: usize, x: &[f64], incx: usize, beta: f64, y: &mut [f64], incy: usize) {
        for i in 0..n {
            y[i * incy] = x[i * incx] + beta * y[i * incy];
        }
    }

    fn copy(&self, n: usize, x: &[f64], incx: usize, y: &mut [f64], incy: usize) {
        for i in 0..n {
            y[i * incy] = x[i * incx];
        }
    }
}

/// `nalgebra`-backed kernels for unit-stride calls.
///
/// Strided calls fall back to [`Portable`].
#[cfg(feature = "nalgebra")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dense;

#[cfg(feature = "nalgebra")]
impl LinearAlgebra for Dense {
    fn elementwise(
        &self,
        op: Elementwise,
        n: usize,
        x: &[f64],
        incx: usize,
        y: &[f64],
        incy: usize,
        out: &mut [f64],
        incout: usize,
    ) {
        Portable.elementwise(op, n, x, incx, y, incy, out, incout);
    }

    fn exp(&self, n: usize, x: &[f64], incx: usize, out: &mut [f64], incout: usize) {
        Portable.exp(n, x, incx, out, incout);
    }

    fn scal(&self, n: usize, alpha: f64, x: &mut [f64], incx: usize) {
        if incx == 1 {
            nalgebra::DVectorViewMut::from_slice(&mut x[..n], n).scale_mut(alpha);
        } else {
            Portable.scal(n, alpha, x, incx);
        }
    }

    fn dot(&self, n: usize, x: &[f64], incx: usize, y: &[f64], incy: usize) -> f64 {
        if incx == 1 && incy == 1 {
            let x = nalgebra::DVectorView::from_slice(&x[..n], n);
            let y = nalgebra::DVectorView::from_slice(&y[..n], n);
            x.dot(&y)
        } else {
            Portable.dot(n, x, incx, y, incy)
        }
    }

    fn axpy(&self, n: usize, alpha: f64, x: &[f64], incx: usize, y: &mut [f64], incy: usize) {
        if incx == 1 && incy == 1 {
            let x = nalgebra::DVectorView::from_slice(&x[..n], n);
            nalgebra::DVectorViewMut::from_slice(&mut y[..n], n).axpy(alpha, &x, 1.0);
        } else {
            Portable.axpy(n, alpha, x, incx, y, incy);
        }
    }

    fn xpby(&self, n: usize, x: &[f64], incx: usize, beta: f64, y: &mut [f64], incy: usize) {
        if incx == 1 && incy == 1 {
            let x = nalgebra::DVectorView::from_slice(&x[..n], n);
            nalgebra::DVectorViewMut::from_slice(&mut y[..n], n).axpy(1.0, &x, beta);
        } else {
            Portable.xpby(n, x, incx, beta, y, incy);
        }
    }

    fn copy(&self, n: usize, x: &[f64], incx: usize, y: &mut [f64], incy: usize) {
        if incx == 1 && incy == 1 {
            y[..n].copy_from_slice(&x[..n]);
        } else {
            Portable.copy(n, x, incx, y, incy);
        }
    }
}
