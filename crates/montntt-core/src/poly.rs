//! Fast polynomial multiplication on top of the transforms.
//!
//! [`NttPlan`] bundles everything that depends only on `(prime, n)`: the
//! Montgomery context, forward/inverse root tables in both forms, and the
//! kernel picked at construction. A plan is immutable and `Sync`, so one plan
//! can serve many independent vectors.

#![deny(rust_2018_idioms)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use anyhow::{ensure, Result};

use crate::modarith::mul_mod;
use crate::montgomery::{Mont, MontgomeryContext};
use crate::ntt::{intt_montgomery_core_with, ntt_montgomery_core_with, Kernel};
use crate::primes::NttPrime;
use crate::roots::{compute_roots, MontRootTable, RootTable};

/// `c[i] = a[i]·b[i] mod modulus`.
///
/// # Panics
/// Panics if the lengths differ.
#[must_use]
pub fn pointwise_mul(a: &[u64], b: &[u64], modulus: u64) -> Vec<u64> {
    assert_eq!(a.len(), b.len(), "pointwise product needs equal lengths");
    a.iter().zip(b).map(|(&x, &y)| mul_mod(x, y, modulus)).collect()
}

/// `a[i] ← a[i]·b[i]` in Montgomery form.
///
/// # Panics
/// Panics if the lengths differ.
pub fn pointwise_mul_mont(a: &mut [Mont], b: &[Mont], ctx: &MontgomeryContext) {
    assert_eq!(a.len(), b.len(), "pointwise product needs equal lengths");
    for (x, &y) in a.iter_mut().zip(b) {
        *x = ctx.mul(*x, y);
    }
}

/// Precomputed state for length-`n` transforms over one prime.
#[derive(Clone, Debug)]
pub struct NttPlan {
    prime: NttPrime,
    ctx: MontgomeryContext,
    roots: RootTable,
    mroots: MontRootTable,
    inv_mroots: MontRootTable,
    kernel: Kernel,
}

impl NttPlan {
    /// Build a plan for length `n` (a power of two within the prime's
    /// 2-adicity). The kernel is [`Kernel::detect`]ed once here.
    ///
    /// # Errors
    /// Fails on an unsupported length or an invalid prime description.
    pub fn new(prime: NttPrime, n: usize) -> Result<Self> {
        let root = prime.root_of_unity(n)?;
        let roots = compute_roots(root, n, prime.modulus)?;
        let ctx = MontgomeryContext::new(prime.modulus)?;
        let mroots = ctx.convert_roots(&roots);
        let inv_mroots = mroots.conjugate();
        let kernel = Kernel::detect();

        tracing::debug!(n, modulus = prime.modulus, %kernel, "ntt plan ready");
        Ok(Self {
            prime,
            ctx,
            roots,
            mroots,
            inv_mroots,
            kernel,
        })
    }

    /// Same plan, forced onto `kernel` (still falls back if unavailable).
    #[must_use]
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Transform length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Never true; a plan has at least one point.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The prime this plan works over.
    #[inline]
    #[must_use]
    pub const fn prime(&self) -> NttPrime {
        self.prime
    }

    /// Shared Montgomery context.
    #[inline]
    #[must_use]
    pub const fn context(&self) -> &MontgomeryContext {
        &self.ctx
    }

    /// Forward root table (ordinary form).
    #[inline]
    #[must_use]
    pub const fn roots(&self) -> &RootTable {
        &self.roots
    }

    /// Forward root table (Montgomery form).
    #[inline]
    #[must_use]
    pub const fn mont_roots(&self) -> &MontRootTable {
        &self.mroots
    }

    /// Kernel requested for the Montgomery core.
    #[inline]
    #[must_use]
    pub const fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Forward transform of Montgomery-form data; returns the kernel that ran.
    ///
    /// # Panics
    /// Panics if `a.len() != self.len()`.
    pub fn forward_mont(&self, a: &mut [Mont]) -> Kernel {
        ntt_montgomery_core_with(self.kernel, a, &self.mroots, &self.ctx)
    }

    /// Inverse transform of Montgomery-form data (includes the `n^{-1}` scale).
    ///
    /// # Panics
    /// Panics if `a.len() != self.len()`.
    pub fn inverse_mont(&self, a: &mut [Mont]) -> Kernel {
        intt_montgomery_core_with(self.kernel, a, &self.inv_mroots, &self.ctx)
    }

    /// Forward transform of ordinary residues (converted in and out).
    ///
    /// # Panics
    /// Panics if `a.len() != self.len()`.
    pub fn forward(&self, a: &mut [u64]) {
        let mut m = self.ctx.to_mont_slice(a);
        self.forward_mont(&mut m);
        self.write_back(a, &m);
    }

    /// Inverse transform of ordinary residues.
    ///
    /// # Panics
    /// Panics if `a.len() != self.len()`.
    pub fn inverse(&self, a: &mut [u64]) {
        let mut m = self.ctx.to_mont_slice(a);
        self.inverse_mont(&mut m);
        self.write_back(a, &m);
    }

    fn write_back(&self, dst: &mut [u64], src: &[Mont]) {
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = self.ctx.from_mont(s);
        }
    }

    /// Cyclic convolution of two length-`n` vectors.
    ///
    /// # Panics
    /// Panics if either input length differs from `self.len()`.
    #[must_use]
    pub fn cyclic_convolution(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let mut fa = self.ctx.to_mont_slice(a);
        let mut fb = self.ctx.to_mont_slice(b);
        self.forward_mont(&mut fa);
        self.forward_mont(&mut fb);
        pointwise_mul_mont(&mut fa, &fb, &self.ctx);
        self.inverse_mont(&mut fa);
        self.ctx.from_mont_slice(&fa)
    }
}

/// Product of two polynomials (coefficients low-to-high) modulo `prime`.
///
/// Zero-pads to the next power of two `>= len(a) + len(b) - 1` so no term
/// wraps, then truncates to exactly that length. Inputs are reduced mod `p`.
///
/// # Errors
/// Fails if the padded length exceeds the prime's 2-adicity.
pub fn poly_mul(a: &[u64], b: &[u64], prime: NttPrime) -> Result<Vec<u64>> {
    if a.is_empty() || b.is_empty() {
        return Ok(Vec::new());
    }
    let out_len = a.len() + b.len() - 1;
    let n = out_len.next_power_of_two();
    ensure!(
        prime.supports_len(n),
        "product of length {out_len} needs a 2^{} transform; p = {} supports 2^{}",
        n.trailing_zeros(),
        prime.modulus,
        prime.two_adicity
    );

    let plan = NttPlan::new(prime, n)?;
    let mut pa = vec![0u64; n];
    let mut pb = vec![0u64; n];
    pa[..a.len()].copy_from_slice(a);
    pb[..b.len()].copy_from_slice(b);

    let mut c = plan.cyclic_convolution(&pa, &pb);
    c.truncate(out_len);
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive::poly_mul_naive;

    #[test]
    fn plan_roundtrip() {
        let plan = NttPlan::new(NttPrime::BABY_BEAR, 64).unwrap();
        let a: Vec<u64> = (0..64).map(|i| i * i + 1).collect();
        let mut v = a.clone();
        plan.forward(&mut v);
        assert_ne!(v, a);
        plan.inverse(&mut v);
        assert_eq!(v, a);
    }

    #[test]
    fn poly_mul_matches_naive() {
        let a = [5u64, 0, 7, 1, 9];
        let b = [3u64, 2, 1];
        for prime in [NttPrime::BABY_BEAR, NttPrime::GOLDILOCKS] {
            let got = poly_mul(&a, &b, prime).unwrap();
            assert_eq!(got, poly_mul_naive(&a, &b, prime.modulus));
        }
    }

    #[test]
    fn poly_mul_edge_lengths() {
        let p = NttPrime::BABY_BEAR;
        assert!(poly_mul(&[], &[1], p).unwrap().is_empty());
        assert_eq!(poly_mul(&[6], &[7], p).unwrap(), vec![42]);
        assert_eq!(poly_mul(&[p.modulus + 2], &[3], p).unwrap(), vec![6]);
    }

    #[test]
    fn poly_mul_rejects_bad_modulus() {
        for modulus in [0, 1, 91] {
            let prime = NttPrime {
                modulus,
                generator: 2,
                two_adicity: 3,
            };
            assert!(poly_mul(&[1], &[1], prime).is_err(), "modulus = {modulus}");
            assert!(poly_mul(&[1, 2], &[3, 4], prime).is_err(), "modulus = {modulus}");
        }
    }

    #[test]
    fn plan_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NttPlan>();

        let plan = NttPlan::new(NttPrime::BABY_BEAR, 32).unwrap();
        let inputs: Vec<Vec<u64>> = (0..4u64).map(|s| (0..32).map(|i| i * s + 1).collect()).collect();
        std::thread::scope(|scope| {
            for input in &inputs {
                let plan = &plan;
                scope.spawn(move || {
                    let mut v = input.clone();
                    plan.forward(&mut v);
                    plan.inverse(&mut v);
                    assert_eq!(&v, input);
                });
            }
        });
    }

    #[test]
    fn scalar_plan_matches_detected() {
        let detected = NttPlan::new(NttPrime::GOLDILOCKS, 128).unwrap();
        let scalar = detected.clone().with_kernel(Kernel::Scalar);
        let a: Vec<u64> = (0..128u64).map(|i| u64::MAX - i).collect();
        let b: Vec<u64> = (0..128u64).map(|i| i << 40).collect();
        assert_eq!(
            detected.cyclic_convolution(&a, &b),
            scalar.cyclic_convolution(&a, &b)
        );
    }
}
