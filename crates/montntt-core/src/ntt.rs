//! In-place radix-2 Cooley–Tukey NTT/INTT.
//!
//! Every variant runs the same network: bit-reverse the input, then for
//! `len = 1, 2, 4, ..., n/2` combine pairs `(u, v)` at distance `len` into
//! `(u + w·v, u − w·v)` with `w = roots[(n / 2len)·j]`. The variants differ
//! only in how `w·v` is reduced, which is what [`Reduction`] abstracts:
//!
//! - [`ntt`]/[`intt`]: ordinary residues, 128-bit `%` reduction.
//! - [`ntt_montgomery`]/[`intt_montgomery`]: convert in, run REDC, convert out.
//! - [`ntt_montgomery_core`]/[`intt_montgomery_core`]: data already in
//!   Montgomery form, no conversion (measures the transform alone).
//! - [`ntt_montgomery_core_with`]: same contract, runs the AVX2 kernel when
//!   the CPU has it.

#![deny(rust_2018_idioms)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use core::fmt;

use crate::modarith::{add_mod, inv_mod, mul_mod, sub_mod};
use crate::montgomery::{Mont, MontgomeryContext};
use crate::roots::{MontRootTable, RootTable};
use crate::simd;

/// Arithmetic used inside the butterflies.
pub trait Reduction {
    /// Element type stored in the transformed vector.
    type Elem: Copy;

    /// Twiddle product `a·w`.
    fn mul(&self, a: Self::Elem, w: Self::Elem) -> Self::Elem;
    /// Butterfly sum.
    fn add(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem;
    /// Butterfly difference.
    fn sub(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem;
}

/// Ordinary residues modulo a prime, reduced with `u128 %`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlainModulus(pub u64);

impl Reduction for PlainModulus {
    type Elem = u64;

    #[inline]
    fn mul(&self, a: u64, w: u64) -> u64 {
        mul_mod(a, w, self.0)
    }
    #[inline]
    fn add(&self, a: u64, b: u64) -> u64 {
        add_mod(a, b, self.0)
    }
    #[inline]
    fn sub(&self, a: u64, b: u64) -> u64 {
        sub_mod(a, b, self.0)
    }
}

impl Reduction for MontgomeryContext {
    type Elem = Mont;

    #[inline]
    fn mul(&self, a: Mont, w: Mont) -> Mont {
        Self::mul(self, a, w)
    }
    #[inline]
    fn add(&self, a: Mont, b: Mont) -> Mont {
        Self::add(self, a, b)
    }
    #[inline]
    fn sub(&self, a: Mont, b: Mont) -> Mont {
        Self::sub(self, a, b)
    }
}

/// Which butterfly kernel runs the Montgomery core.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Portable scalar REDC.
    Scalar,
    /// 4-lane AVX2 multiply-reduce (x86_64 only).
    Avx2,
}

impl Kernel {
    /// Fastest kernel this CPU supports.
    #[must_use]
    pub fn detect() -> Self {
        let k = if simd::has_avx2() { Self::Avx2 } else { Self::Scalar };
        tracing::debug!(kernel = %k, "detected NTT kernel");
        k
    }

    /// Whether this kernel can run on the current CPU.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::Scalar => true,
            Self::Avx2 => simd::has_avx2(),
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Avx2 => "avx2",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn bitrev(mut x: usize, bits: u32) -> usize {
    let mut y = 0usize;
    for _ in 0..bits {
        y = (y << 1) | (x & 1);
        x >>= 1;
    }
    y
}

/// Reorder `a` by reversing the `log2(n)`-bit index of every slot.
///
/// # Panics
/// Panics if `a.len()` is not a power of two (empty slices are left alone).
pub fn bit_reverse_permute<T>(a: &mut [T]) {
    let n = a.len();
    if n <= 2 {
        return;
    }
    assert!(n.is_power_of_two(), "NTT size must be power of two");
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = bitrev(i, bits);
        if j > i {
            a.swap(i, j);
        }
    }
}

/// The butterfly network on bit-reversed input. `tw` is the full length-`n`
/// root table; stage `len` uses stride `n / 2len`.
pub fn butterfly_passes<R: Reduction>(a: &mut [R::Elem], tw: &[R::Elem], red: &R) {
    let n = a.len();
    let mut len = 1usize;
    while len < n {
        let step = n / (2 * len);
        let mut i = 0usize;
        while i < n {
            for j in 0..len {
                let u = a[i + j];
                let v = red.mul(a[i + j + len], tw[step * j]);
                a[i + j] = red.add(u, v);
                a[i + j + len] = red.sub(u, v);
            }
            i += 2 * len;
        }
        len <<= 1;
    }
}

#[track_caller]
fn check_shape(len: usize, table_len: usize) {
    assert_eq!(
        len, table_len,
        "vector length {len} does not match root table length {table_len}"
    );
    assert!(len.is_power_of_two(), "NTT size must be power of two");
}

/// Forward NTT in place (coefficients → evaluations), ordinary residues.
///
/// # Panics
/// Panics if `a.len() != roots.len()`.
pub fn ntt(a: &mut [u64], roots: &RootTable) {
    check_shape(a.len(), roots.len());
    bit_reverse_permute(a);
    butterfly_passes(a, roots.as_slice(), &PlainModulus(roots.modulus()));
}

/// Inverse NTT in place, given the *forward* table.
///
/// Runs the same network over the conjugate table, then scales by `n^{-1}`.
///
/// # Panics
/// Panics if `a.len() != roots.len()`.
pub fn intt(a: &mut [u64], roots: &RootTable) {
    check_shape(a.len(), roots.len());
    let modulus = roots.modulus();
    let inv_roots = roots.conjugate();
    bit_reverse_permute(a);
    butterfly_passes(a, inv_roots.as_slice(), &PlainModulus(modulus));

    let n_inv = inv_mod(a.len() as u64, modulus);
    for x in a.iter_mut() {
        *x = mul_mod(*x, n_inv, modulus);
    }
}

/// Forward NTT using Montgomery multiplication; input and output are ordinary
/// residues, conversion happens inside.
///
/// # Panics
/// Panics on a length mismatch or if `ctx` and `roots` disagree on the modulus.
pub fn ntt_montgomery(a: &mut [u64], roots: &RootTable, ctx: &MontgomeryContext) {
    check_shape(a.len(), roots.len());
    let mroots = ctx.convert_roots(roots);
    let mut m = ctx.to_mont_slice(a);
    ntt_montgomery_core(&mut m, &mroots, ctx);
    for (dst, src) in a.iter_mut().zip(m) {
        *dst = ctx.from_mont(src);
    }
}

/// Inverse of [`ntt_montgomery`], given the *forward* table.
///
/// # Panics
/// Same as [`ntt_montgomery`].
pub fn intt_montgomery(a: &mut [u64], roots: &RootTable, ctx: &MontgomeryContext) {
    check_shape(a.len(), roots.len());
    let inv_mroots = ctx.convert_roots(&roots.conjugate());
    let mut m = ctx.to_mont_slice(a);
    intt_montgomery_core(&mut m, &inv_mroots, ctx);
    for (dst, src) in a.iter_mut().zip(m) {
        *dst = ctx.from_mont(src);
    }
}

/// Forward NTT on Montgomery-form data with Montgomery-form roots. Scalar REDC.
///
/// # Panics
/// Panics on a length mismatch or if `ctx` and `mroots` disagree on the modulus.
pub fn ntt_montgomery_core(a: &mut [Mont], mroots: &MontRootTable, ctx: &MontgomeryContext) {
    check_core(a.len(), mroots, ctx);
    bit_reverse_permute(a);
    butterfly_passes(a, mroots.as_slice(), ctx);
}

/// Inverse NTT on Montgomery-form data. `inv_mroots` is the conjugate table
/// (see [`MontRootTable::conjugate`]); the result is scaled by `n^{-1}`.
///
/// # Panics
/// Same as [`ntt_montgomery_core`].
pub fn intt_montgomery_core(
    a: &mut [Mont],
    inv_mroots: &MontRootTable,
    ctx: &MontgomeryContext,
) {
    intt_montgomery_core_with(Kernel::Scalar, a, inv_mroots, ctx);
}

/// [`ntt_montgomery_core`] with an explicit kernel choice. Falls back to
/// the scalar kernel when `kernel` is unavailable; returns the kernel that ran.
/// Output is identical for every kernel.
///
/// # Panics
/// Same as [`ntt_montgomery_core`].
pub fn ntt_montgomery_core_with(
    kernel: Kernel,
    a: &mut [Mont],
    mroots: &MontRootTable,
    ctx: &MontgomeryContext,
) -> Kernel {
    check_core(a.len(), mroots, ctx);
    bit_reverse_permute(a);
    run_passes(kernel, a, mroots.as_slice(), ctx)
}

/// [`intt_montgomery_core`] with an explicit kernel choice.
///
/// # Panics
/// Same as [`ntt_montgomery_core`].
pub fn intt_montgomery_core_with(
    kernel: Kernel,
    a: &mut [Mont],
    inv_mroots: &MontRootTable,
    ctx: &MontgomeryContext,
) -> Kernel {
    check_core(a.len(), inv_mroots, ctx);
    bit_reverse_permute(a);
    let ran = run_passes(kernel, a, inv_mroots.as_slice(), ctx);

    let modulus = ctx.modulus();
    let n_inv = ctx.to_mont(inv_mod(a.len() as u64 % modulus, modulus));
    for x in a.iter_mut() {
        *x = ctx.mul(*x, n_inv);
    }
    ran
}

fn run_passes(kernel: Kernel, a: &mut [Mont], tw: &[Mont], ctx: &MontgomeryContext) -> Kernel {
    if kernel == Kernel::Avx2 && simd::butterfly_passes(a, tw, ctx) {
        return Kernel::Avx2;
    }
    butterfly_passes(a, tw, ctx);
    Kernel::Scalar
}

#[track_caller]
fn check_core(len: usize, mroots: &MontRootTable, ctx: &MontgomeryContext) {
    check_shape(len, mroots.len());
    assert_eq!(
        mroots.modulus(),
        ctx.modulus(),
        "root table modulus does not match Montgomery context"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive::cyclic_convolution_naive;
    use crate::primes::{BABY_BEAR, GOLDILOCKS};

    #[test]
    fn bitrev_small() {
        let mut v: Vec<u32> = (0..8).collect();
        bit_reverse_permute(&mut v);
        assert_eq!(v, vec![0, 4, 2, 6, 1, 5, 3, 7]);
        bit_reverse_permute(&mut v);
        assert_eq!(v, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn length_one_is_identity() {
        let roots = RootTable::from_generator(31, 1, BABY_BEAR).unwrap();
        let mut v = vec![42u64];
        ntt(&mut v, &roots);
        assert_eq!(v, vec![42]);
        intt(&mut v, &roots);
        assert_eq!(v, vec![42]);
    }

    #[test]
    fn delta_transforms_to_ones() {
        let roots = RootTable::from_generator(31, 16, BABY_BEAR).unwrap();
        let mut v = vec![0u64; 16];
        v[0] = 1;
        ntt(&mut v, &roots);
        assert!(v.iter().all(|&x| x == 1));
    }

    #[test]
    fn forward_matches_definition() {
        // y_k = sum_j a_j w^(jk)
        let n = 8;
        let roots = RootTable::from_generator(7, n, GOLDILOCKS).unwrap();
        let a: Vec<u64> = (0..n as u64).map(|i| GOLDILOCKS - 1 - i * 3).collect();
        let mut y = a.clone();
        ntt(&mut y, &roots);
        for (k, &yk) in y.iter().enumerate() {
            let mut acc = 0;
            for (j, &aj) in a.iter().enumerate() {
                acc = add_mod(acc, mul_mod(aj, roots[(j * k) % n], GOLDILOCKS), GOLDILOCKS);
            }
            assert_eq!(yk, acc, "k = {k}");
        }
    }

    #[test]
    fn squaring_scenario() {
        let roots = RootTable::from_generator(31, 8, BABY_BEAR).unwrap();
        let a = vec![1u64, 2, 3, 4, 0, 0, 0, 0];
        let mut fa = a.clone();
        ntt(&mut fa, &roots);
        for x in &mut fa {
            *x = mul_mod(*x, *x, BABY_BEAR);
        }
        intt(&mut fa, &roots);
        assert_eq!(fa, vec![1, 4, 10, 20, 25, 24, 16, 0]);
        assert_eq!(fa, cyclic_convolution_naive(&a, &a, BABY_BEAR));
    }

    #[test]
    #[should_panic(expected = "does not match root table length")]
    fn length_mismatch_panics() {
        let roots = RootTable::from_generator(31, 8, BABY_BEAR).unwrap();
        let mut v = vec![0u64; 4];
        ntt(&mut v, &roots);
    }

    #[test]
    fn montgomery_roundtrip_goldilocks() {
        let ctx = MontgomeryContext::new(GOLDILOCKS).unwrap();
        let roots = RootTable::from_generator(7, 32, GOLDILOCKS).unwrap();
        let a: Vec<u64> = (0..32u64).map(|i| GOLDILOCKS - 1 - i * i).collect();
        let mut plain = a.clone();
        let mut mont = a.clone();
        ntt(&mut plain, &roots);
        ntt_montgomery(&mut mont, &roots, &ctx);
        assert_eq!(plain, mont);
        intt_montgomery(&mut mont, &roots, &ctx);
        assert_eq!(mont, a);
    }

    #[test]
    fn core_scalar_and_selected_kernel_agree() {
        let ctx = MontgomeryContext::new(BABY_BEAR).unwrap();
        for k in 0..=7 {
            let n = 1usize << k;
            let roots = RootTable::from_generator(31, n, BABY_BEAR).unwrap();
            let mroots = ctx.convert_roots(&roots);
            let input: Vec<Mont> = (0..n as u64).map(|i| ctx.to_mont(i * 977 + 5)).collect();

            let mut scalar = input.clone();
            ntt_montgomery_core(&mut scalar, &mroots, &ctx);
            let mut fast = input.clone();
            let ran = ntt_montgomery_core_with(Kernel::detect(), &mut fast, &mroots, &ctx);
            assert_eq!(scalar, fast, "n = {n}, kernel = {ran}");

            intt_montgomery_core(&mut scalar, &mroots.conjugate(), &ctx);
            assert_eq!(scalar, input, "n = {n}");
        }
    }

    #[test]
    fn unavailable_kernel_falls_back() {
        let ctx = MontgomeryContext::new(BABY_BEAR).unwrap();
        let roots = RootTable::from_generator(31, 16, BABY_BEAR).unwrap();
        let mroots = ctx.convert_roots(&roots);
        let mut v = ctx.to_mont_slice(&[3; 16]);
        let ran = ntt_montgomery_core_with(Kernel::Avx2, &mut v, &mroots, &ctx);
        assert_eq!(ran == Kernel::Avx2, Kernel::Avx2.is_available());
        assert!(Kernel::Scalar.is_available());
    }
}
