//! Vectorized butterfly kernel.
//!
//! The only backend is AVX2 on x86_64: four 64-bit lanes per step, with the
//! 64×64→128 products rebuilt from 32-bit partial products (`vpmuludq`) and
//! reduced by a lane-wise REDC. Results are bit-identical to the scalar
//! [`MontgomeryContext::mul`] path.
//!
//! Selection is a runtime probe, so one binary stays portable: callers use
//! [`butterfly_passes`], which returns `false` when the CPU lacks AVX2 and
//! the scalar kernel must run instead.
//!
//! # Safety
//!
//! This module contains the crate's only unsafe code (intrinsics and the
//! `#[target_feature]` calls behind the runtime check).

#![allow(unsafe_code)]

use crate::montgomery::{Mont, MontgomeryContext};

#[cfg(target_arch = "x86_64")]
mod avx2;

/// Lanes processed per vector step.
pub const LANES: usize = 4;

/// Whether the AVX2 kernel can run on this CPU.
#[cfg(target_arch = "x86_64")]
#[inline]
#[must_use]
pub fn has_avx2() -> bool {
    #[cfg(target_feature = "avx2")]
    {
        true
    }
    #[cfg(not(target_feature = "avx2"))]
    {
        std::arch::is_x86_feature_detected!("avx2")
    }
}

/// Whether the AVX2 kernel can run on this CPU (never, off x86_64).
#[cfg(not(target_arch = "x86_64"))]
#[inline]
#[must_use]
pub const fn has_avx2() -> bool {
    false
}

#[track_caller]
fn check_shape(a: &[Mont], tw: &[Mont]) {
    assert_eq!(a.len(), tw.len(), "vector/twiddle length mismatch");
    assert!(
        a.is_empty() || a.len().is_power_of_two(),
        "NTT size must be power of two"
    );
}

/// Run the butterfly network on bit-reversed Montgomery data with the vector
/// kernel. Returns `false` (leaving `a` untouched) when AVX2 is unavailable.
///
/// # Panics
/// Panics if `a.len() != tw.len()` or the length is not a power of two.
#[cfg(target_arch = "x86_64")]
pub fn butterfly_passes(a: &mut [Mont], tw: &[Mont], ctx: &MontgomeryContext) -> bool {
    check_shape(a, tw);
    if !has_avx2() {
        return false;
    }
    // SAFETY: AVX2 verified above. With a power-of-two length every block
    // `[i, i + 2len)` lies inside `a`, so the kernel only touches indices < a.len().
    unsafe { avx2::butterfly_passes(a, tw, ctx) };
    true
}

/// Run the butterfly network with the vector kernel (unavailable here).
///
/// # Panics
/// Same shape checks as the x86_64 version.
#[cfg(not(target_arch = "x86_64"))]
pub fn butterfly_passes(a: &mut [Mont], tw: &[Mont], _ctx: &MontgomeryContext) -> bool {
    check_shape(a, tw);
    false
}

/// Four Montgomery products in one vector step, or `None` without AVX2.
/// Inputs must be `< N`.
#[cfg(target_arch = "x86_64")]
#[must_use]
pub fn montgomery_mul_4x(
    a: [Mont; LANES],
    b: [Mont; LANES],
    ctx: &MontgomeryContext,
) -> Option<[Mont; LANES]> {
    if !has_avx2() {
        return None;
    }
    // SAFETY: AVX2 verified above.
    Some(unsafe { avx2::montgomery_mul_4x(a, b, ctx) })
}

/// Four Montgomery products in one vector step (unavailable here).
#[cfg(not(target_arch = "x86_64"))]
#[must_use]
pub fn montgomery_mul_4x(
    _a: [Mont; LANES],
    _b: [Mont; LANES],
    _ctx: &MontgomeryContext,
) -> Option<[Mont; LANES]> {
    None
}
