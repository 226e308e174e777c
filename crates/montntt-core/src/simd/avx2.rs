//! AVX2 Montgomery butterflies (x86_64).
//!
//! AVX2 has no 64×64 multiply, so each lane's product is assembled from four
//! `_mm256_mul_epu32` partial products. Unsigned 64-bit compares are signed
//! compares on operands biased by `2^63`. All reductions are branchless
//! selects that mirror the scalar `if x >= N { x -= N }` exactly.
//!
//! # Safety
//!
//! Every function requires AVX2. Use `super::has_avx2()` before calling.

#![allow(clippy::cast_possible_wrap)]

use core::arch::x86_64::{
    __m256i, _mm256_add_epi64, _mm256_and_si256, _mm256_andnot_si256, _mm256_cmpeq_epi64,
    _mm256_cmpgt_epi64, _mm256_loadu_si256, _mm256_mul_epu32, _mm256_or_si256,
    _mm256_set1_epi64x, _mm256_setzero_si256, _mm256_slli_epi64, _mm256_srli_epi64,
    _mm256_storeu_si256, _mm256_sub_epi64, _mm256_xor_si256,
};

use super::LANES;
use crate::montgomery::{Mont, MontgomeryContext};

/// Broadcast constants for one modulus.
#[derive(Copy, Clone)]
struct Consts {
    n: __m256i,
    n_minus_1: __m256i,
    ninv: __m256i,
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn consts(ctx: &MontgomeryContext) -> Consts {
    Consts {
        n: _mm256_set1_epi64x(ctx.modulus() as i64),
        n_minus_1: _mm256_set1_epi64x((ctx.modulus() - 1) as i64),
        ninv: _mm256_set1_epi64x(ctx.ninv() as i64),
    }
}

/// Lane-wise unsigned `a > b`.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn cmpgt_u64(a: __m256i, b: __m256i) -> __m256i {
    let bias = _mm256_set1_epi64x(i64::MIN);
    _mm256_cmpgt_epi64(_mm256_xor_si256(a, bias), _mm256_xor_si256(b, bias))
}

/// Lane-wise full product `a·b` as `(lo, hi)` 64-bit halves.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn mul_wide(a: __m256i, b: __m256i) -> (__m256i, __m256i) {
    let mask32 = _mm256_set1_epi64x(0xffff_ffff);
    let a_hi = _mm256_srli_epi64(a, 32);
    let b_hi = _mm256_srli_epi64(b, 32);

    let ll = _mm256_mul_epu32(a, b);
    let lh = _mm256_mul_epu32(a, b_hi);
    let hl = _mm256_mul_epu32(a_hi, b);
    let hh = _mm256_mul_epu32(a_hi, b_hi);

    // Bits 32..96 column: < 3·2^32, never overflows.
    let mid = _mm256_add_epi64(
        _mm256_add_epi64(_mm256_srli_epi64(ll, 32), _mm256_and_si256(lh, mask32)),
        _mm256_and_si256(hl, mask32),
    );

    let lo = _mm256_or_si256(_mm256_and_si256(ll, mask32), _mm256_slli_epi64(mid, 32));
    let hi = _mm256_add_epi64(
        _mm256_add_epi64(hh, _mm256_srli_epi64(lh, 32)),
        _mm256_add_epi64(_mm256_srli_epi64(hl, 32), _mm256_srli_epi64(mid, 32)),
    );
    (lo, hi)
}

/// Lane-wise `a·b mod 2^64`.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn mul_lo(a: __m256i, b: __m256i) -> __m256i {
    let ll = _mm256_mul_epu32(a, b);
    let cross = _mm256_add_epi64(
        _mm256_mul_epu32(a, _mm256_srli_epi64(b, 32)),
        _mm256_mul_epu32(_mm256_srli_epi64(a, 32), b),
    );
    _mm256_add_epi64(ll, _mm256_slli_epi64(cross, 32))
}

/// Lane-wise REDC of `(t_lo, t_hi)`; same carry handling as the scalar path.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn redc(t_lo: __m256i, t_hi: __m256i, k: Consts) -> __m256i {
    let m = mul_lo(t_lo, k.ninv);
    let (_, mn_hi) = mul_wide(m, k.n);

    // t_lo + mn_lo ≡ 0 (mod 2^64): it carries exactly when t_lo != 0.
    let t_lo_zero = _mm256_cmpeq_epi64(t_lo, _mm256_setzero_si256());
    let carry = _mm256_andnot_si256(t_lo_zero, _mm256_set1_epi64x(1));

    let s = _mm256_add_epi64(t_hi, mn_hi);
    let c1 = cmpgt_u64(t_hi, s);
    let s2 = _mm256_add_epi64(s, carry);
    let c2 = cmpgt_u64(s, s2);
    let ge = cmpgt_u64(s2, k.n_minus_1);

    let reduce = _mm256_or_si256(_mm256_or_si256(c1, c2), ge);
    _mm256_sub_epi64(s2, _mm256_and_si256(reduce, k.n))
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn mont_mul(a: __m256i, b: __m256i, k: Consts) -> __m256i {
    let (lo, hi) = mul_wide(a, b);
    redc(lo, hi, k)
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn add_mod(a: __m256i, b: __m256i, k: Consts) -> __m256i {
    let s = _mm256_add_epi64(a, b);
    let wrapped = cmpgt_u64(a, s);
    let ge = cmpgt_u64(s, k.n_minus_1);
    _mm256_sub_epi64(s, _mm256_and_si256(_mm256_or_si256(wrapped, ge), k.n))
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn sub_mod(a: __m256i, b: __m256i, k: Consts) -> __m256i {
    let d = _mm256_sub_epi64(a, b);
    let borrow = cmpgt_u64(b, a);
    _mm256_add_epi64(d, _mm256_and_si256(borrow, k.n))
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn load(p: *const Mont) -> __m256i {
    // `Mont` is `repr(transparent)` over `u64`.
    _mm256_loadu_si256(p.cast())
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn store(p: *mut Mont, v: __m256i) {
    _mm256_storeu_si256(p.cast(), v);
}

/// Four Montgomery products.
///
/// # Safety
///
/// Requires AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn montgomery_mul_4x(
    a: [Mont; LANES],
    b: [Mont; LANES],
    ctx: &MontgomeryContext,
) -> [Mont; LANES] {
    let k = consts(ctx);
    let mut out = [Mont::default(); LANES];
    store(out.as_mut_ptr(), mont_mul(load(a.as_ptr()), load(b.as_ptr()), k));
    out
}

/// Butterfly network over bit-reversed Montgomery data, four lanes at a time.
/// Stages with fewer than four butterflies per block (and any remainder)
/// run through the scalar context.
///
/// # Safety
///
/// - Requires AVX2
/// - `a.len() == tw.len()` and `a.len()` is a power of two
#[target_feature(enable = "avx2")]
pub unsafe fn butterfly_passes(a: &mut [Mont], tw: &[Mont], ctx: &MontgomeryContext) {
    let n = a.len();
    let k = consts(ctx);

    let mut len = 1usize;
    while len < n {
        let step = n / (2 * len);
        let mut i = 0usize;
        while i < n {
            let mut j = 0usize;
            while j + LANES <= len {
                let w = if step == 1 {
                    load(tw.as_ptr().add(j))
                } else {
                    let g = [
                        tw[step * j],
                        tw[step * (j + 1)],
                        tw[step * (j + 2)],
                        tw[step * (j + 3)],
                    ];
                    load(g.as_ptr())
                };
                let p = a.as_mut_ptr();
                let top = p.add(i + j);
                let bot = p.add(i + j + len);

                let u = load(top);
                let v = mont_mul(load(bot), w, k);
                store(top, add_mod(u, v, k));
                store(bot, sub_mod(u, v, k));
                j += LANES;
            }
            for j in j..len {
                let u = a[i + j];
                let v = ctx.mul(a[i + j + len], tw[step * j]);
                a[i + j] = ctx.add(u, v);
                a[i + j + len] = ctx.sub(u, v);
            }
            i += 2 * len;
        }
        len <<= 1;
    }
}
