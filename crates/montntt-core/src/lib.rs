//! Number-theoretic transforms over 64-bit primes.
//!
//! - `modarith`: add/sub/mul/pow modulo a 64-bit prime (128-bit intermediates).
//! - `montgomery`: [`MontgomeryContext`] and the [`Mont`] residue type (REDC, `R = 2^64`).
//! - `roots`: validated twiddle tables ([`RootTable`], [`MontRootTable`]).
//! - `ntt`: in-place NTT/INTT, plain and Montgomery variants, kernel selection.
//! - `simd`: the 4-lane AVX2 butterfly kernel behind a runtime probe.
//! - `poly`: [`NttPlan`] and [`poly_mul`] for fast polynomial products.
//! - `naive`: **O(n²)** reference convolutions.
//! - `primes`: Baby Bear / Goldilocks descriptors and a 64-bit primality test.
//!
//! ```
//! use montntt_core::{ntt, intt, RootTable, BABY_BEAR};
//!
//! let roots = RootTable::from_generator(31, 8, BABY_BEAR)?;
//! let mut a = vec![1, 2, 3, 4, 0, 0, 0, 0];
//! ntt(&mut a, &roots);
//! for x in &mut a {
//!     *x = montntt_core::modarith::mul_mod(*x, *x, BABY_BEAR);
//! }
//! intt(&mut a, &roots);
//! assert_eq!(a, vec![1, 4, 10, 20, 25, 24, 16, 0]);
//! # Ok::<(), anyhow::Error>(())
//! ```

#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::cast_possible_truncation))]

pub mod modarith;
pub mod montgomery;
pub mod naive;
pub mod ntt;
pub mod poly;
pub mod primes;
pub mod roots;
pub mod simd;

pub use modarith::{add_mod, mod_pow, mul_mod, sub_mod};
pub use montgomery::{Mont, MontgomeryContext};
pub use ntt::{
    bit_reverse_permute, intt, intt_montgomery, intt_montgomery_core, intt_montgomery_core_with,
    ntt, ntt_montgomery, ntt_montgomery_core, ntt_montgomery_core_with, Kernel,
};
pub use poly::{poly_mul, NttPlan};
pub use primes::{is_prime, NttPrime, BABY_BEAR, GOLDILOCKS};
pub use roots::{compute_roots, MontRootTable, RootTable};
