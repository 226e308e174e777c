//! NTT-friendly primes and a deterministic 64-bit primality test.
//!
//! A prime `p` supports power-of-two transforms up to `2^k` when `2^k | p - 1`
//! (`k` is the *2-adicity*). Given a multiplicative generator `g`, the
//! primitive `n`-th root of unity is `g^((p-1)/n)`.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::{ensure, Result};

use crate::modarith::{mod_pow, mul_mod};

/// `15 * 2^27 + 1`, the 31-bit prime used by the reference tests.
pub const BABY_BEAR: u64 = 2_013_265_921;

/// Goldilocks prime `2^64 - 2^32 + 1`.
pub const GOLDILOCKS: u64 = 0xffff_ffff_0000_0001;

/// Description of a prime field suitable for radix-2 NTTs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NttPrime {
    /// The prime modulus `p`.
    pub modulus: u64,
    /// A generator of the multiplicative group `F_p^*`.
    pub generator: u64,
    /// Largest `k` with `2^k | p - 1`.
    pub two_adicity: u32,
}

impl NttPrime {
    /// Baby Bear (`g = 31`, 2-adicity 27).
    pub const BABY_BEAR: Self = Self {
        modulus: BABY_BEAR,
        generator: 31,
        two_adicity: 27,
    };

    /// Goldilocks (`g = 7`, 2-adicity 32).
    pub const GOLDILOCKS: Self = Self {
        modulus: GOLDILOCKS,
        generator: 7,
        two_adicity: 32,
    };

    /// Largest supported transform length, `2^two_adicity` (saturating).
    #[inline]
    #[must_use]
    pub const fn max_len(&self) -> u64 {
        if self.two_adicity >= u64::BITS {
            u64::MAX
        } else {
            1u64 << self.two_adicity
        }
    }

    /// Whether a length-`n` transform fits this prime.
    #[inline]
    #[must_use]
    pub const fn supports_len(&self, n: usize) -> bool {
        n.is_power_of_two() && n as u64 <= self.max_len()
    }

    /// Primitive `n`-th root of unity `g^((p-1)/n)`.
    ///
    /// # Errors
    /// Fails if the modulus is not prime, `n` is not a power of two, or `n`
    /// exceeds `2^two_adicity` or does not divide `p - 1`.
    pub fn root_of_unity(&self, n: usize) -> Result<u64> {
        ensure!(is_prime(self.modulus), "modulus {} is not prime", self.modulus);
        ensure!(
            self.supports_len(n),
            "transform length {n} is not a power of two up to 2^{} (p = {})",
            self.two_adicity,
            self.modulus
        );
        ensure!(
            (self.modulus - 1) % n as u64 == 0,
            "transform length {n} does not divide p - 1 = {}",
            self.modulus - 1
        );
        Ok(mod_pow(self.generator, (self.modulus - 1) / n as u64, self.modulus))
    }
}

/// Witness bases that make Miller–Rabin exact below `3.3 * 10^24`.
const MR_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Deterministic primality test for any `u64`.
#[must_use]
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in MR_BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;

    'witness: for a in MR_BASES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
