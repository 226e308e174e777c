//! Montgomery arithmetic with `R = 2^64`.
//!
//! A residue `a` is held as `a·R mod N`. Products are reduced with REDC
//! (one multiply by `ninv`, one by `N`, a shift and at most one subtraction)
//! instead of a 128-bit division.
//!
//! Montgomery-form values use the [`Mont`] newtype so they cannot be mixed
//! with ordinary `u64` residues without going through a [`MontgomeryContext`].

#![deny(rust_2018_idioms)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use anyhow::{ensure, Result};

use crate::modarith::{add_mod, sub_mod};
use crate::roots::{MontRootTable, RootTable};

/// A residue in Montgomery form (`value·2^64 mod N`).
///
/// Only a [`MontgomeryContext`] can build one or read it back.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Mont(pub(crate) u64);

/// Per-modulus Montgomery parameters. Immutable once built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MontgomeryContext {
    modulus: u64,
    /// `-N^{-1} mod 2^64`, so that `N·ninv ≡ -1 (mod 2^64)`.
    ninv: u64,
    /// `2^64 mod N`, i.e. one in Montgomery form.
    r_mod: u64,
}

/// Newton–Raphson inverse of an odd `n` modulo `2^64`.
///
/// `inv = 1` is correct to one bit for any odd `n`; each step
/// `inv ← inv·(2 − n·inv)` doubles that, so six steps reach 64 bits.
#[inline]
#[must_use]
pub const fn inverse_mod_2_64(n: u64) -> u64 {
    let mut inv: u64 = 1;
    let mut i = 0;
    while i < 6 {
        inv = inv.wrapping_mul(2u64.wrapping_sub(n.wrapping_mul(inv)));
        i += 1;
    }
    inv
}

impl MontgomeryContext {
    /// Build the context for an odd modulus `N ≥ 3`. The full 64-bit range is
    /// supported.
    ///
    /// # Errors
    /// Fails for even moduli (no inverse mod `2^64`) or `N < 3`.
    pub fn new(modulus: u64) -> Result<Self> {
        ensure!(modulus >= 3, "Montgomery modulus must be >= 3, got {modulus}");
        ensure!(modulus & 1 == 1, "Montgomery modulus must be odd, got {modulus}");

        let ninv = inverse_mod_2_64(modulus).wrapping_neg();
        let r_mod = ((1u128 << 64) % u128::from(modulus)) as u64;
        debug_assert_eq!(modulus.wrapping_mul(ninv), u64::MAX);

        tracing::trace!(modulus, ninv, "montgomery context ready");
        Ok(Self {
            modulus,
            ninv,
            r_mod,
        })
    }

    /// The modulus `N`.
    #[inline]
    #[must_use]
    pub const fn modulus(&self) -> u64 {
        self.modulus
    }

    /// `-N^{-1} mod 2^64`.
    #[inline]
    #[must_use]
    pub const fn ninv(&self) -> u64 {
        self.ninv
    }

    /// One in Montgomery form.
    #[inline]
    #[must_use]
    pub const fn one(&self) -> Mont {
        Mont(self.r_mod)
    }

    /// `a·2^64 mod N`. `a` need not be reduced.
    #[inline]
    #[must_use]
    pub const fn to_mont(&self, a: u64) -> Mont {
        let t = (a as u128) << 64;
        Mont((t % (self.modulus as u128)) as u64)
    }

    /// Back to an ordinary residue: REDC with multiplier one.
    #[inline]
    #[must_use]
    pub const fn from_mont(&self, a: Mont) -> u64 {
        self.redc(a.0 as u128)
    }

    /// REDC of a 128-bit value `t < N·2^64`: returns `t·2^-64 mod N` in `[0, N)`.
    ///
    /// The intermediate `(t + m·N) / 2^64` is below `2N` but may not fit in 64
    /// bits when `N > 2^63`; the carry is folded into the final subtraction.
    #[inline]
    #[must_use]
    pub const fn redc(&self, t: u128) -> u64 {
        let t_lo = t as u64;
        let t_hi = (t >> 64) as u64;
        let m = t_lo.wrapping_mul(self.ninv);
        let mn = (m as u128) * (self.modulus as u128);
        let mn_lo = mn as u64;
        let mn_hi = (mn >> 64) as u64;

        // The low halves sum to 0 mod 2^64; only their carry survives.
        let (_, c0) = t_lo.overflowing_add(mn_lo);
        let (s, c1) = t_hi.overflowing_add(mn_hi);
        let (s, c2) = s.overflowing_add(c0 as u64);

        if c1 || c2 || s >= self.modulus {
            s.wrapping_sub(self.modulus)
        } else {
            s
        }
    }

    /// Montgomery product: `a·b·2^-64 mod N`. Both inputs must be `< N`.
    #[inline]
    #[must_use]
    pub const fn mul(&self, a: Mont, b: Mont) -> Mont {
        Mont(self.redc((a.0 as u128) * (b.0 as u128)))
    }

    /// Montgomery-form addition (plain modular addition).
    #[inline]
    #[must_use]
    pub const fn add(&self, a: Mont, b: Mont) -> Mont {
        Mont(add_mod(a.0, b.0, self.modulus))
    }

    /// Montgomery-form subtraction (plain modular subtraction).
    #[inline]
    #[must_use]
    pub const fn sub(&self, a: Mont, b: Mont) -> Mont {
        Mont(sub_mod(a.0, b.0, self.modulus))
    }

    /// `a^e` without leaving Montgomery form.
    #[must_use]
    pub fn pow(&self, a: Mont, mut e: u64) -> Mont {
        let mut base = a;
        let mut acc = self.one();
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.mul(base, base);
            e >>= 1;
        }
        acc
    }

    /// Convert a whole vector into Montgomery form.
    #[must_use]
    pub fn to_mont_slice(&self, a: &[u64]) -> Vec<Mont> {
        a.iter().map(|&x| self.to_mont(x)).collect()
    }

    /// Convert a whole vector back to ordinary residues.
    #[must_use]
    pub fn from_mont_slice(&self, a: &[Mont]) -> Vec<u64> {
        a.iter().map(|&x| self.from_mont(x)).collect()
    }

    /// Root table converted once into Montgomery form.
    ///
    /// # Panics
    /// Panics if the table was built for a different modulus.
    #[must_use]
    pub fn convert_roots(&self, roots: &RootTable) -> MontRootTable {
        assert_eq!(
            roots.modulus(),
            self.modulus,
            "root table modulus does not match Montgomery context"
        );
        MontRootTable::new(self.modulus, self.to_mont_slice(roots.as_slice()))
    }
}
