//! Twiddle-factor tables.
//!
//! A [`RootTable`] for length `n` holds `root^i mod N` for `i in 0..n`, where
//! `root` is a primitive `n`-th root of unity. Stage `len` of the butterfly
//! network reads every `(n / 2len)`-th entry, so one flat table serves all
//! stages.

#![deny(rust_2018_idioms)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use anyhow::{ensure, Result};

use crate::modarith::{mod_pow, mul_mod};
use crate::montgomery::Mont;
use crate::primes::is_prime;

/// Powers of a primitive `n`-th root of unity, ordinary form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootTable {
    modulus: u64,
    root: u64,
    roots: Vec<u64>,
}

/// Validate `(root, n, modulus)` and build `[root^0, root^1, ..., root^(n-1)]`.
///
/// # Errors
/// Fails unless `n` is a power of two, `modulus` is prime with `n | modulus - 1`,
/// and `root` has multiplicative order exactly `n`.
pub fn compute_roots(root: u64, n: usize, modulus: u64) -> Result<RootTable> {
    ensure!(n.is_power_of_two(), "transform length {n} is not a power of two");
    ensure!(is_prime(modulus), "modulus {modulus} is not prime");
    ensure!(
        (modulus - 1) % n as u64 == 0,
        "transform length {n} does not divide modulus - 1 = {}",
        modulus - 1
    );
    ensure!(root < modulus, "root {root} is not reduced modulo {modulus}");
    ensure!(
        mod_pow(root, n as u64, modulus) == 1,
        "root {root} is not an {n}-th root of unity mod {modulus}"
    );
    if n >= 2 {
        ensure!(
            mod_pow(root, (n / 2) as u64, modulus) != 1,
            "root {root} is not a primitive {n}-th root of unity mod {modulus}"
        );
    }

    tracing::debug!(root, n, modulus, "computing root table");
    Ok(RootTable {
        modulus,
        root,
        roots: powers(root, n, modulus),
    })
}

/// `[1, w, w^2, ..., w^(n-1)]` with no validation.
fn powers(w: u64, n: usize, modulus: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(n);
    let mut cur = 1 % modulus;
    for _ in 0..n {
        out.push(cur);
        cur = mul_mod(cur, w, modulus);
    }
    out
}

impl RootTable {
    /// Build from a group generator: `root = g^((N-1)/n)`.
    ///
    /// # Errors
    /// Same conditions as [`compute_roots`]; additionally `g` must yield a
    /// primitive root (i.e. be a non-residue of the right order).
    pub fn from_generator(generator: u64, n: usize, modulus: u64) -> Result<Self> {
        ensure!(n.is_power_of_two(), "transform length {n} is not a power of two");
        ensure!(modulus >= 2, "modulus {modulus} is not prime");
        let root = mod_pow(generator, (modulus - 1) / n as u64, modulus);
        compute_roots(root, n, modulus)
    }

    /// Table for the inverse transform: `inv[i] = roots[(n - i) mod n]`.
    #[must_use]
    pub fn conjugate(&self) -> Self {
        let n = self.roots.len();
        let roots = (0..n).map(|i| self.roots[(n - i) % n]).collect();
        let root = if n >= 2 { self.roots[n - 1] } else { self.root };
        Self {
            modulus: self.modulus,
            root,
            roots,
        }
    }

    /// Transform length `n`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Never true for a validated table; kept for API symmetry.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The modulus the table was built for.
    #[inline]
    #[must_use]
    pub const fn modulus(&self) -> u64 {
        self.modulus
    }

    /// The primitive root `w` (`roots[1]` when `n >= 2`).
    #[inline]
    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    /// The powers as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.roots
    }
}

impl std::ops::Index<usize> for RootTable {
    type Output = u64;

    #[inline]
    fn index(&self, i: usize) -> &u64 {
        &self.roots[i]
    }
}

/// A [`RootTable`] already converted to Montgomery form.
///
/// Built by [`crate::MontgomeryContext::convert_roots`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MontRootTable {
    modulus: u64,
    roots: Vec<Mont>,
}

impl MontRootTable {
    pub(crate) const fn new(modulus: u64, roots: Vec<Mont>) -> Self {
        Self { modulus, roots }
    }

    /// Transform length `n`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// True when the table holds no roots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The modulus the table was built for.
    #[inline]
    #[must_use]
    pub const fn modulus(&self) -> u64 {
        self.modulus
    }

    /// The Montgomery-form powers.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Mont] {
        &self.roots
    }

    /// Inverse-transform table, same index rule as [`RootTable::conjugate`].
    #[must_use]
    pub fn conjugate(&self) -> Self {
        let n = self.roots.len();
        Self {
            modulus: self.modulus,
            roots: (0..n).map(|i| self.roots[(n - i) % n]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primes::{BABY_BEAR, GOLDILOCKS};

    #[test]
    fn table_endpoints() {
        for k in 1..=10 {
            let n = 1usize << k;
            let t = RootTable::from_generator(31, n, BABY_BEAR).unwrap();
            assert_eq!(t.len(), n);
            assert_eq!(t[0], 1);
            assert_eq!(t[n / 2], BABY_BEAR - 1, "order-2 element at n/2");
            assert_eq!(mul_mod(t[n - 1], t.root(), BABY_BEAR), 1);
        }
    }

    #[test]
    fn single_entry_table() {
        let t = compute_roots(1, 1, BABY_BEAR).unwrap();
        assert_eq!(t.as_slice(), &[1]);
        assert_eq!(t.conjugate().as_slice(), &[1]);
    }

    #[test]
    fn conjugate_is_inverse() {
        let t = RootTable::from_generator(7, 16, GOLDILOCKS).unwrap();
        let c = t.conjugate();
        for i in 0..16 {
            assert_eq!(mul_mod(t[i], c[i], GOLDILOCKS), 1, "i = {i}");
        }
        assert_eq!(c.conjugate(), t);
    }

    #[test]
    fn rejects_bad_parameters() {
        // not a power of two
        assert!(compute_roots(1, 6, BABY_BEAR).is_err());
        // composite modulus
        assert!(compute_roots(1, 2, 15).is_err());
        // 2^28 does not divide BABY_BEAR - 1
        assert!(RootTable::from_generator(31, 1 << 28, BABY_BEAR).is_err());
        // order-4 root passed as an 8th root
        let w4 = mod_pow(31, (BABY_BEAR - 1) / 4, BABY_BEAR);
        assert!(compute_roots(w4, 8, BABY_BEAR).is_err());
        // not a root of unity at all
        assert!(compute_roots(2, 8, BABY_BEAR).is_err());
        // unreduced
        assert!(compute_roots(BABY_BEAR + 1, 1, BABY_BEAR).is_err());
    }
}
