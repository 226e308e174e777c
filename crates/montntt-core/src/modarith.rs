//! Scalar arithmetic modulo a 64-bit prime.
//!
//! Every other layer (Montgomery engine, root tables, transforms) builds on
//! these four operations. Inputs are ordinary residues in `[0, modulus)`; the
//! modulus is assumed prime and nonzero (caller precondition, not checked).

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

/// `(a + b) mod modulus`, correct even when `a + b` wraps past `2^64`.
#[inline]
#[must_use]
pub const fn add_mod(a: u64, b: u64, modulus: u64) -> u64 {
    let (s, carry) = a.overflowing_add(b);
    if carry || s >= modulus {
        s.wrapping_sub(modulus)
    } else {
        s
    }
}

/// `(a - b) mod modulus` without underflow.
#[inline]
#[must_use]
pub const fn sub_mod(a: u64, b: u64, modulus: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        // a + (modulus - b), ordered so no intermediate leaves [0, 2^64).
        modulus - (b - a)
    }
}

/// `(a * b) mod modulus` through a 128-bit product.
#[inline]
#[must_use]
pub const fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    let prod = (a as u128) * (b as u128);
    (prod % (modulus as u128)) as u64
}

/// Binary exponentiation: `a^e mod modulus` in `O(log e)` multiplications.
///
/// `a` need not be reduced. `mod_pow(_, 0, m)` is `1 % m`.
#[must_use]
pub const fn mod_pow(a: u64, mut e: u64, modulus: u64) -> u64 {
    let mut base = a % modulus;
    let mut acc = 1 % modulus;
    while e > 0 {
        if e & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        e >>= 1;
    }
    acc
}

/// Multiplicative inverse via Fermat's little theorem (`a^(p-2)`).
///
/// Only meaningful for prime `modulus` and `a % modulus != 0`.
#[inline]
#[must_use]
pub const fn inv_mod(a: u64, modulus: u64) -> u64 {
    mod_pow(a, modulus - 2, modulus)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BB: u64 = 2_013_265_921;
    const GL: u64 = 0xffff_ffff_0000_0001;

    #[test]
    fn add_wraps_past_u64() {
        // (GL-1) + (GL-1) overflows u64.
        assert_eq!(add_mod(GL - 1, GL - 1, GL), GL - 2);
        assert_eq!(add_mod(BB - 1, 1, BB), 0);
        assert_eq!(add_mod(3, 4, BB), 7);
    }

    #[test]
    fn sub_borrows() {
        assert_eq!(sub_mod(3, 5, BB), BB - 2);
        assert_eq!(sub_mod(0, GL - 1, GL), 1);
        assert_eq!(sub_mod(9, 9, BB), 0);
    }

    #[test]
    fn mul_and_pow() {
        assert_eq!(mul_mod(GL - 1, GL - 1, GL), 1);
        assert_eq!(mod_pow(2, 10, BB), 1024);
        assert_eq!(mod_pow(31, BB - 1, BB), 1);
        assert_eq!(mod_pow(5, 0, BB), 1);
        assert_eq!(mod_pow(BB + 2, 3, BB), 8);
    }

    #[test]
    fn fermat_inverse() {
        for a in [1u64, 2, 8, 12_345, BB - 1] {
            assert_eq!(mul_mod(a, inv_mod(a, BB), BB), 1, "a = {a}");
        }
        assert_eq!(mul_mod(7, inv_mod(7, GL), GL), 1);
    }
}
