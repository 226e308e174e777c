//! Quadratic reference convolutions. Used to validate the transforms.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use crate::modarith::{add_mod, mul_mod};

/// Linear convolution: `c[i + j] += a[i]·b[j]`, length `len(a) + len(b) - 1`.
/// **O(n·m)**. Empty when either input is empty.
#[must_use]
pub fn poly_mul_naive(a: &[u64], b: &[u64], modulus: u64) -> Vec<u64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut c = vec![0u64; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            c[i + j] = add_mod(c[i + j], mul_mod(ai, bj, modulus), modulus);
        }
    }
    c
}

/// Cyclic convolution of two length-`n` vectors: index `(i + j) mod n`.
///
/// # Panics
/// Panics if the lengths differ.
#[must_use]
pub fn cyclic_convolution_naive(a: &[u64], b: &[u64], modulus: u64) -> Vec<u64> {
    assert_eq!(a.len(), b.len(), "cyclic convolution needs equal lengths");
    let n = a.len();
    let mut c = vec![0u64; n];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            let k = (i + j) % n;
            c[k] = add_mod(c[k], mul_mod(ai, bj, modulus), modulus);
        }
    }
    c
}
