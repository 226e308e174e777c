//! Convolution theorem: INTT(NTT(a) ⊙ NTT(b)) is the cyclic convolution.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use montntt_core::{
    intt, mul_mod, naive::{cyclic_convolution_naive, poly_mul_naive}, ntt, poly::pointwise_mul,
    poly_mul, NttPlan, NttPrime, RootTable, BABY_BEAR,
};

#[test]
fn squaring_scenario_baby_bear() {
    let n = 8;
    let roots = RootTable::from_generator(31, n, BABY_BEAR).unwrap();
    let a = vec![1u64, 2, 3, 4, 0, 0, 0, 0];

    let mut fa = a.clone();
    ntt(&mut fa, &roots);
    let mut sq: Vec<u64> = fa.iter().map(|&x| mul_mod(x, x, BABY_BEAR)).collect();
    intt(&mut sq, &roots);

    assert_eq!(sq, vec![1, 4, 10, 20, 25, 24, 16, 0]);
    assert_eq!(sq[..7], poly_mul_naive(&a[..4], &a[..4], BABY_BEAR)[..]);
}

#[test]
fn cyclic_convolution_with_wraparound() {
    // Full-length inputs: terms past n - 1 fold back.
    for prime in [NttPrime::BABY_BEAR, NttPrime::GOLDILOCKS] {
        let p = prime.modulus;
        for k in 0..=7 {
            let n = 1usize << k;
            let roots = RootTable::from_generator(prime.generator, n, p).unwrap();
            let a: Vec<u64> = (0..n as u64).map(|i| (p - 1 - i * 31) % p).collect();
            let b: Vec<u64> = (0..n as u64).map(|i| (i * i + 3) % p).collect();

            let mut fa = a.clone();
            let mut fb = b.clone();
            ntt(&mut fa, &roots);
            ntt(&mut fb, &roots);
            let mut c = pointwise_mul(&fa, &fb, p);
            intt(&mut c, &roots);

            assert_eq!(c, cyclic_convolution_naive(&a, &b, p), "p = {p}, n = {n}");
        }
    }
}

#[test]
fn plan_convolution_matches_naive() {
    let plan = NttPlan::new(NttPrime::GOLDILOCKS, 256).unwrap();
    let a: Vec<u64> = (0..256u64).map(|i| u64::MAX / (i + 2)).collect();
    let b: Vec<u64> = (0..256u64).map(|i| i.wrapping_mul(0xDEAD_BEEF) ^ 0x42).collect();
    let p = plan.prime().modulus;
    let ar: Vec<u64> = a.iter().map(|x| x % p).collect();
    let br: Vec<u64> = b.iter().map(|x| x % p).collect();
    assert_eq!(plan.cyclic_convolution(&ar, &br), cyclic_convolution_naive(&ar, &br, p));
}

#[test]
fn poly_mul_uneven_lengths() {
    for (la, lb) in [(1, 1), (3, 5), (17, 2), (64, 65), (100, 29)] {
        let a: Vec<u64> = (0..la as u64).map(|i| i * 7 + 1).collect();
        let b: Vec<u64> = (0..lb as u64).map(|i| BABY_BEAR - 1 - i).collect();
        let got = poly_mul(&a, &b, NttPrime::BABY_BEAR).unwrap();
        assert_eq!(got.len(), la + lb - 1);
        assert_eq!(got, poly_mul_naive(&a, &b, BABY_BEAR), "lengths ({la}, {lb})");
    }
}

#[test]
fn poly_mul_rejects_oversized_products() {
    let tiny = NttPrime {
        modulus: 97,
        generator: 5,
        two_adicity: 5,
    };
    assert!(poly_mul(&[1; 16], &[1; 16], tiny).is_ok());
    assert!(poly_mul(&[1; 17], &[1; 17], tiny).is_err());
}
