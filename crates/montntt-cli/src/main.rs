// crates/montntt-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use montntt_core::{
    intt, naive::poly_mul_naive, ntt, ntt_montgomery, ntt_montgomery_core, poly_mul, Kernel,
    NttPlan, NttPrime, RootTable,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "montntt",
    about = "NTT polynomial arithmetic over 64-bit primes",
    long_about = "NTT polynomial arithmetic over 64-bit primes.\n\nMultiply polynomials, inspect root tables, and check the transform kernels against each other.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Multiply two polynomials (coefficients low-to-high, comma-separated)
    Multiply {
        /// First polynomial, e.g. `1,2,3`
        #[arg(long, value_delimiter = ',', required = true)]
        a: Vec<u64>,

        /// Second polynomial
        #[arg(long, value_delimiter = ',', required = true)]
        b: Vec<u64>,

        /// Prime field
        #[arg(long, value_enum, default_value_t = PrimeOpt::BabyBear)]
        prime: PrimeOpt,

        /// Emit JSON instead of a plain list
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the twiddle table for a 2^k transform
    Roots {
        /// log2 of the transform length
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=20))]
        log_n: u32,

        /// Prime field
        #[arg(long, value_enum, default_value_t = PrimeOpt::BabyBear)]
        prime: PrimeOpt,

        /// Emit JSON instead of one root per line
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Cross-check every transform variant for sizes 2^0 ..= 2^max_log_n
    Selfcheck {
        /// Largest log2 size to check
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(0..=20))]
        max_log_n: u32,

        /// Prime field
        #[arg(long, value_enum, default_value_t = PrimeOpt::BabyBear)]
        prime: PrimeOpt,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum PrimeOpt {
    /// p = 15·2^27 + 1
    BabyBear,
    /// p = 2^64 − 2^32 + 1
    Goldilocks,
}

impl From<PrimeOpt> for NttPrime {
    fn from(p: PrimeOpt) -> Self {
        match p {
            PrimeOpt::BabyBear => Self::BABY_BEAR,
            PrimeOpt::Goldilocks => Self::GOLDILOCKS,
        }
    }
}

#[derive(Serialize)]
struct ProductOut<'a> {
    modulus: u64,
    a: &'a [u64],
    b: &'a [u64],
    product: &'a [u64],
}

#[derive(Serialize)]
struct RootsOut<'a> {
    modulus: u64,
    n: usize,
    root: u64,
    roots: &'a [u64],
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Multiply { a, b, prime, json } => multiply(&a, &b, prime.into(), json),
        Cmd::Roots { log_n, prime, json } => roots(log_n, prime.into(), json),
        Cmd::Selfcheck { max_log_n, prime } => selfcheck(max_log_n, prime.into()),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn multiply(a: &[u64], b: &[u64], prime: NttPrime, json: bool) -> Result<()> {
    info!(len_a = a.len(), len_b = b.len(), modulus = prime.modulus, "multiplying");
    let product = poly_mul(a, b, prime).context("NTT polynomial product")?;

    if json {
        let out = ProductOut {
            modulus: prime.modulus,
            a,
            b,
            product: &product,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let parts: Vec<String> = product.iter().map(u64::to_string).collect();
        println!("{}", parts.join(","));
    }
    Ok(())
}

fn roots(log_n: u32, prime: NttPrime, json: bool) -> Result<()> {
    let n = 1usize << log_n;
    let root = prime.root_of_unity(n)?;
    let table = RootTable::from_generator(prime.generator, n, prime.modulus)
        .with_context(|| format!("root table for n = {n}, p = {}", prime.modulus))?;
    info!(n, root, modulus = prime.modulus, "root table");

    if json {
        let out = RootsOut {
            modulus: prime.modulus,
            n,
            root,
            roots: table.as_slice(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (i, w) in table.as_slice().iter().enumerate() {
            println!("{i}\t{w}");
        }
    }
    Ok(())
}

/// Deterministic test vector (LCG), reduced mod `p`.
fn det_vec(n: usize, seed: u64, p: u64) -> Vec<u64> {
    let mut s = seed;
    (0..n)
        .map(|_| {
            s = s
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            s % p
        })
        .collect()
}

/// Naive convolution is O(n²); skip it past this size.
const NAIVE_MAX_LOG_N: u32 = 11;

fn selfcheck(max_log_n: u32, prime: NttPrime) -> Result<()> {
    ensure!(
        max_log_n <= prime.two_adicity,
        "2^{max_log_n} exceeds the 2-adicity of p = {}",
        prime.modulus
    );
    let p = prime.modulus;
    let kernel = Kernel::detect();
    if kernel == Kernel::Scalar {
        warn!("AVX2 unavailable; vector kernel check degenerates to scalar");
    }
    info!(max_log_n, modulus = p, %kernel, "self-check");

    for k in 0..=max_log_n {
        let n = 1usize << k;
        let plan = NttPlan::new(prime, n)
            .with_context(|| format!("plan for n = {n}"))?
            .with_kernel(kernel);
        let (roots, ctx) = (plan.roots(), plan.context());
        let x = det_vec(n, u64::from(k) + 1, p);

        let mut plain = x.clone();
        ntt(&mut plain, roots);
        let mut mont = x.clone();
        ntt_montgomery(&mut mont, roots, ctx);
        if plain != mont {
            bail!("n = {n}: ntt_montgomery disagrees with ntt");
        }

        let mut scalar = ctx.to_mont_slice(&x);
        ntt_montgomery_core(&mut scalar, plan.mont_roots(), ctx);
        let mut vector = ctx.to_mont_slice(&x);
        let ran = plan.forward_mont(&mut vector);
        if scalar != vector {
            bail!("n = {n}: {ran} core disagrees with scalar core");
        }
        if ctx.from_mont_slice(&scalar) != plain {
            bail!("n = {n}: Montgomery core disagrees with ntt");
        }

        let mut back = plain;
        intt(&mut back, roots);
        if back != x {
            bail!("n = {n}: intt(ntt(x)) != x");
        }

        if k <= NAIVE_MAX_LOG_N && n >= 2 {
            let y = det_vec(n / 2, u64::from(k) + 101, p);
            let half = &x[..n / 2];
            let fast = poly_mul(half, &y, prime)?;
            if fast != poly_mul_naive(half, &y, p) {
                bail!("n = {n}: poly_mul disagrees with naive convolution");
            }
        }
        info!(n, kernel = %ran, "ok");
    }

    println!("self-check passed for 2^0 ..= 2^{max_log_n} (kernel: {kernel})");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_comma_lists() {
        let cli = Cli::try_parse_from(["montntt", "multiply", "--a", "1,2,3", "--b", "4,5"]).unwrap();
        match cli.cmd {
            Cmd::Multiply { a, b, prime, json } => {
                assert_eq!(a, vec![1, 2, 3]);
                assert_eq!(b, vec![4, 5]);
                assert_eq!(prime, PrimeOpt::BabyBear);
                assert!(!json);
            }
            other => unreachable!("unexpected subcommand {other:?}"),
        }
    }

    #[test]
    fn selfcheck_small() {
        selfcheck(6, NttPrime::GOLDILOCKS).unwrap();
        assert!(selfcheck(28, NttPrime::BABY_BEAR).is_err());
    }
}
