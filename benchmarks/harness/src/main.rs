//! montntt-bench-harness
//!
//! Time each transform variant (plain, Montgomery with conversion, Montgomery
//! core on pre-converted data, AVX2 core) and report the median of repeated
//! runs plus the speedup over the plain transform. Rows are appended to
//! `benchmarks/reports/bench-<unix>.csv`.
//!
//! `BENCH_N` in the environment overrides the profile's transform size.
//!
//! Usage examples:
//!   cargo run --release -p montntt-bench-harness -- --profile configs/profiles/small.toml
//!   BENCH_N=65536 cargo run --release -p montntt-bench-harness

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use montntt_core::{
    ntt, ntt_montgomery, ntt_montgomery_core_with, Kernel, MontgomeryContext, NttPrime, RootTable,
};

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum PrimeSel {
    BabyBear,
    Goldilocks,
}

impl PrimeSel {
    const fn prime(self) -> NttPrime {
        match self {
            Self::BabyBear => NttPrime::BABY_BEAR,
            Self::Goldilocks => NttPrime::GOLDILOCKS,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::BabyBear => "baby-bear",
            Self::Goldilocks => "goldilocks",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Profile {
    /// Field to run over
    prime: PrimeSel,
    /// Transform size is 2^log_n unless BENCH_N is set
    log_n: u32,
    /// Repetitions per variant; the median is reported
    runs: usize,
    /// Share of leading coefficients that are non-zero
    #[serde(default = "default_fill")]
    fill_fraction: f64,
}

const fn default_fill() -> f64 {
    0.125
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

/// Transform size: `BENCH_N` if set, else `2^log_n`.
fn resolve_n(profile: &Profile) -> Result<usize> {
    let prime = profile.prime.prime();
    let n = match std::env::var("BENCH_N") {
        Ok(s) => s
            .trim()
            .parse::<usize>()
            .with_context(|| format!("BENCH_N={s:?} is not a size"))?,
        Err(_) => {
            ensure!(
                profile.log_n <= prime.two_adicity,
                "log_n = {} exceeds 2-adicity {} of {}",
                profile.log_n,
                prime.two_adicity,
                profile.prime.label()
            );
            1usize << profile.log_n
        }
    };
    ensure!(
        prime.supports_len(n),
        "transform size {n} is not a power of two up to 2^{}",
        prime.two_adicity
    );
    Ok(n)
}

/// Median wall time of `runs` calls.
fn median<F: FnMut()>(runs: usize, mut f: F) -> Duration {
    let mut times: Vec<Duration> = (0..runs.max(1))
        .map(|_| {
            let t0 = Instant::now();
            f();
            t0.elapsed()
        })
        .collect();
    times.sort();
    times[times.len() / 2]
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "configs/profiles/small.toml"));
    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;
    ensure!(
        profile.fill_fraction > 0.0 && profile.fill_fraction <= 1.0,
        "fill_fraction must be in (0, 1]"
    );

    let prime = profile.prime.prime();
    let n = resolve_n(&profile)?;
    println!(
        "Profile: prime={}, n={n}, runs={}, fill={}",
        profile.prime.label(),
        profile.runs,
        profile.fill_fraction
    );

    let roots = RootTable::from_generator(prime.generator, n, prime.modulus)
        .with_context(|| format!("root table for n = {n}"))?;
    let ctx = MontgomeryContext::new(prime.modulus)?;
    let mroots = ctx.convert_roots(&roots);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((n as f64) * profile.fill_fraction).ceil() as usize;
    let mut input = vec![0u64; n];
    for (i, x) in input.iter_mut().take(filled).enumerate() {
        *x = (i as u64 + 1) % prime.modulus;
    }
    let input_mont = ctx.to_mont_slice(&input);

    let mut rows: Vec<(&str, Duration)> = Vec::new();
    rows.push((
        "baseline",
        median(profile.runs, || {
            let mut t = input.clone();
            ntt(&mut t, &roots);
        }),
    ));
    rows.push((
        "montgomery",
        median(profile.runs, || {
            let mut t = input.clone();
            ntt_montgomery(&mut t, &roots, &ctx);
        }),
    ));
    rows.push((
        "core",
        median(profile.runs, || {
            let mut t = input_mont.clone();
            ntt_montgomery_core_with(Kernel::Scalar, &mut t, &mroots, &ctx);
        }),
    ));
    if Kernel::Avx2.is_available() {
        rows.push((
            "avx2",
            median(profile.runs, || {
                let mut t = input_mont.clone();
                ntt_montgomery_core_with(Kernel::Avx2, &mut t, &mroots, &ctx);
            }),
        ));
    } else {
        println!("AVX2 unavailable; skipping vector core");
    }

    fs::create_dir_all("benchmarks/reports").ok();
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let csv_path = PathBuf::from(format!("benchmarks/reports/bench-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)
        .with_context(|| format!("open {}", csv_path.display()))?;
    writeln!(csv, "timestamp,prime,n,variant,median_ms,speedup")?;

    let baseline = ms(rows[0].1);
    for (variant, d) in &rows {
        let t = ms(*d);
        let speedup = if t > 0.0 { baseline / t } else { 0.0 };
        println!("{variant:>10}: {t:9.3} ms median  ({speedup:.2}x vs baseline)");
        writeln!(
            csv,
            "{ts},{},{n},{variant},{t:.6},{speedup:.4}",
            profile.prime.label()
        )?;
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_parse() {
        for src in [
            include_str!("../../../configs/profiles/small.toml"),
            include_str!("../../../configs/profiles/large.toml"),
        ] {
            let p: Profile = toml::from_str(src).unwrap();
            assert!(p.runs > 0);
            assert!(p.prime.prime().two_adicity >= p.log_n);
        }
    }

    #[test]
    fn fill_defaults() {
        let p: Profile = toml::from_str("prime = \"goldilocks\"\nlog_n = 4\nruns = 1\n").unwrap();
        assert!((p.fill_fraction - 0.125).abs() < f64::EPSILON);
        assert_eq!(p.prime.label(), "goldilocks");
    }

    #[test]
    fn oversized_log_n_is_an_error() {
        if std::env::var_os("BENCH_N").is_some() {
            return;
        }
        for log_n in [28, 64, 200] {
            let p: Profile =
                toml::from_str(&format!("prime = \"baby-bear\"\nlog_n = {log_n}\nruns = 1\n"))
                    .unwrap();
            assert!(resolve_n(&p).is_err(), "log_n = {log_n}");
        }
        let p: Profile = toml::from_str("prime = \"baby-bear\"\nlog_n = 27\nruns = 1\n").unwrap();
        assert_eq!(resolve_n(&p).unwrap(), 1 << 27);
    }

    #[test]
    fn median_picks_middle() {
        let mut calls = 0;
        let _ = median(3, || calls += 1);
        assert_eq!(calls, 3);
        assert_eq!(median(0, || {}).as_secs(), 0);
    }
}
