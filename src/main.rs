//! # Main — CLI Entry Point
//!
//! Thin command-line front end over the library. Arithmetic subcommands go
//! through the byte-level `Session` API exactly as an embedding caller would:
//! arguments are parsed, encoded to two's-complement buffers, evaluated, and
//! decoded for display. Primality subcommands drive the Miller–Rabin search
//! states with random witness bases.
//!
//! ## Global Options
//!
//! - `--config` / `MODPRIME_CONFIG`: TOML file (`[fpowm]`, `[primality]`).
//! - `--rounds` / `MODPRIME_ROUNDS`: Miller–Rabin rounds (default 30).
//! - `--seed`: fixed seed for witness selection.
//! - `--json`: machine-readable output.
//!
//! Integers are accepted in decimal or `0x`-prefixed hex; byte buffers are
//! hex strings. Logs go to stderr; `LOG_FORMAT=json` switches to JSON lines
//! and `RUST_LOG` sets the filter.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "modprime",
    about = "Modular exponentiation and Miller-Rabin prime search over GMP"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "MODPRIME_CONFIG")]
    config: Option<PathBuf>,

    /// Miller-Rabin rounds per candidate (overrides the config file)
    #[arg(long, env = "MODPRIME_ROUNDS")]
    rounds: Option<u32>,

    /// Seed for witness base selection (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode an integer as a two's-complement byte buffer (hex)
    Encode {
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },
    /// Decode a two's-complement byte buffer (hex) into an integer
    Decode {
        #[arg(long)]
        hex: String,
    },
    /// Modular exponentiation: base^exponent mod modulus
    Powm {
        #[arg(long, allow_hyphen_values = true)]
        base: String,
        #[arg(long, allow_hyphen_values = true)]
        exponent: String,
        #[arg(long)]
        modulus: String,
    },
    /// Simultaneous exponentiation: product of base_i^exponent_i mod modulus
    Spowm {
        /// Repeat once per term
        #[arg(long = "base", required = true, allow_hyphen_values = true)]
        bases: Vec<String>,
        /// Repeat once per term, in the same order as --base
        #[arg(long = "exponent", required = true, allow_hyphen_values = true)]
        exponents: Vec<String>,
        #[arg(long)]
        modulus: String,
    },
    /// Fixed-base exponentiation: build one table, evaluate many exponents
    Fpowm {
        #[arg(long, allow_hyphen_values = true)]
        base: String,
        #[arg(long)]
        modulus: String,
        /// Table block width (defaults to the config value)
        #[arg(long)]
        block_width: Option<u32>,
        /// Maximum exponent bit length (defaults to the largest given exponent)
        #[arg(long)]
        max_bits: Option<u32>,
        /// Repeat for each exponent to evaluate
        #[arg(long = "exponent", required = true)]
        exponents: Vec<String>,
    },
    /// Legendre symbol (op / prime)
    Legendre {
        #[arg(long, allow_hyphen_values = true)]
        op: String,
        #[arg(long)]
        prime: String,
    },
    /// Test an integer for probable primality
    IsPrime {
        #[arg(long)]
        n: String,
    },
    /// Find the next odd probable prime after a starting point
    NextPrime {
        #[arg(long)]
        start: String,
    },
    /// Test whether n and (n-1)/2 are both probable primes
    IsSafePrime {
        #[arg(long)]
        n: String,
    },
    /// Find the next safe probable prime after a starting point
    NextSafePrime {
        #[arg(long)]
        start: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for log shipping, human-readable otherwise. stdout is
    // reserved for results.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    cli::run(&cli)
}
