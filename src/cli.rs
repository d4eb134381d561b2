//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim: argument parsing
//! helpers, configuration resolution, and one function per subcommand.

use anyhow::{anyhow, Context, Result};
use modprime::codec;
use modprime::config::Config;
use modprime::miller_rabin;
use modprime::registry::Session;
use modprime::safe_prime;
use rug::rand::RandState;
use rug::Integer;
use serde_json::json;
use tracing::{debug, info};

use super::{Cli, Commands};

/// Effective settings after merging the config file with CLI overrides.
struct Settings {
    block_width: u32,
    rounds: u32,
    seed: Option<u64>,
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let config = Config::load(cli.config.as_deref())?;
    let rounds = cli.rounds.unwrap_or(config.primality.rounds);
    if rounds == 0 {
        anyhow::bail!("--rounds must be at least 1");
    }
    Ok(Settings {
        block_width: config.fpowm.block_width,
        rounds,
        seed: cli.seed.or(config.primality.seed),
    })
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    let settings = resolve_settings(cli)?;
    let (name, result) = match &cli.command {
        Commands::Encode { value } => ("encode", json!(to_hex(&codec::encode(&parse_int(value)?)))),
        Commands::Decode { hex } => ("decode", json!(decode_hex(hex)?.to_string())),
        Commands::Powm {
            base,
            exponent,
            modulus,
        } => ("powm", json!(run_powm(base, exponent, modulus)?.to_string())),
        Commands::Spowm {
            bases,
            exponents,
            modulus,
        } => ("spowm", json!(run_spowm(bases, exponents, modulus)?.to_string())),
        Commands::Fpowm {
            base,
            modulus,
            block_width,
            max_bits,
            exponents,
        } => {
            let width = block_width.unwrap_or(settings.block_width);
            let values = run_fpowm(base, modulus, width, *max_bits, exponents)?;
            let values: Vec<String> = values.iter().map(Integer::to_string).collect();
            ("fpowm", json!(values))
        }
        Commands::Legendre { op, prime } => {
            let session = Session::new();
            let symbol = session.legendre(&arg_bytes(op)?, &arg_bytes(prime)?)?;
            ("legendre", json!(symbol))
        }
        Commands::IsPrime { n } => {
            let n = parse_int(n)?;
            let mut rng = witness_rng(settings.seed);
            let prime = miller_rabin::is_probable_prime(&n, settings.rounds, &mut rng)?;
            ("is-prime", json!(prime))
        }
        Commands::NextPrime { start } => {
            let start = parse_int(start)?;
            let mut rng = witness_rng(settings.seed);
            info!(bits = start.significant_bits(), rounds = settings.rounds, "searching for next prime");
            let p = miller_rabin::next_probable_prime(&start, settings.rounds, &mut rng)?;
            ("next-prime", json!(p.to_string()))
        }
        Commands::IsSafePrime { n } => {
            let n = parse_int(n)?;
            let mut rng = witness_rng(settings.seed);
            let safe = safe_prime::is_safe_prime(&n, settings.rounds, &mut rng)?;
            ("is-safe-prime", json!(safe))
        }
        Commands::NextSafePrime { start } => {
            let start = parse_int(start)?;
            let mut rng = witness_rng(settings.seed);
            info!(bits = start.significant_bits(), rounds = settings.rounds, "searching for next safe prime");
            let p = safe_prime::next_safe_prime(&start, settings.rounds, &mut rng)?;
            ("next-safe-prime", json!(p.to_string()))
        }
    };

    if cli.json {
        println!("{}", json!({ "command": name, "result": result }));
    } else {
        match result {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Array(items) => {
                for item in items {
                    println!("{}", item.as_str().unwrap_or_default());
                }
            }
            other => println!("{}", other),
        }
    }
    Ok(())
}

// ── Subcommands ─────────────────────────────────────────────────

fn run_powm(base: &str, exponent: &str, modulus: &str) -> Result<Integer> {
    let session = Session::new();
    let out = session.pow_mod(&arg_bytes(base)?, &arg_bytes(exponent)?, &arg_bytes(modulus)?)?;
    Ok(codec::decode(&out)?)
}

fn run_spowm(bases: &[String], exponents: &[String], modulus: &str) -> Result<Integer> {
    let bases = bases.iter().map(|b| arg_bytes(b)).collect::<Result<Vec<_>>>()?;
    let exponents = exponents.iter().map(|e| arg_bytes(e)).collect::<Result<Vec<_>>>()?;
    let session = Session::new();
    let out = session.simultaneous_pow_mod(&bases, &exponents, &arg_bytes(modulus)?)?;
    Ok(codec::decode(&out)?)
}

fn run_fpowm(
    base: &str,
    modulus: &str,
    block_width: u32,
    max_bits: Option<u32>,
    exponents: &[String],
) -> Result<Vec<Integer>> {
    let exponents = exponents.iter().map(|e| parse_int(e)).collect::<Result<Vec<_>>>()?;
    let max_bits = max_bits.unwrap_or_else(|| {
        exponents
            .iter()
            .map(|e| e.significant_bits())
            .max()
            .unwrap_or(0)
    });

    let mut session = Session::new();
    let table = session.compile_table(&arg_bytes(base)?, &arg_bytes(modulus)?, block_width, max_bits)?;
    debug!(id = table.id(), block_width, max_bits, "table ready");
    let results = exponents
        .iter()
        .map(|e| {
            let out = session.table_pow(table, &codec::encode(e))?;
            Ok(codec::decode(&out)?)
        })
        .collect::<Result<Vec<_>>>();
    session.release_table(table)?;
    results
}

// ── Argument helpers ────────────────────────────────────────────

/// Parse a decimal or `0x`-prefixed hex integer, optionally negative.
pub fn parse_int(s: &str) -> Result<Integer> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (radix, digits) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, body),
    };
    if digits.starts_with(|c: char| c == '+' || c == '-') {
        anyhow::bail!("invalid integer {:?}: misplaced sign", s);
    }
    let value = Integer::from_str_radix(digits, radix)
        .map_err(|e| anyhow!("invalid integer {:?}: {}", s, e))?;
    Ok(if negative { -value } else { value })
}

fn arg_bytes(s: &str) -> Result<Vec<u8>> {
    Ok(codec::encode(&parse_int(s)?))
}

fn decode_hex(s: &str) -> Result<Integer> {
    let bytes = from_hex(s)?;
    codec::decode(&bytes).with_context(|| format!("decoding {:?}", s))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() % 2 != 0 {
        anyhow::bail!("hex buffer {:?} has an odd number of digits", s);
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                Ok(hex_value(*hi) << 4 | hex_value(*lo))
            }
            _ => Err(anyhow!("invalid hex buffer {:?}", s)),
        })
        .collect()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// GMP random state seeded from `seed`, or from the clock when unset.
fn witness_rng(seed: Option<u64>) -> RandState<'static> {
    let seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    let mut rng = RandState::new();
    rng.seed(&Integer::from(seed));
    rng
}
