//! Byte-level scenarios through `registry::Session`.
//!
//! Every test talks to the library the way an embedding caller does: integers
//! are passed as two's-complement buffers and stateful objects as handles.
//! The scenarios mirror the end-to-end checks a binding would run: plain,
//! simultaneous and fixed-base exponentiation against GMP, Legendre symbols
//! against Euler's criterion, and prime / safe-prime searches against GMP's
//! `next_prime`.

use modprime::codec::{decode, encode};
use modprime::miller_rabin::{random_witness, Witness};
use modprime::registry::Session;
use modprime::ArithError;
use rug::integer::IsPrime;
use rug::ops::RemRounding;
use rug::rand::RandState;
use rug::Integer;

fn enc(v: impl Into<Integer>) -> Vec<u8> {
    encode(&v.into())
}

fn random_bits(bits: u32, rng: &mut RandState<'_>) -> Integer {
    Integer::from(Integer::random_bits(bits, rng))
}

fn seeded(seed: u32) -> RandState<'static> {
    let mut rng = RandState::new();
    rng.seed(&Integer::from(seed));
    rng
}

#[test]
fn powm_fixture_through_bytes() {
    let s = Session::new();
    let out = s.pow_mod(&enc(4), &enc(13), &enc(497)).unwrap();
    assert_eq!(out, vec![0x00, 0x01, 0xBD]);
    assert_eq!(decode(&out).unwrap(), 445);
}

#[test]
fn powm_matches_gmp_on_random_inputs() {
    let s = Session::new();
    let mut rng = seeded(1);
    for _ in 0..20 {
        let m = random_bits(512, &mut rng) + 1u32;
        let b = random_bits(512, &mut rng);
        let e = random_bits(512, &mut rng);
        let expected = b.clone().pow_mod(&e, &m).unwrap();
        let out = s.pow_mod(&encode(&b), &encode(&e), &encode(&m)).unwrap();
        assert_eq!(decode(&out).unwrap(), expected);
    }
}

#[test]
fn spowm_fifty_terms_matches_sequential_product() {
    let s = Session::new();
    let mut rng = seeded(2);
    let m = random_bits(256, &mut rng) + 1u32;
    let bases: Vec<Integer> = (0..50).map(|_| random_bits(256, &mut rng) % &m).collect();
    let exps: Vec<Integer> = (0..50).map(|_| random_bits(256, &mut rng)).collect();

    let mut expected = Integer::from(1u32);
    for (b, e) in bases.iter().zip(&exps) {
        expected *= b.clone().pow_mod(e, &m).unwrap();
        expected %= &m;
    }

    let bases: Vec<Vec<u8>> = bases.iter().map(encode).collect();
    let exps: Vec<Vec<u8>> = exps.iter().map(encode).collect();
    let out = s.simultaneous_pow_mod(&bases, &exps, &encode(&m)).unwrap();
    assert_eq!(decode(&out).unwrap(), expected);
}

#[test]
fn spowm_rejects_mismatched_lengths() {
    let s = Session::new();
    let bases = vec![enc(2), enc(3)];
    let exps = vec![enc(5)];
    assert_eq!(
        s.simultaneous_pow_mod(&bases, &exps, &enc(7)),
        Err(ArithError::LengthMismatch { bases: 2, exponents: 1 })
    );
}

#[test]
fn fixed_base_table_lifecycle() {
    let mut s = Session::new();
    let mut rng = seeded(3);
    let bits = 256;
    let m = random_bits(bits, &mut rng) + 1u32;
    let g = random_bits(bits, &mut rng);

    let table = s.compile_table(&encode(&g), &encode(&m), 16, bits).unwrap();
    for _ in 0..20 {
        let e = random_bits(bits, &mut rng);
        let out = s.table_pow(table, &encode(&e)).unwrap();
        assert_eq!(decode(&out).unwrap(), g.clone().pow_mod(&e, &m).unwrap());
    }
    s.release_table(table).unwrap();
    assert_eq!(s.live_handles(), 0);
    assert!(s.table_pow(table, &enc(1)).is_err());
}

#[test]
fn legendre_matches_euler_criterion() {
    let s = Session::new();
    let mut rng = seeded(4);
    for _ in 0..20 {
        let p = random_bits(128, &mut rng).next_prime();
        let a = random_bits(128, &mut rng);
        let symbol = s.legendre(&encode(&a), &encode(&p)).unwrap();
        let exponent = Integer::from(&p - 1u32) >> 1u32;
        let euler = a.pow_mod(&exponent, &p).unwrap();
        let expected = Integer::from(symbol).rem_euc(&p);
        assert_eq!(euler, expected);
    }
}

#[test]
fn prime_search_init_fixtures() {
    let mut s = Session::new();
    assert_eq!(s.prime_search_init(&enc(9), false).unwrap(), None);
    let h = s.prime_search_init(&enc(9), true).unwrap().unwrap();
    assert_eq!(decode(&s.prime_current(h).unwrap()).unwrap(), 11);
    s.release_prime_search(h).unwrap();
}

#[test]
fn prime_test_matches_gmp() {
    let mut s = Session::new();
    let mut rng = seeded(5);
    for _ in 0..50 {
        let n = random_bits(96, &mut rng) + 1u32;
        let mut verdict = false;
        if let Some(h) = s.prime_search_init(&encode(&n), false).unwrap() {
            verdict = (0..30).all(|_| {
                let a = random_witness(&n, &mut rng);
                s.prime_test_witness(h, &encode(&a)).unwrap() == Witness::ProbablyPrime
            });
            s.release_prime_search(h).unwrap();
        }
        assert_eq!(verdict, n.is_probably_prime(50) != IsPrime::No, "n = {}", n);
    }
    assert_eq!(s.live_handles(), 0);
}

#[test]
fn next_prime_search_matches_gmp() {
    let mut s = Session::new();
    let mut rng = seeded(6);
    for _ in 0..10 {
        let start = random_bits(100, &mut rng);
        let expected = start.clone().next_prime();

        let h = s.prime_search_init(&encode(&start), true).unwrap().unwrap();
        let found = loop {
            let cand = decode(&s.prime_current(h).unwrap()).unwrap();
            let passes = (0..30).all(|_| {
                let a = random_witness(&cand, &mut rng);
                s.prime_test_witness(h, &encode(&a)).unwrap().is_probably_prime()
            });
            if passes {
                break cand;
            }
            s.prime_next_candidate(h).unwrap();
        };
        s.release_prime_search(h).unwrap();
        assert_eq!(found, expected);
    }
}

#[test]
fn next_safe_prime_search_and_verify() {
    let mut s = Session::new();
    let mut rng = seeded(7);
    let start = random_bits(48, &mut rng);

    // Naive reference: step through GMP primes until (p-1)/2 is prime too.
    let mut expected = start.clone().next_prime();
    while (Integer::from(&expected - 1u32) >> 1u32).is_probably_prime(30) == IsPrime::No {
        expected = expected.next_prime();
    }

    let h = s.safe_search_init(&encode(&start), true).unwrap().unwrap();
    let found = loop {
        let n = decode(&s.safe_current(h).unwrap()).unwrap();
        let m = Integer::from(&n - 1u32) >> 1u32;
        let passes = (0..30i64).all(|i| {
            let modulus = if i % 2 == 0 { &n } else { &m };
            let a = random_witness(modulus, &mut rng);
            s.safe_test_witness(h, &encode(&a), i).unwrap() == Witness::ProbablyPrime
        });
        if passes {
            break n;
        }
        s.safe_next_candidate(h).unwrap();
    };
    s.release_safe_search(h).unwrap();
    assert_eq!(found, expected);

    // Re-check the result in test mode.
    let h = s.safe_search_init(&encode(&found), false).unwrap().unwrap();
    assert_eq!(s.safe_test_witness(h, &enc(2), 0).unwrap(), Witness::ProbablyPrime);
    assert_eq!(s.safe_test_witness(h, &enc(3), 1).unwrap(), Witness::ProbablyPrime);
    s.release_safe_search(h).unwrap();
    assert_eq!(s.live_handles(), 0);
}

#[test]
fn released_handles_are_stale_for_every_operation() {
    let mut s = Session::new();
    let h = s.safe_search_init(&enc(100), true).unwrap().unwrap();
    s.release_safe_search(h).unwrap();
    let stale = ArithError::StaleHandle { id: h.id() };
    assert_eq!(s.safe_next_candidate(h), Err(stale.clone()));
    assert_eq!(s.safe_current(h), Err(stale.clone()));
    assert_eq!(s.safe_test_witness(h, &enc(2), 0), Err(stale.clone()));
    assert_eq!(s.release_safe_search(h), Err(stale));
}

#[test]
fn non_positive_search_start_is_rejected() {
    let mut s = Session::new();
    assert_eq!(s.prime_search_init(&enc(0), true), Err(ArithError::NonPositive));
    assert_eq!(s.safe_search_init(&enc(-5), false), Err(ArithError::NonPositive));
}
