//! Numeric helpers behind the `fibonacci`, `prime`, `lcm` and `hcf` keys.

use thiserror::Error;

/// Largest Fibonacci term count whose last term fits in a `u64` (F(93)).
pub const MAX_FIBONACCI_TERMS: i64 = 94;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("at least one number is required")]
    EmptyInput,

    #[error("result does not fit in an unsigned 64-bit integer")]
    Overflow,
}

/// Trial division up to floor(sqrt(n)).
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    let mut i = 2;
    // `i <= n / i` is `i * i <= n` without the overflow.
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

pub fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// `a * b / gcd(a, b)`, treating a zero gcd as 1. `None` on overflow.
pub fn lcm(a: u64, b: u64) -> Option<u64> {
    let divisor = match gcd(a, b) {
        0 => 1,
        g => g,
    };
    (a / divisor).checked_mul(b)
}

/// The first `n` Fibonacci numbers, starting `0, 1, 1, 2, ...`.
pub fn fibonacci(n: i64) -> Result<Vec<u64>, MathError> {
    if n <= 0 {
        return Ok(Vec::new());
    }
    if n > MAX_FIBONACCI_TERMS {
        return Err(MathError::Overflow);
    }

    let n = n as usize;
    let mut sequence = Vec::with_capacity(n);
    sequence.push(0u64);
    if n > 1 {
        sequence.push(1);
    }
    while sequence.len() < n {
        let len = sequence.len();
        sequence.push(sequence[len - 1] + sequence[len - 2]);
    }
    Ok(sequence)
}

/// Keep the primes, in input order.
pub fn filter_primes(values: &[i64]) -> Vec<u64> {
    values
        .iter()
        .filter(|&&n| is_prime(n))
        .map(|n| n.unsigned_abs())
        .collect()
}

/// Left fold of [`lcm`] over the absolute values.
pub fn lcm_of(values: &[i64]) -> Result<u64, MathError> {
    let (first, rest) = values.split_first().ok_or(MathError::EmptyInput)?;
    rest.iter().try_fold(first.unsigned_abs(), |acc, v| {
        lcm(acc, v.unsigned_abs()).ok_or(MathError::Overflow)
    })
}

/// Left fold of [`gcd`] over the absolute values.
pub fn hcf_of(values: &[i64]) -> Result<u64, MathError> {
    let (first, rest) = values.split_first().ok_or(MathError::EmptyInput)?;
    Ok(rest
        .iter()
        .fold(first.unsigned_abs(), |acc, v| gcd(acc, v.unsigned_abs())))
}
