//! Shamir threshold sharing over GF(256).
//!
//! Every byte of the secret gets its own random polynomial of degree `k - 1`
//! whose constant term is that byte; share `i` holds the evaluations at `x = i`.
//! Any `k` shares interpolate the constant terms back. Fewer than `k` shares
//! interpolate a lower-degree polynomial and yield an unrelated value.
//!
//! [`combine`] deliberately does not know the threshold. Checking that enough
//! shares were supplied is the caller's job.

mod field;
mod share;

pub use share::{Share, decode_share_set, encode_share_set};

use field::Gf256;
use rand::RngCore;
use std::collections::HashSet;
use thiserror::Error;
use zeroize::Zeroizing;

/// Default share count when none is configured.
pub const DEFAULT_TOTAL_SHARES: u8 = 5;
/// Default reconstruction quorum when none is configured.
pub const DEFAULT_THRESHOLD: u8 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SharingError {
    #[error("invalid sharing parameters: {0}")]
    InvalidParameters(String),
    #[error("malformed share: {0}")]
    Malformed(String),
}

pub type SharingResult<T> = Result<T, SharingError>;

/// Validated `(n, k)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SharingParams {
    total_shares: u8,
    threshold: u8,
}

impl SharingParams {
    pub fn new(total_shares: u8, threshold: u8) -> SharingResult<Self> {
        if threshold < 2 {
            return Err(SharingError::InvalidParameters(format!(
                "threshold {threshold} is below 2"
            )));
        }
        if threshold > total_shares {
            return Err(SharingError::InvalidParameters(format!(
                "threshold {threshold} exceeds total shares {total_shares}"
            )));
        }
        Ok(Self {
            total_shares,
            threshold,
        })
    }

    pub fn total_shares(&self) -> u8 {
        self.total_shares
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

impl Default for SharingParams {
    fn default() -> Self {
        Self {
            total_shares: DEFAULT_TOTAL_SHARES,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Split `secret` into `total_shares` shares, any `threshold` of which
/// reconstruct it.
pub fn split(secret: &[u8], total_shares: u8, threshold: u8) -> SharingResult<Vec<Share>> {
    SharingParams::new(total_shares, threshold)?;
    if secret.is_empty() {
        return Err(SharingError::InvalidParameters("secret is empty".into()));
    }

    let mut shares: Vec<Share> = (1..=total_shares)
        .map(|id| Share {
            id,
            data: Vec::with_capacity(secret.len()),
        })
        .collect();

    let mut rng = rand::thread_rng();
    // coeffs[0] is a secret byte
    let mut coeffs = Zeroizing::new(vec![Gf256::ZERO; threshold as usize]);
    let mut random = Zeroizing::new(vec![0u8; threshold as usize - 1]);
    for &byte in secret {
        rng.fill_bytes(random.as_mut_slice());
        coeffs[0] = Gf256(byte);
        for (c, &r) in coeffs[1..].iter_mut().zip(random.iter()) {
            *c = Gf256(r);
        }
        for share in shares.iter_mut() {
            let y = Gf256::eval_polynomial(&coeffs, Gf256(share.id));
            share.data.push(y.0);
        }
    }
    Ok(shares)
}

/// Interpolate the secret from whatever shares are supplied. Order is
/// irrelevant. Structural problems (duplicate ids, length mismatch) are
/// rejected; an insufficient count is not detectable here.
pub fn combine(shares: &[Share]) -> SharingResult<Zeroizing<Vec<u8>>> {
    let first = shares
        .first()
        .ok_or_else(|| SharingError::InvalidParameters("no shares supplied".into()))?;
    let secret_len = first.data.len();

    let mut seen = HashSet::with_capacity(shares.len());
    for share in shares {
        if share.id == 0 {
            return Err(SharingError::Malformed("share id 0 is reserved".into()));
        }
        if !seen.insert(share.id) {
            return Err(SharingError::Malformed(format!(
                "share id {} supplied twice",
                share.id
            )));
        }
        if share.data.len() != secret_len {
            return Err(SharingError::Malformed(format!(
                "share {} has length {}, expected {secret_len}",
                share.id,
                share.data.len()
            )));
        }
    }

    let mut points = Zeroizing::new(Vec::with_capacity(shares.len()));
    let secret: Vec<u8> = (0..secret_len)
        .map(|index| {
            points.clear();
            points.extend(
                shares
                    .iter()
                    .map(|s| (Gf256(s.id), Gf256(s.data[index]))),
            );
            Gf256::interpolate_at_zero(&points).0
        })
        .collect();

    Ok(Zeroizing::new(secret))
}
