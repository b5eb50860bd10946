//! Request token digests.
//!
//! A digest is the hex-encoded 32 byte scrypt hash of the raw token. The
//! scrypt salt is the SHA-256 of the configured salt and the work factors come
//! from a cost string in `N$r$p$` form, every component hexadecimal and `N` a
//! power of two.

use std::{fmt, str::FromStr};

use rand::{RngCore, rngs::OsRng};
use scrypt::Params;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::domain::issuers::{DigestError, ProvidersConfigError};

/// Cost used when issuing new tokens.
pub const DEFAULT_SCRYPT_COST: &str = "800$8$1$";

/// Length of the derived key in bytes.
pub const DIGEST_BYTES: usize = 32;

/// Number of random bytes in a generated token or salt.
const RANDOM_BYTES: usize = 32;

/// Parsed scrypt work factors.
#[derive(Clone, Copy)]
pub struct ScryptCost {
    params: Params,
}

impl ScryptCost {
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl fmt::Debug for ScryptCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScryptCost")
            .field("log_n", &self.params.log_n())
            .field("r", &self.params.r())
            .field("p", &self.params.p())
            .finish()
    }
}

impl FromStr for ScryptCost {
    type Err = ProvidersConfigError;

    fn from_str(cost: &str) -> Result<Self, Self::Err> {
        let invalid = || ProvidersConfigError::InvalidCost(cost.to_string());

        let mut parts = cost
            .strip_suffix('$')
            .ok_or_else(invalid)?
            .split('$')
            .map(|part| u32::from_str_radix(part, 16));

        let (Some(Ok(n)), Some(Ok(r)), Some(Ok(p)), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if n < 2 || !n.is_power_of_two() {
            return Err(invalid());
        }

        let log_n = u8::try_from(n.trailing_zeros()).map_err(|_overflow| invalid())?;

        let params = Params::new(log_n, r, p, DIGEST_BYTES).map_err(|_invalid| invalid())?;

        Ok(Self { params })
    }
}

/// Digest of `token` for the given salt and cost.
///
/// # Errors
///
/// Returns an error when scrypt rejects the output length.
pub fn digest_request_token(
    token: &str,
    salt: &str,
    cost: &ScryptCost,
) -> Result<String, DigestError> {
    let salt = Sha256::digest(salt.as_bytes());
    let mut output = [0_u8; DIGEST_BYTES];

    scrypt::scrypt(token.as_bytes(), &salt, cost.params(), &mut output)
        .map_err(|_invalid_len| DigestError)?;

    let digest = hex::encode(output);

    output.zeroize();

    Ok(digest)
}

/// Constant-time comparison of a presented token against a stored digest.
///
/// # Errors
///
/// Returns an error when the presented token cannot be digested.
pub fn token_matches(
    token: &str,
    salt: &str,
    cost: &ScryptCost,
    expected: &str,
) -> Result<bool, DigestError> {
    let actual = digest_request_token(token, salt, cost)?;

    Ok(bool::from(actual.as_bytes().ct_eq(expected.as_bytes())))
}

/// Random hex string suitable for a token or salt.
#[must_use]
pub fn generate_random_hex() -> String {
    let mut bytes = [0_u8; RANDOM_BYTES];

    OsRng.fill_bytes(&mut bytes);

    hex::encode(bytes)
}
