//! Self-describing cryptographic hashes.
//!
//! A multihash is the concatenation `[algorithm code, digest length, digest]`.
//! The algorithm code in force at a given ledger time comes from the
//! [protocol registry](crate::protocol); SHA2-256 (`0x12`) is the only
//! algorithm the current protocol versions define.

use sha2::{Digest, Sha256};

use crate::error::Error;

/// Multihash algorithm code for SHA2-256.
pub const SHA2_256_CODE: u64 = 0x12;

const SHA2_256_DIGEST_SIZE: usize = 32;

/// Hash `data` with the algorithm identified by the given multihash code.
///
/// Returns the self-describing `[code, length, digest]` buffer.
pub fn hash(data: &[u8], algorithm_code: u64) -> Result<Vec<u8>, Error> {
    match algorithm_code {
        SHA2_256_CODE => {
            let digest = Sha256::digest(data);
            let mut out = Vec::with_capacity(2 + SHA2_256_DIGEST_SIZE);
            out.push(SHA2_256_CODE as u8);
            out.push(SHA2_256_DIGEST_SIZE as u8);
            out.extend_from_slice(&digest);
            Ok(out)
        }
        other => Err(Error::UnsupportedHashAlgorithm(other)),
    }
}

/// Split a multihash buffer into its algorithm code and digest.
///
/// The code and length octets are single-byte varints for every algorithm
/// this core defines. The digest length must match the length octet exactly.
pub fn decode(multihash: &[u8]) -> Result<(u64, &[u8]), Error> {
    if multihash.len() < 2 {
        return Err(Error::MalformedMultihash);
    }
    let code = u64::from(multihash[0]);
    let length = usize::from(multihash[1]);
    let digest = &multihash[2..];
    if digest.is_empty() || digest.len() != length {
        return Err(Error::MalformedMultihash);
    }
    Ok((code, digest))
}
