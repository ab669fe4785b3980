//! Versioned protocol parameters.
//!
//! The parameters governing an operation (hash algorithm, batch and size
//! limits) are a function of the ledger time at which the operation was
//! anchored. The registry holds every configured version and answers "which
//! parameters were in force at time `t`".

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One versioned set of protocol parameters, in force from
/// `start_transaction_time` until superseded by a later entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParameters {
    /// The inclusive ledger time at which this version takes effect.
    pub start_transaction_time: u64,
    /// Multihash algorithm code used for operation hashing.
    pub hash_algorithm_in_multihash_code: u64,
    /// Maximum number of operations admitted per batch file.
    pub max_operations_per_batch: usize,
    /// Maximum size of a single operation buffer, in bytes.
    pub max_operation_byte_size: usize,
}

/// Process-wide set of protocol versions, initialized once from
/// configuration and passed by handle wherever parameters are needed.
#[derive(Debug, Clone, Default)]
pub struct ProtocolVersions {
    /// Sorted ascending by `start_transaction_time`.
    versions: Vec<ProtocolParameters>,
}

impl ProtocolVersions {
    pub fn new(mut versions: Vec<ProtocolParameters>) -> Self {
        versions.sort_by_key(|v| v.start_transaction_time);
        Self { versions }
    }

    /// Load versions from a JSON configuration document: an array of
    /// parameter objects.
    pub fn from_json(config: &str) -> Result<Self, Error> {
        let versions: Vec<ProtocolParameters> = serde_json::from_str(config)?;
        Ok(Self::new(versions))
    }

    /// The parameters in force at `transaction_time`: the entry with the
    /// largest `start_transaction_time <= transaction_time`.
    pub fn get(&self, transaction_time: u64) -> Result<&ProtocolParameters, Error> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.start_transaction_time <= transaction_time)
            .ok_or(Error::NoProtocolConfigured(transaction_time))
    }
}
