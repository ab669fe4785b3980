//! External collaborator interfaces: content-addressed storage and the
//! ledger transaction feed.
//!
//! The core only ever *consumes* these. Deployments supply real clients;
//! the test suite supplies in-memory mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Read access to the content-addressed store holding batch files.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait CasClient: Sync {
    /// Fetch the content stored at `address`.
    ///
    /// Fails with [`Error::CasNotFound`] when nothing is stored there and
    /// [`Error::CasUnavailable`] when the store cannot be reached.
    async fn read(&self, address: &[u8]) -> Result<Vec<u8>, Error>;
}

/// One anchored transaction as reported by the ledger, in strictly
/// increasing `transaction_number` order.
///
/// `transaction_time_hash` and `anchor_file_hash` are opaque to the core.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransaction {
    pub transaction_time: u64,
    pub transaction_number: u64,
    pub transaction_time_hash: Vec<u8>,
    pub anchor_file_hash: Vec<u8>,
    /// Content address of the batch file carrying this transaction's
    /// operations.
    pub batch_file_hash: Vec<u8>,
}
