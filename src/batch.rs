//! Batch file ingestion.
//!
//! A batch file is the CAS blob a ledger transaction anchors: a JSON object
//! whose `operations` array holds the base64url encoding of each raw
//! operation buffer, in batch order. `operation_index` is the position in
//! that array.

use serde::{Deserialize, Serialize};

use crate::base64url;
use crate::cas::{CasClient, ResolvedTransaction};
use crate::error::Error;
use crate::operation::{AnchoringContext, Operation};
use crate::processor::OperationProcessor;

/// The decoded layout of a batch file blob.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub operations: Vec<String>,
}

/// Fetch and ingest the batch anchored by one ledger transaction.
///
/// External I/O failures propagate. Anchored garbage does not: a blob that
/// is not a batch file, a batch over the protocol's operation cap, and
/// individual buffers that fail construction are all inert, because the
/// ledger anchors whatever a user pays to anchor. Returns the number of
/// operations handed to the processor.
pub async fn process_transaction(
    processor: &mut OperationProcessor,
    transaction: &ResolvedTransaction,
    cas: &dyn CasClient,
) -> Result<usize, Error> {
    let blob = cas.read(&transaction.batch_file_hash).await?;
    let batch: BatchFile = match serde_json::from_slice(&blob) {
        Ok(batch) => batch,
        Err(_) => return Ok(0),
    };
    let parameters = processor.protocol().get(transaction.transaction_time)?;
    if batch.operations.len() > parameters.max_operations_per_batch {
        return Ok(0);
    }
    let mut processed = 0;
    for (index, encoded) in batch.operations.iter().enumerate() {
        let buffer = match base64url::decode(encoded) {
            Ok(buffer) => buffer,
            Err(_) => continue,
        };
        let anchoring = AnchoringContext::new(transaction, index as u32);
        let operation = match Operation::parse(&buffer, anchoring) {
            Ok(operation) => operation,
            Err(_) => continue,
        };
        processor.process(operation)?;
        processed += 1;
    }
    Ok(processed)
}
