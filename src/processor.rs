//! Per-DID operation ingestion and resolution.
//!
//! The processor is a two-phase machine. `process` only files operations
//! into per-DID buckets, with no signature checks and no document
//! construction, so ingestion is idempotent and insensitive to arrival
//! order.
//! `resolve` then computes the current document as a pure function of the
//! bucket contents: every choice among competing operations is broken by
//! the ledger's `(transaction_number, operation_index)` total order, so the
//! result is the same on every node and after every restart.

use std::collections::{BTreeMap, HashMap};

use crate::document::{self, DidDocument};
use crate::error::Error;
use crate::operation::{Operation, OperationType};
use crate::protocol::ProtocolVersions;

/// All operations known to apply to one DID, grouped by type.
#[derive(Debug, Default)]
struct OperationBucket {
    /// Candidate Creates. Indexed under their own operation hash, so every
    /// entry's hash equals the bucket's DID unique suffix.
    creates: Vec<Operation>,
    /// Updates keyed by the predecessor hash they claim.
    updates: HashMap<String, Vec<Operation>>,
    deletes: Vec<Operation>,
}

impl OperationBucket {
    fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Ingests anchored operations in any order and materializes per-DID
/// documents on demand.
#[derive(Debug)]
pub struct OperationProcessor {
    /// Full DID prefix for this method, e.g. `did:sidetree:`.
    did_method_name: String,
    protocol: ProtocolVersions,
    /// DID unique suffix -> operations for that DID.
    buckets: HashMap<String, OperationBucket>,
    /// Ledger order -> DID unique suffix, for redelivery dedup and rollback.
    anchored: BTreeMap<(u64, u32), String>,
}

impl OperationProcessor {
    pub fn new(did_method_name: &str, protocol: ProtocolVersions) -> Self {
        Self {
            did_method_name: did_method_name.to_string(),
            protocol,
            buckets: HashMap::new(),
            anchored: BTreeMap::new(),
        }
    }

    /// The protocol registry this processor was constructed with.
    pub fn protocol(&self) -> &ProtocolVersions {
        &self.protocol
    }

    /// File an anchored operation into the per-DID index.
    ///
    /// Idempotent: redeliveries (same `(transaction_number,
    /// operation_index)`) are no-ops. Operations whose contents make them
    /// un-indexable, such as a `did` outside this method or a buffer over
    /// the protocol size limit, are inert rather than errors; anything a
    /// user pays to anchor arrives here, and garbage must not wedge
    /// ingestion. Errors are reserved for caller bugs: unanchored
    /// operations and registry misconfiguration.
    pub fn process(&mut self, operation: Operation) -> Result<(), Error> {
        let anchoring = match operation.anchoring() {
            Some(anchoring) => anchoring.clone(),
            None => return Err(Error::HashTimeUnknown),
        };
        let parameters = self.protocol.get(anchoring.transaction_time)?;
        if operation.operation_buffer().len() > parameters.max_operation_byte_size {
            return Ok(());
        }
        let order = anchoring.order();
        if self.anchored.contains_key(&order) {
            return Ok(());
        }
        let suffix = match operation.did_unique_suffix(&self.did_method_name, &self.protocol) {
            Ok(suffix) => suffix,
            Err(Error::MalformedOperation(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        let bucket = self.buckets.entry(suffix.clone()).or_default();
        match operation.operation_type() {
            OperationType::Create => bucket.creates.push(operation),
            OperationType::Update => {
                let previous = match operation.previous_operation_hash() {
                    Some(previous) => previous.to_owned(),
                    // Updates always carry a predecessor hash by construction.
                    None => return Ok(()),
                };
                bucket.updates.entry(previous).or_default().push(operation);
            }
            OperationType::Delete => bucket.deletes.push(operation),
            OperationType::Recover => return Ok(()),
        }
        self.anchored.insert(order, suffix);
        Ok(())
    }

    /// Compute the current DID Document for `did`, or `None` if no valid
    /// chain exists (unknown DID, forged Create, or a verified Delete).
    ///
    /// Never errors for anything attributable to operation contents:
    /// operations that fail verification are simply ineligible.
    pub fn resolve(&self, did: &str) -> Option<DidDocument> {
        let suffix = did.strip_prefix(&self.did_method_name)?;
        let bucket = self.buckets.get(suffix)?;

        // Select the Create: the bucket index already guarantees every
        // candidate's operation hash equals the unique suffix, so only the
        // ledger order decides. Its signature must verify against the
        // signing key named inside its own document.
        let create = bucket.creates.iter().min_by_key(|op| ledger_order(op))?;
        let mut current = create.did_document()?.clone();
        if !verifies_against(create, &current) {
            return None;
        }
        let mut tip_hash = create.operation_hash(&self.protocol).ok()?;

        // Extend with Updates: walk predecessor links from the Create,
        // taking at each step the first candidate in ledger order that
        // verifies against the *current* document, carries the expected
        // operation number, and applies cleanly.
        let mut expected_operation_number: u32 = 1;
        while let Some(candidates) = bucket.updates.get(&tip_hash) {
            let mut candidates: Vec<&Operation> = candidates.iter().collect();
            candidates.sort_by_key(|op| ledger_order(op));
            let mut advanced = false;
            for candidate in candidates {
                if !verifies_against(candidate, &current) {
                    continue;
                }
                if candidate.operation_number() != Some(expected_operation_number) {
                    continue;
                }
                let update = match candidate.update_payload() {
                    Some(update) => update,
                    None => continue,
                };
                let next = match document::apply_patch(&current, &update.patch) {
                    Ok(next) => next,
                    Err(_) => continue,
                };
                let hash = match candidate.operation_hash(&self.protocol) {
                    Ok(hash) => hash,
                    Err(_) => continue,
                };
                current = next;
                tip_hash = hash;
                expected_operation_number += 1;
                advanced = true;
                break;
            }
            if !advanced {
                break;
            }
        }

        // Apply Deletes: any one that verifies against a key still present
        // in the resolved document tombstones the DID.
        let mut deletes: Vec<&Operation> = bucket.deletes.iter().collect();
        deletes.sort_by_key(|op| ledger_order(op));
        for delete in deletes {
            if verifies_against(delete, &current) {
                return None;
            }
        }

        Some(current)
    }

    /// Discard every operation anchored after `transaction_number`, for
    /// ledger reorganizations. State for the remaining operations is
    /// untouched; `resolve` recomputes from what is left.
    pub fn rollback(&mut self, transaction_number: u64) {
        self.anchored
            .retain(|&(number, _), _| number <= transaction_number);
        for bucket in self.buckets.values_mut() {
            bucket
                .creates
                .retain(|op| anchored_at_or_before(op, transaction_number));
            bucket
                .deletes
                .retain(|op| anchored_at_or_before(op, transaction_number));
            for candidates in bucket.updates.values_mut() {
                candidates.retain(|op| anchored_at_or_before(op, transaction_number));
            }
            bucket.updates.retain(|_, candidates| !candidates.is_empty());
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
    }
}

/// Key in the ledger total order, for deterministic tie-breaking.
fn ledger_order(operation: &Operation) -> (u64, u32) {
    match operation.anchoring() {
        Some(anchoring) => anchoring.order(),
        // Unanchored operations never enter the index.
        None => (u64::MAX, u32::MAX),
    }
}

/// Whether the operation's signature verifies against the key its `kid`
/// names in `document`. A missing key, unusable key material, or a bad
/// signature all mean "no".
fn verifies_against(operation: &Operation, document: &DidDocument) -> bool {
    let entry = match document.public_key(operation.signing_key_id()) {
        Some(entry) => entry,
        None => return false,
    };
    let key = match entry.verifying_key() {
        Ok(key) => key,
        Err(_) => return false,
    };
    operation.verify_signature(&key)
}

fn anchored_at_or_before(operation: &Operation, transaction_number: u64) -> bool {
    match operation.anchoring() {
        Some(anchoring) => anchoring.transaction_number <= transaction_number,
        None => false,
    }
}
