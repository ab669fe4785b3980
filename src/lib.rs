//! Operation ingestion and resolution core for Sidetree-style DID methods.
//!
//! This crate is the Layer-2 half of a DID method: a deterministic state
//! machine that parses, validates, orders, and folds a stream of anchored
//! DID operations into the current DID Document for each DID. The Layer-1
//! ledger and the content-addressed store holding operation batches are
//! external collaborators, consumed through the interfaces in [`cas`].
//!
//! The two central pieces are [`operation::Operation`], the immutable
//! parsed form of one anchored operation (content hash, signature check,
//! DID unique suffix), and [`processor::OperationProcessor`], which accepts
//! operations in arbitrary order and resolves documents deterministically:
//! for any set of operations, every ingestion order yields the same
//! document.

pub mod base64url;
pub mod batch;
pub mod cas;
pub mod document;
pub mod error;
pub mod jwk;
pub mod jws;
pub mod multihash;
pub mod operation;
pub mod processor;
pub mod protocol;

pub use error::Error;
pub use operation::{AnchoringContext, Operation, OperationType};
pub use processor::OperationProcessor;
pub use protocol::{ProtocolParameters, ProtocolVersions};
