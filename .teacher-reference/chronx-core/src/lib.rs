pub mod account;
pub mod claims;
pub mod constants;
pub mod error;
pub mod transaction;
pub mod types;

pub use account::*;
pub use claims::{
    Certificate, CertificateSchema, ClaimLane, ClaimPolicy, ClaimState, LaneThresholds,
    OracleSnapshot, OracleSubmission, PolicyId, ProviderRecord, ProviderStatus, SchemaId,
    SignatureRules, SlashReason,
};
pub use constants::*;
pub use error::ChronxError;
pub use transaction::*;
pub use types::*;
