//! Public extension contracts.
//!
//! [`RequestSignerExt`] lets callers apply a session's header set to requests built with
//! their own HTTP client, outside the [`Gateway`](crate::gateway::Gateway).

pub mod request_signer;

pub use request_signer::*;
