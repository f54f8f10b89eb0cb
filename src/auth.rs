//! Session domain: identifiers, secrets, access sessions, device signatures, and header sets.

pub mod headers;
pub mod id;
pub mod secret;
pub mod session;
pub mod signature;

pub use headers::*;
pub use id::*;
pub use secret::*;
pub use session::*;
pub use signature::*;
