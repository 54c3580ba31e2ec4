#![forbid(unsafe_code)]
#![warn(missing_docs)]

//!
//! Personal Identifiable Information protection. Wrapper types and traits for secret management
//! which help ensure secrets aren't accidentally copied, logged, or otherwise exposed.
//! Secret-keeping library inspired by secrecy.
//!
//! Vendored subset of hyperswitch's `masking` crate providing the `Secret` type and its
//! expose/peek interfaces together with serde support.
//!

mod strategy;

pub use strategy::{Strategy, WithType, WithoutType};
mod abs;
pub use abs::{ExposeInterface, PeekInterface, PeekOptionInterface};

mod secret;
pub use secret::Secret;

mod serde;
pub use crate::serde::{masked_serialize, Deserialize, SerializableSecret, Serialize};

/// This module should be included with asterisk.
///
/// `use masking::prelude::*;`
///
pub mod prelude {
    pub use super::{ExposeInterface, PeekInterface};
}
