#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unreachable,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR" ), "/", "README.md"))]

pub mod codec;
pub mod consts;
pub mod crypto;
pub mod errors;
pub mod router;
pub mod sca;
pub mod signature;
pub mod types;

pub use self::{
    router::{build_submission, endpoint, Submission},
    signature::{sign, verify},
    types::{
        Environment, GatewayConfig, MerchantParameters, NotificationOutcome, SignedEnvelope,
        TransactionType,
    },
};
