//! Commonly used types, re-exported for one-line imports.

pub use crate::action::{ActionDescriptor, ActionExecutor, ActionResult, extract};
pub use crate::api::{ApiClient, ChatReply, ChatResponse, ChatTurn};
pub use crate::config::NeoPayConfig;
pub use crate::error::{Error, PaymentError, Result, WalletError};
pub use crate::payment::{LegacyPaymentRequest, PaymentChallenge, Settlement, UserStatus};
pub use crate::provider::{LocalSignerProvider, WalletProvider};
pub use crate::wallet::{WalletAdapter, WalletEvent, WalletState, networks};
pub use crate::x402::{ReqwestTransport, Transport, X402Client};
