use alloy::primitives::{TxHash, U256};
use rust_decimal::Decimal;
use thiserror::Error;

/// An EIP-1193 style error reported by a wallet provider or RPC node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ProviderError {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

/// Every way a user action can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("wallet provider not initialized")]
    ProviderUnavailable,

    #[error("request rejected by user")]
    UserRejected,

    #[error("no accounts found, unlock your wallet and try again")]
    NoAccounts,

    #[error("wallet is not connected")]
    NotConnected,

    #[error("another transaction is still pending")]
    Busy,

    #[error("wallet is on chain {actual}, expected chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("could not switch network (code {code}): {message}")]
    ChainSwitchFailed { code: i64, message: String },

    #[error("invalid amount `{input}`: {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("minimum deposit is {minimum} USDC, got {amount}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("insufficient USDC balance: have {available}, need {required}")]
    InsufficientStablecoinBalance {
        available: Decimal,
        required: Decimal,
    },

    #[error("allowance {current} is below the required {required}")]
    InsufficientAllowance { current: U256, required: U256 },

    #[error("transaction would likely fail. Possible reasons: {hint} ({cause})")]
    LikelyRevert { hint: String, cause: String },

    #[error("transaction reverted: {message}{}", hint_suffix(.hint))]
    ContractRevert {
        message: String,
        hint: Option<String>,
        tx_hash: Option<TxHash>,
    },

    #[error("insufficient ETH for gas: {message}")]
    InsufficientGas { message: String },

    #[error("no basket balances to withdraw")]
    NothingToWithdraw,

    #[error("{message}")]
    Unknown { message: String },
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(". Likely reasons: {h}"),
        None => String::new(),
    }
}

impl FlowError {
    /// Classify a provider-reported failure. `revert_hint` is attached to
    /// contract reverts so the user sees the probable causes.
    pub fn classify(err: ProviderError, revert_hint: Option<&str>) -> Self {
        if err.is_user_rejected() {
            return FlowError::UserRejected;
        }
        let lower = err.message.to_lowercase();
        if lower.contains("insufficient funds") {
            FlowError::InsufficientGas {
                message: err.message,
            }
        } else if lower.contains("execution reverted") {
            FlowError::ContractRevert {
                message: err.message,
                hint: revert_hint.map(str::to_string),
                tx_hash: None,
            }
        } else {
            FlowError::Unknown {
                message: err.message,
            }
        }
    }

    /// True for explicit rejections, including a rejected network switch.
    pub fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            FlowError::UserRejected
                | FlowError::ChainSwitchFailed {
                    code: ProviderError::USER_REJECTED,
                    ..
                }
        )
    }
}

impl From<ProviderError> for FlowError {
    fn from(err: ProviderError) -> Self {
        FlowError::classify(err, None)
    }
}
