//! The client's single controller: owns the session, balances and the
//! state of the operation in flight, and changes them only through the
//! transitions in `session` and `orchestrator`.

pub mod allowance;
pub mod network;
mod orchestrator;
pub mod preview;
mod session;
pub mod status;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy::primitives::TxHash;
use tokio::sync::mpsc;

use crate::config::Deployment;
use crate::errors::FlowError;
use crate::model::{Connection, Portfolio, Session};
use crate::wallet::{WalletEvent, WalletProvider};

use preview::{PreviewShare, distribution_preview};
use status::StatusMessage;

pub use allowance::{AllowanceOutcome, ApprovalPolicy};
pub use network::ChainSwitch;

/// Where the current (or last) user operation stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationState {
    #[default]
    Idle,
    Validating,
    CheckingChain,
    Approving,
    Estimating,
    Submitted { tx_hash: TxHash },
    Confirmed { tx_hash: TxHash },
    /// Ended without effect, before or after submission.
    Reverted { reason: String },
}

/// Set while a wallet-confirmed operation is in flight.
#[derive(Debug, Clone, Default)]
pub struct PendingFlag(Arc<AtomicBool>);

impl PendingFlag {
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Claim the flag; `None` while another operation holds it.
    pub fn try_begin(&self) -> Option<PendingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PendingGuard(self.0.clone()))
    }
}

/// Clears the pending flag when dropped, on every exit path.
#[derive(Debug)]
pub struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// User operations that submit a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Approve,
    Deposit,
    Withdraw,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Approve => "Approval",
            Operation::Deposit => "Deposit",
            Operation::Withdraw => "Withdrawal",
        }
    }

    fn submitted_message(&self) -> String {
        format!("{} transaction submitted... Please wait.", self.label())
    }

    fn success_message(&self) -> &'static str {
        match self {
            Operation::Approve => "USDC approved successfully!",
            Operation::Deposit => "Deposit successful! Your USDC has been diversified.",
            Operation::Withdraw => "Withdrawal successful! All tokens converted back to USDC.",
        }
    }

    fn failure_message(&self, err: &FlowError) -> String {
        if err.is_user_rejection() {
            format!("{} rejected by user", self.label())
        } else {
            format!("{} failed: {err}", self.label())
        }
    }
}

pub struct Controller {
    deployment: Deployment,
    provider: Option<Arc<dyn WalletProvider>>,
    events: Option<mpsc::UnboundedReceiver<WalletEvent>>,
    session: Session,
    portfolio: Portfolio,
    amount_input: String,
    state: OperationState,
    status: Option<StatusMessage>,
    pending: PendingFlag,
}

impl Controller {
    /// `provider` is `None` when no wallet is installed.
    pub fn new(deployment: Deployment, provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let events = provider.as_ref().map(|p| p.subscribe());
        let portfolio = Portfolio::empty(&deployment.assets);
        Controller {
            deployment,
            provider,
            events,
            session: Session::default(),
            portfolio,
            amount_input: String::new(),
            state: OperationState::Idle,
            status: None,
            pending: PendingFlag::default(),
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn state(&self) -> &OperationState {
        &self.state
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn dismiss_status(&mut self) {
        self.status = None;
    }

    /// Shared handle on the in-flight flag, for UIs that disable inputs.
    pub fn pending_flag(&self) -> &PendingFlag {
        &self.pending
    }

    pub fn amount_input(&self) -> &str {
        &self.amount_input
    }

    pub fn set_amount_input(&mut self, input: impl Into<String>) {
        self.amount_input = input.into();
    }

    /// Preview of the entered amount; empty until it is a valid deposit.
    pub fn preview(&self) -> Vec<PreviewShare> {
        match self.validate_amount(&self.amount_input) {
            Ok(amount) => distribution_preview(&self.deployment.assets, amount),
            Err(_) => Vec::new(),
        }
    }

    fn provider(&self) -> Result<Arc<dyn WalletProvider>, FlowError> {
        self.provider.clone().ok_or(FlowError::ProviderUnavailable)
    }

    fn connection(&self) -> Result<Connection, FlowError> {
        self.session
            .connection()
            .cloned()
            .ok_or(FlowError::NotConnected)
    }

    /// Clear everything tied to the connected account, in one step.
    fn reset(&mut self) {
        self.session.clear();
        self.portfolio = Portfolio::empty(&self.deployment.assets);
        self.amount_input.clear();
        self.state = OperationState::Idle;
    }
}
