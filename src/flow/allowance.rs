use alloy::primitives::{Address, TxHash, U256};
use tracing::{debug, info};

use crate::contracts::Stablecoin;
use crate::errors::FlowError;

/// Default approval ceiling: 100 000 USDC (6 decimals).
pub const DEFAULT_APPROVAL_CAP: u64 = 100_000 * 1_000_000;

/// How much to approve when the current allowance is too low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalPolicy {
    /// Exactly the amount about to be spent.
    Exact,
    /// A fixed ceiling, or the spend amount if that is larger.
    Capped(U256),
    /// `type(uint256).max`.
    Unbounded,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        ApprovalPolicy::Capped(U256::from(DEFAULT_APPROVAL_CAP))
    }
}

impl ApprovalPolicy {
    pub fn approval_amount(&self, required: U256) -> U256 {
        match self {
            ApprovalPolicy::Exact => required,
            ApprovalPolicy::Capped(cap) => (*cap).max(required),
            ApprovalPolicy::Unbounded => U256::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceOutcome {
    /// The existing allowance already covered the amount; nothing was sent.
    Sufficient { allowance: U256 },
    /// An approval was mined and the allowance now covers the amount.
    Approved { tx_hash: TxHash, allowance: U256 },
}

impl AllowanceOutcome {
    pub fn allowance(&self) -> U256 {
        match self {
            AllowanceOutcome::Sufficient { allowance }
            | AllowanceOutcome::Approved { allowance, .. } => *allowance,
        }
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            AllowanceOutcome::Sufficient { .. } => None,
            AllowanceOutcome::Approved { tx_hash, .. } => Some(*tx_hash),
        }
    }
}

/// Make sure `spender` may pull at least `required` of `owner`'s tokens.
///
/// An allowance that already covers `required` is left alone. Otherwise one
/// approval is submitted (`on_submitted` sees its hash), one confirmation is
/// awaited and the allowance is read back.
pub async fn ensure_allowance<F>(
    token: &dyn Stablecoin,
    owner: Address,
    spender: Address,
    required: U256,
    policy: ApprovalPolicy,
    on_submitted: F,
) -> Result<AllowanceOutcome, FlowError>
where
    F: FnOnce(TxHash),
{
    let current = token.allowance(owner, spender).await?;
    if current >= required {
        debug!(%current, %required, "allowance sufficient");
        return Ok(AllowanceOutcome::Sufficient { allowance: current });
    }

    let amount = policy.approval_amount(required);
    info!(%current, %required, %amount, "submitting approval");
    let pending = token.approve(spender, amount).await?;
    let tx_hash = pending.tx_hash();
    on_submitted(tx_hash);

    let receipt = pending.confirmed().await?;
    if !receipt.success {
        return Err(FlowError::ContractRevert {
            message: "approve reverted".into(),
            hint: None,
            tx_hash: Some(receipt.tx_hash),
        });
    }
    info!(tx = %tx_hash, gas_used = receipt.gas_used, "approval confirmed");

    let allowance = token.allowance(owner, spender).await?;
    if allowance < required {
        return Err(FlowError::InsufficientAllowance {
            current: allowance,
            required,
        });
    }
    Ok(AllowanceOutcome::Approved { tx_hash, allowance })
}
