use alloy::primitives::{TxHash, U256};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::allowance::{AllowanceOutcome, ensure_allowance};
use super::network::{ChainSwitch, ensure_chain};
use super::status::StatusMessage;
use super::{Controller, Operation, OperationState};
use crate::contracts::{PendingTx, Receipt};
use crate::errors::FlowError;
use crate::model::AllowanceState;
use crate::model::amount::{AmountError, from_base_units, parse_amount, to_base_units};

/// Probable causes shown when a deposit fails its gas estimate.
pub const DEPOSIT_REVERT_HINT: &str =
    "insufficient DEX liquidity, insufficient ETH for gas, or amount too small";

/// Probable causes shown when a withdrawal reverts.
pub const WITHDRAW_REVERT_HINT: &str =
    "1) amounts too small to swap (need minimum liquidity) 2) DEX pools lack liquidity";

impl Controller {
    // ── Public operations ─────────────────────────────────────────────

    /// Approve the basket to spend `input` USDC (the minimum deposit when
    /// no amount is given).
    pub async fn approve(&mut self, input: Option<&str>) -> Result<AllowanceOutcome, FlowError> {
        self.process_events().await;
        let Some(guard) = self.pending.try_begin() else {
            return Err(self.reject_busy());
        };
        let result = self.run_approve(input).await;
        self.settle(Operation::Approve, &result, AllowanceOutcome::tx_hash);
        drop(guard);
        self.process_events().await;
        result
    }

    /// Deposit `input` USDC into the basket.
    pub async fn deposit(&mut self, input: &str) -> Result<Receipt, FlowError> {
        self.process_events().await;
        let Some(guard) = self.pending.try_begin() else {
            return Err(self.reject_busy());
        };
        let result = self.run_deposit(input).await;
        if result.is_ok() {
            self.amount_input.clear();
        }
        self.settle(Operation::Deposit, &result, |r| Some(r.tx_hash));
        drop(guard);
        self.process_events().await;
        result
    }

    /// Withdraw the whole basket back to USDC.
    pub async fn withdraw(&mut self) -> Result<Receipt, FlowError> {
        self.process_events().await;
        let Some(guard) = self.pending.try_begin() else {
            return Err(self.reject_busy());
        };
        let result = self.run_withdraw().await;
        self.settle(Operation::Withdraw, &result, |r| Some(r.tx_hash));
        drop(guard);
        self.process_events().await;
        result
    }

    // ── Steps ─────────────────────────────────────────────────────────

    /// Parse and check a deposit amount without touching the network.
    pub(super) fn validate_amount(&self, input: &str) -> Result<Decimal, FlowError> {
        let invalid = |err: AmountError| FlowError::InvalidAmount {
            input: input.to_string(),
            reason: err.to_string(),
        };
        let amount = parse_amount(input).map_err(invalid)?;
        let minimum = self.deployment.minimum_deposit;
        if amount < minimum {
            return Err(FlowError::BelowMinimum { amount, minimum });
        }
        to_base_units(amount, self.deployment.stablecoin.decimals as u32).map_err(invalid)?;
        Ok(amount)
    }

    fn base_units(&self, amount: Decimal) -> Result<U256, FlowError> {
        to_base_units(amount, self.deployment.stablecoin.decimals as u32).map_err(|err| {
            FlowError::InvalidAmount {
                input: amount.to_string(),
                reason: err.to_string(),
            }
        })
    }

    /// Run the network guard; rebind the signer if the wallet moved.
    async fn guard_chain(&mut self) -> Result<(), FlowError> {
        self.state = OperationState::CheckingChain;
        let provider = self.provider()?;
        let conn = self.connection()?;
        let outcome = ensure_chain(provider.as_ref(), &self.deployment.chain).await?;
        if outcome != ChainSwitch::AlreadyActive {
            let chain_id = self.deployment.chain.chain_id;
            let signer = provider.signer(conn.address, chain_id).await?;
            self.session.establish(conn.address, chain_id, signer);
        }
        Ok(())
    }

    async fn run_approve(&mut self, input: Option<&str>) -> Result<AllowanceOutcome, FlowError> {
        self.state = OperationState::Validating;
        let amount = match input {
            Some(input) => self.validate_amount(input)?,
            None => self.deployment.minimum_deposit,
        };
        let required = self.base_units(amount)?;
        self.connection()?;
        self.guard_chain().await?;

        self.state = OperationState::Approving;
        let outcome = self.approve_for(required).await?;
        Ok(outcome)
    }

    async fn approve_for(&mut self, required: U256) -> Result<AllowanceOutcome, FlowError> {
        let conn = self.connection()?;
        let token = conn.signer.stablecoin(self.deployment.stablecoin.address);
        let spender = self.deployment.basket;
        let policy = self.deployment.approval;
        let status = &mut self.status;
        let outcome = ensure_allowance(
            token.as_ref(),
            conn.address,
            spender,
            required,
            policy,
            |tx_hash| {
                info!(tx = %tx_hash, "approval submitted");
                *status = Some(StatusMessage::info(Operation::Approve.submitted_message()));
            },
        )
        .await?;
        self.portfolio.allowance = AllowanceState::Known(outcome.allowance());
        Ok(outcome)
    }

    async fn run_deposit(&mut self, input: &str) -> Result<Receipt, FlowError> {
        self.state = OperationState::Validating;
        let amount = self.validate_amount(input)?;
        let raw = self.base_units(amount)?;
        self.connection()?;
        self.guard_chain().await?;

        let conn = self.connection()?;
        let token = conn.signer.stablecoin(self.deployment.stablecoin.address);
        let basket = conn.signer.basket(self.deployment.basket);

        let balance = token.balance_of(conn.address).await?;
        if balance < raw {
            return Err(FlowError::InsufficientStablecoinBalance {
                available: from_base_units(balance, self.deployment.stablecoin.decimals as u32),
                required: amount,
            });
        }

        self.state = OperationState::Approving;
        self.approve_for(raw).await?;

        self.state = OperationState::Estimating;
        let gas = basket
            .estimate_deposit(raw)
            .await
            .map_err(|err| FlowError::LikelyRevert {
                hint: DEPOSIT_REVERT_HINT.to_string(),
                cause: err.message,
            })?;
        info!(%amount, gas, "deposit pre-flight ok");

        let pending = basket.deposit(raw).await?;
        self.confirm(Operation::Deposit, pending, None).await
    }

    async fn run_withdraw(&mut self) -> Result<Receipt, FlowError> {
        self.state = OperationState::Validating;
        self.connection()?;
        self.guard_chain().await?;

        let conn = self.connection()?;
        let basket = conn.signer.basket(self.deployment.basket);
        let raw = basket.user_balances(conn.address).await?;
        self.portfolio.set_basket(raw);
        if raw.iter().all(U256::is_zero) {
            return Err(FlowError::NothingToWithdraw);
        }

        let pending = basket
            .withdraw()
            .await
            .map_err(|err| FlowError::classify(err, Some(WITHDRAW_REVERT_HINT)))?;
        self.confirm(Operation::Withdraw, pending, Some(WITHDRAW_REVERT_HINT))
            .await
    }

    /// Record the submission, wait for the receipt, refresh balances.
    async fn confirm(
        &mut self,
        op: Operation,
        pending: Box<dyn PendingTx>,
        revert_hint: Option<&str>,
    ) -> Result<Receipt, FlowError> {
        let tx_hash = pending.tx_hash();
        info!(tx = %tx_hash, op = op.label(), "transaction submitted");
        self.state = OperationState::Submitted { tx_hash };
        self.status = Some(StatusMessage::info(op.submitted_message()));

        let receipt = pending
            .confirmed()
            .await
            .map_err(|err| FlowError::classify(err, revert_hint))?;
        if !receipt.success {
            return Err(FlowError::ContractRevert {
                message: format!("{} reverted on-chain", op.label()),
                hint: revert_hint.map(str::to_string),
                tx_hash: Some(receipt.tx_hash),
            });
        }
        info!(tx = %tx_hash, gas_used = receipt.gas_used, op = op.label(), "transaction confirmed");

        self.refresh_all().await;
        Ok(receipt)
    }

    // ── Outcome bookkeeping ───────────────────────────────────────────

    fn reject_busy(&mut self) -> FlowError {
        let err = FlowError::Busy;
        self.status = Some(StatusMessage::error(err.to_string()));
        err
    }

    fn settle<T>(
        &mut self,
        op: Operation,
        result: &Result<T, FlowError>,
        tx_of: impl Fn(&T) -> Option<TxHash>,
    ) {
        match result {
            Ok(value) => {
                self.state = match tx_of(value) {
                    Some(tx_hash) => OperationState::Confirmed { tx_hash },
                    None => OperationState::Idle,
                };
                self.status = Some(StatusMessage::success(op.success_message()));
            }
            Err(err) => {
                warn!(op = op.label(), error = %err, "operation failed");
                self.state = OperationState::Reverted {
                    reason: err.to_string(),
                };
                self.status = Some(StatusMessage::error(op.failure_message(err)));
            }
        }
    }
}
