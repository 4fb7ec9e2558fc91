use alloy::primitives::Address;
use tracing::{info, warn};

use super::Controller;
use super::network::ensure_chain;
use super::status::StatusMessage;
use crate::errors::FlowError;
use crate::model::{AllowanceState, Portfolio};
use crate::model::amount::from_base_units;
use crate::wallet::{WalletEvent, request_accounts};

impl Controller {
    /// Request account access, put the wallet on the required chain and
    /// bind a signer, then load balances.
    pub async fn connect(&mut self) -> Result<Address, FlowError> {
        self.process_events().await;
        let result = self.establish_session().await;
        self.status = Some(match &result {
            Ok(address) => {
                info!(%address, "wallet connected");
                StatusMessage::success("Wallet connected successfully!")
            }
            Err(err) if err.is_user_rejection() => {
                StatusMessage::error("Connection rejected by user")
            }
            Err(err) => {
                warn!(error = %err, "connect failed");
                StatusMessage::error(format!("Failed to connect: {err}"))
            }
        });
        result
    }

    async fn establish_session(&mut self) -> Result<Address, FlowError> {
        let provider = self.provider()?;
        let accounts = request_accounts(provider.as_ref()).await?;
        let address = *accounts.first().ok_or(FlowError::NoAccounts)?;

        ensure_chain(provider.as_ref(), &self.deployment.chain).await?;
        let chain_id = self.deployment.chain.chain_id;
        let signer = provider.signer(address, chain_id).await?;

        self.session.establish(address, chain_id, signer);
        self.portfolio = Portfolio::empty(&self.deployment.assets);
        self.refresh_all().await;
        Ok(address)
    }

    /// Release the wallet session and clear all account state.
    pub async fn disconnect(&mut self) {
        if let Some(provider) = &self.provider {
            if let Err(err) = provider.disconnect().await {
                warn!(error = %err, "wallet disconnect failed");
            }
        }
        self.reset();
        info!("wallet disconnected");
        self.status = Some(StatusMessage::success("Wallet disconnected"));
    }

    /// Apply queued wallet events. Runs between operations, so an event
    /// that arrives mid-transaction takes effect before the next action.
    pub async fn process_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.events.as_mut().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                _ => break,
            };
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    async fn handle_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    if self.session.is_connected() {
                        info!("wallet locked or revoked access");
                        self.disconnect().await;
                    }
                }
                Some(&account) => {
                    if self.session.is_connected() && self.session.address() != Some(account) {
                        self.switch_account(account).await;
                    }
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                if !self.session.is_connected() || self.session.chain_id() == Some(chain_id) {
                    return;
                }
                // Cached balances and the signer belong to the old chain.
                warn!(chain_id, "wallet changed chain, resetting session");
                self.reset();
                self.status = Some(if chain_id == self.deployment.chain.chain_id {
                    StatusMessage::info("Network changed, reconnect your wallet to continue")
                } else {
                    StatusMessage::error(format!(
                        "Please switch to {} network",
                        self.deployment.chain.chain_name
                    ))
                });
            }
        }
    }

    async fn switch_account(&mut self, account: Address) {
        let chain_id = self.deployment.chain.chain_id;
        let signer = match self.provider() {
            Ok(provider) => provider.signer(account, chain_id).await.map_err(FlowError::from),
            Err(err) => Err(err),
        };
        self.reset();
        match signer {
            Ok(signer) => {
                info!(%account, "wallet switched account");
                self.session.establish(account, chain_id, signer);
                self.refresh_all().await;
            }
            Err(err) => {
                warn!(%account, error = %err, "could not bind new account");
                self.status = Some(StatusMessage::error(format!("Failed to connect: {err}")));
            }
        }
    }

    // ── Balance reads ─────────────────────────────────────────────────

    /// Re-read the user's five basket balances.
    pub async fn refresh_balances(&mut self) -> Result<(), FlowError> {
        let conn = self.connection()?;
        let raw = conn
            .signer
            .basket(self.deployment.basket)
            .user_balances(conn.address)
            .await?;
        self.portfolio.set_basket(raw);
        Ok(())
    }

    pub async fn refresh_stablecoin(&mut self) -> Result<(), FlowError> {
        let conn = self.connection()?;
        let raw = conn
            .signer
            .stablecoin(self.deployment.stablecoin.address)
            .balance_of(conn.address)
            .await?;
        self.portfolio.stablecoin = from_base_units(raw, self.deployment.stablecoin.decimals as u32);
        Ok(())
    }

    pub async fn refresh_allowance(&mut self) -> Result<(), FlowError> {
        let conn = self.connection()?;
        let raw = conn
            .signer
            .stablecoin(self.deployment.stablecoin.address)
            .allowance(conn.address, self.deployment.basket)
            .await?;
        self.portfolio.allowance = AllowanceState::Known(raw);
        Ok(())
    }

    /// Refresh every read; failures are logged and leave the old value.
    pub(super) async fn refresh_all(&mut self) {
        if let Err(err) = self.refresh_balances().await {
            warn!(error = %err, "loading basket balances failed");
        }
        if let Err(err) = self.refresh_stablecoin().await {
            warn!(error = %err, "loading USDC balance failed");
        }
        if let Err(err) = self.refresh_allowance().await {
            warn!(error = %err, "checking approval failed");
        }
    }
}
