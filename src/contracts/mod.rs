pub mod evm;

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::model::BASKET_SIZE;

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub success: bool,
    pub gas_used: u64,
}

/// A submitted transaction that has not been confirmed yet.
#[async_trait]
pub trait PendingTx: Send {
    fn tx_hash(&self) -> TxHash;

    /// Wait until the transaction is mined.
    async fn confirmed(self: Box<Self>) -> Result<Receipt, ProviderError>;
}

/// ERC20 stablecoin the basket is funded with.
#[async_trait]
pub trait Stablecoin: Send + Sync {
    fn address(&self) -> Address;

    async fn balance_of(&self, owner: Address) -> Result<U256, ProviderError>;

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ProviderError>;

    async fn approve(
        &self,
        spender: Address,
        amount: U256,
    ) -> Result<Box<dyn PendingTx>, ProviderError>;
}

/// The basket contract: swaps deposits into the five assets and back.
#[async_trait]
pub trait BasketContract: Send + Sync {
    fn address(&self) -> Address;

    /// Per-user holdings, each in the asset's native decimals.
    async fn user_balances(&self, user: Address) -> Result<[U256; BASKET_SIZE], ProviderError>;

    /// Dry-run gas estimate of `deposit(amount)` from the signer's account.
    async fn estimate_deposit(&self, amount: U256) -> Result<u64, ProviderError>;

    async fn deposit(&self, amount: U256) -> Result<Box<dyn PendingTx>, ProviderError>;

    async fn withdraw(&self) -> Result<Box<dyn PendingTx>, ProviderError>;
}

/// Signing capability for one account on one chain, handed out by the
/// wallet. Contract handles it creates send transactions from that account.
pub trait ContractSigner: Send + Sync {
    fn address(&self) -> Address;

    fn chain_id(&self) -> u64;

    fn stablecoin(&self, token: Address) -> Arc<dyn Stablecoin>;

    fn basket(&self, contract: Address) -> Arc<dyn BasketContract>;
}
