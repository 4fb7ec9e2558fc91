use std::sync::Arc;

use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;

use super::{BasketContract, ContractSigner, PendingTx, Receipt, Stablecoin};
use crate::errors::ProviderError;
use crate::model::BASKET_SIZE;

// ── Contract interfaces ────────────────────────────────────────────

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IBasket {
        event Deposited(address indexed user, uint256 usdcAmount);
        event Withdrawn(address indexed user, uint256 usdcAmount);

        function deposit(uint256 usdcAmount) external;
        function withdraw() external;
        function getUserBalances(address user) external view returns (uint256, uint256, uint256, uint256, uint256);
    }
}

// ── Signer ─────────────────────────────────────────────────────────

/// Signing provider bound to one account and chain.
#[derive(Clone)]
pub struct EvmSigner {
    address: Address,
    chain_id: u64,
    provider: DynProvider,
}

impl EvmSigner {
    pub fn new(key: PrivateKeySigner, chain_id: u64, rpc_url: &str) -> Result<Self, ProviderError> {
        let address = key.address();
        let provider = make_provider(key, rpc_url)?;
        Ok(EvmSigner {
            address,
            chain_id,
            provider,
        })
    }
}

impl ContractSigner for EvmSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn stablecoin(&self, token: Address) -> Arc<dyn Stablecoin> {
        Arc::new(EvmStablecoin {
            contract: IERC20::new(token, self.provider.clone()),
        })
    }

    fn basket(&self, contract: Address) -> Arc<dyn BasketContract> {
        Arc::new(EvmBasket {
            owner: self.address,
            contract: IBasket::new(contract, self.provider.clone()),
        })
    }
}

// ── ERC20 stablecoin ───────────────────────────────────────────────

pub struct EvmStablecoin {
    contract: IERC20::IERC20Instance<DynProvider>,
}

#[async_trait]
impl Stablecoin for EvmStablecoin {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ProviderError> {
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(rpc_failure)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ProviderError> {
        self.contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(rpc_failure)
    }

    async fn approve(
        &self,
        spender: Address,
        amount: U256,
    ) -> Result<Box<dyn PendingTx>, ProviderError> {
        let pending = self
            .contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(rpc_failure)?;
        Ok(Box::new(EvmPendingTx { inner: pending }))
    }
}

// ── Basket contract ────────────────────────────────────────────────

pub struct EvmBasket {
    owner: Address,
    contract: IBasket::IBasketInstance<DynProvider>,
}

#[async_trait]
impl BasketContract for EvmBasket {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn user_balances(&self, user: Address) -> Result<[U256; BASKET_SIZE], ProviderError> {
        let r = self
            .contract
            .getUserBalances(user)
            .call()
            .await
            .map_err(rpc_failure)?;
        Ok([r._0, r._1, r._2, r._3, r._4])
    }

    async fn estimate_deposit(&self, amount: U256) -> Result<u64, ProviderError> {
        self.contract
            .deposit(amount)
            .from(self.owner)
            .estimate_gas()
            .await
            .map_err(rpc_failure)
    }

    async fn deposit(&self, amount: U256) -> Result<Box<dyn PendingTx>, ProviderError> {
        let pending = self
            .contract
            .deposit(amount)
            .send()
            .await
            .map_err(rpc_failure)?;
        Ok(Box::new(EvmPendingTx { inner: pending }))
    }

    async fn withdraw(&self) -> Result<Box<dyn PendingTx>, ProviderError> {
        let pending = self
            .contract
            .withdraw()
            .send()
            .await
            .map_err(rpc_failure)?;
        Ok(Box::new(EvmPendingTx { inner: pending }))
    }
}

// ── Pending transactions ───────────────────────────────────────────

pub struct EvmPendingTx {
    inner: PendingTransactionBuilder<Ethereum>,
}

#[async_trait]
impl PendingTx for EvmPendingTx {
    fn tx_hash(&self) -> TxHash {
        *self.inner.tx_hash()
    }

    async fn confirmed(self: Box<Self>) -> Result<Receipt, ProviderError> {
        let receipt = self
            .inner
            .get_receipt()
            .await
            .map_err(|e| ProviderError::internal(e.to_string()))?;
        Ok(Receipt {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            gas_used: receipt.gas_used,
        })
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Create a signing HTTP provider for `rpc_url`.
pub fn make_provider(key: PrivateKeySigner, rpc_url: &str) -> Result<DynProvider, ProviderError> {
    let url = rpc_url.parse().map_err(|e| {
        ProviderError::new(
            ProviderError::INVALID_PARAMS,
            format!("invalid RPC URL `{rpc_url}`: {e}"),
        )
    })?;
    let wallet = EthereumWallet::from(key);
    Ok(ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(url)
        .erased())
}

/// Keep the node's JSON-RPC error code so callers can classify it.
fn rpc_failure(err: alloy::contract::Error) -> ProviderError {
    if let alloy::contract::Error::TransportError(rpc) = &err {
        if let Some(payload) = rpc.as_error_resp() {
            return ProviderError::new(payload.code, payload.message.to_string());
        }
    }
    ProviderError::internal(err.to_string())
}

/// Format an address for display (shortened).
pub fn short_addr(addr: &Address) -> String {
    let s = format!("{addr}");
    if s.len() > 10 {
        format!("{}...{}", &s[..6], &s[s.len() - 4..])
    } else {
        s
    }
}
