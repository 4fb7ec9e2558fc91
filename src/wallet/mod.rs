pub mod local;

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::contracts::ContractSigner;
use crate::errors::ProviderError;
use crate::model::ChainDescriptor;
use crate::model::chain::parse_chain_id;

/// JSON-RPC methods the client sends to a wallet.
pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
}

/// An EIP-1193 `request({method, params})` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        RpcRequest {
            method: method.into(),
            params,
        }
    }

    pub fn request_accounts() -> Self {
        Self::new(methods::REQUEST_ACCOUNTS, json!([]))
    }

    pub fn chain_id() -> Self {
        Self::new(methods::CHAIN_ID, json!([]))
    }

    pub fn switch_chain(chain_id: u64) -> Self {
        Self::new(
            methods::SWITCH_CHAIN,
            json!([{ "chainId": format!("{chain_id:#x}") }]),
        )
    }

    pub fn add_chain(chain: &ChainDescriptor) -> Self {
        Self::new(methods::ADD_CHAIN, json!([chain]))
    }
}

/// Notifications a wallet pushes on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// The wallet capability the client drives.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError>;

    /// Register a listener for account and chain changes.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent>;

    /// Release the dapp's session with the wallet.
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Signing capability for `account` on `chain_id`.
    async fn signer(
        &self,
        account: Address,
        chain_id: u64,
    ) -> Result<Arc<dyn ContractSigner>, ProviderError>;
}

/// Ask the wallet for account access.
pub async fn request_accounts(provider: &dyn WalletProvider) -> Result<Vec<Address>, ProviderError> {
    let result = provider.request(RpcRequest::request_accounts()).await?;
    serde_json::from_value(result)
        .map_err(|e| ProviderError::internal(format!("malformed account list: {e}")))
}

/// Read the wallet's active chain id.
pub async fn current_chain_id(provider: &dyn WalletProvider) -> Result<u64, ProviderError> {
    let result = provider.request(RpcRequest::chain_id()).await?;
    let parsed = match &result {
        Value::String(s) => parse_chain_id(s),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| ProviderError::internal(format!("malformed chain id {result}")))
}
