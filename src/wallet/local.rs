use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{RpcRequest, WalletEvent, WalletProvider, methods};
use crate::contracts::ContractSigner;
use crate::contracts::evm::EvmSigner;
use crate::errors::ProviderError;
use crate::model::ChainDescriptor;
use crate::model::chain::parse_chain_id;

/// In-process wallet over a local private key.
///
/// Speaks the same request protocol as a browser wallet: it only knows the
/// chains it was given or that were added through `wallet_addEthereumChain`,
/// answers unknown switches with 4902, and pushes account/chain events to
/// every subscriber. Requests are approved without prompting.
pub struct LocalWallet {
    key: PrivateKeySigner,
    chains: Mutex<HashMap<u64, String>>,
    active_chain: Mutex<u64>,
    authorized: AtomicBool,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<WalletEvent>>>,
}

impl LocalWallet {
    /// Wallet whose only known chain is `chain_id`, reached via `rpc_url`.
    pub fn new(key: PrivateKeySigner, chain_id: u64, rpc_url: impl Into<String>) -> Self {
        let mut chains = HashMap::new();
        chains.insert(chain_id, rpc_url.into());
        LocalWallet {
            key,
            chains: Mutex::new(chains),
            active_chain: Mutex::new(chain_id),
            authorized: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn active_chain(&self) -> u64 {
        *self.active_chain.lock()
    }

    pub fn knows_chain(&self, chain_id: u64) -> bool {
        self.chains.lock().contains_key(&chain_id)
    }

    fn emit(&self, event: WalletEvent) {
        debug!(?event, "wallet event");
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn accounts(&self) -> Value {
        if self.authorized.load(Ordering::SeqCst) {
            json!([self.address()])
        } else {
            json!([])
        }
    }

    fn switch_chain(&self, params: &Value) -> Result<Value, ProviderError> {
        let chain_id = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .and_then(Value::as_str)
            .and_then(parse_chain_id)
            .ok_or_else(|| {
                ProviderError::new(ProviderError::INVALID_PARAMS, "expected [{ chainId }]")
            })?;

        if !self.knows_chain(chain_id) {
            return Err(ProviderError::new(
                ProviderError::UNRECOGNIZED_CHAIN,
                format!("Unrecognized chain ID {chain_id:#x}. Try adding the chain first."),
            ));
        }

        let changed = {
            let mut active = self.active_chain.lock();
            let changed = *active != chain_id;
            *active = chain_id;
            changed
        };
        if changed {
            info!(chain_id, "wallet switched chain");
            self.emit(WalletEvent::ChainChanged(chain_id));
        }
        Ok(Value::Null)
    }

    fn add_chain(&self, params: &Value) -> Result<Value, ProviderError> {
        let descriptor: ChainDescriptor = params
            .get(0)
            .cloned()
            .ok_or_else(|| ProviderError::new(ProviderError::INVALID_PARAMS, "missing chain"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| {
                    ProviderError::new(ProviderError::INVALID_PARAMS, e.to_string())
                })
            })?;
        let rpc_url = descriptor.rpc_url().ok_or_else(|| {
            ProviderError::new(ProviderError::INVALID_PARAMS, "rpcUrls must not be empty")
        })?;

        info!(chain = %descriptor, rpc_url, "wallet added chain");
        self.chains
            .lock()
            .insert(descriptor.chain_id, rpc_url.to_string());
        Ok(Value::Null)
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        debug!(method = %request.method, "wallet request");
        match request.method.as_str() {
            methods::REQUEST_ACCOUNTS => {
                let newly = !self.authorized.swap(true, Ordering::SeqCst);
                if newly {
                    self.emit(WalletEvent::AccountsChanged(vec![self.address()]));
                }
                Ok(self.accounts())
            }
            methods::ACCOUNTS => Ok(self.accounts()),
            methods::CHAIN_ID => Ok(json!(format!("{:#x}", self.active_chain()))),
            methods::SWITCH_CHAIN => self.switch_chain(&request.params),
            methods::ADD_CHAIN => self.add_chain(&request.params),
            other => Err(ProviderError::new(
                ProviderError::UNSUPPORTED_METHOD,
                format!("method `{other}` is not supported"),
            )),
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.authorized.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn signer(
        &self,
        account: Address,
        chain_id: u64,
    ) -> Result<Arc<dyn ContractSigner>, ProviderError> {
        if !self.authorized.load(Ordering::SeqCst) || account != self.address() {
            return Err(ProviderError::new(
                ProviderError::UNAUTHORIZED,
                format!("account {account} is not authorized"),
            ));
        }
        let rpc_url = self.chains.lock().get(&chain_id).cloned().ok_or_else(|| {
            ProviderError::new(
                ProviderError::UNRECOGNIZED_CHAIN,
                format!("Unrecognized chain ID {chain_id:#x}"),
            )
        })?;
        let signer = EvmSigner::new(self.key.clone(), chain_id, &rpc_url)?;
        Ok(Arc::new(signer))
    }
}
