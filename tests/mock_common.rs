#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, TxHash, U256, address};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use topl1::contracts::{BasketContract, ContractSigner, PendingTx, Receipt, Stablecoin};
use topl1::errors::ProviderError;
use topl1::model::chain::parse_chain_id;
use topl1::model::{BASKET_SIZE, ChainDescriptor};
use topl1::wallet::{RpcRequest, WalletEvent, WalletProvider, methods};
use topl1::{Controller, Deployment};

// ── Constants ────────────────────────────────────────────────────────

pub const USER: Address = address!("0x1111111111111111111111111111111111111111");
pub const OTHER_USER: Address = address!("0x2222222222222222222222222222222222222222");
pub const BASE: u64 = 8453;
pub const ETHEREUM: u64 = 1;

/// Whole USDC to 6-decimal units.
pub fn usdc(whole: u64) -> U256 {
    U256::from(whole) * U256::from(1_000_000u64)
}

/// Holdings credited by one mock deposit.
pub fn deposit_credit() -> [U256; BASKET_SIZE] {
    [
        U256::from(1_000_000_000_000_000u128), // 0.001 WETH
        U256::from(1_000_000u64),              // 0.01 SOL
        U256::from(2_000_000_000_000_000_000u128),
        U256::from(3_000_000u64),
        U256::from(5_000_000_000_000_000_000u128),
    ]
}

// ── Call log ─────────────────────────────────────────────────────────

/// Counts every provider and contract call by method name.
#[derive(Default)]
pub struct Calls(Mutex<HashMap<&'static str, usize>>);

impl Calls {
    pub fn hit(&self, name: &'static str) {
        *self.0.lock().unwrap().entry(name).or_default() += 1;
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.lock().unwrap().values().sum()
    }

    pub fn reset(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub type Hook = Box<dyn FnOnce() + Send>;

// ── Ledger: on-chain state behind the mock contracts ────────────────

pub struct Ledger {
    pub usdc_balance: Mutex<U256>,
    pub allowance: Mutex<U256>,
    pub basket: Mutex<[U256; BASKET_SIZE]>,
    /// When false, a mined approval leaves the allowance unchanged.
    pub approve_takes_effect: Mutex<bool>,
    pub approve_reverts: Mutex<bool>,
    pub last_approval: Mutex<Option<U256>>,
    pub estimate_error: Mutex<Option<ProviderError>>,
    pub deposit_send_error: Mutex<Option<ProviderError>>,
    pub deposit_reverts: Mutex<bool>,
    pub on_deposit_sent: Mutex<Option<Hook>>,
    pub withdraw_send_error: Mutex<Option<ProviderError>>,
    pub withdraw_reverts: Mutex<bool>,
    next_tx: AtomicU8,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger {
            usdc_balance: Mutex::new(usdc(100)),
            allowance: Mutex::new(U256::ZERO),
            basket: Mutex::new([U256::ZERO; BASKET_SIZE]),
            approve_takes_effect: Mutex::new(true),
            approve_reverts: Mutex::new(false),
            last_approval: Mutex::new(None),
            estimate_error: Mutex::new(None),
            deposit_send_error: Mutex::new(None),
            deposit_reverts: Mutex::new(false),
            on_deposit_sent: Mutex::new(None),
            withdraw_send_error: Mutex::new(None),
            withdraw_reverts: Mutex::new(false),
            next_tx: AtomicU8::new(1),
        }
    }
}

impl Ledger {
    fn next_hash(&self) -> TxHash {
        B256::with_last_byte(self.next_tx.fetch_add(1, Ordering::SeqCst))
    }

    pub fn set_allowance(&self, value: U256) {
        *self.allowance.lock().unwrap() = value;
    }

    pub fn set_usdc(&self, value: U256) {
        *self.usdc_balance.lock().unwrap() = value;
    }

    pub fn set_basket(&self, value: [U256; BASKET_SIZE]) {
        *self.basket.lock().unwrap() = value;
    }

    pub fn allowance(&self) -> U256 {
        *self.allowance.lock().unwrap()
    }
}

// ── Pending transaction ──────────────────────────────────────────────

pub struct MockPending {
    tx_hash: TxHash,
    success: bool,
    effect: Option<Hook>,
}

#[async_trait]
impl PendingTx for MockPending {
    fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    async fn confirmed(self: Box<Self>) -> Result<Receipt, ProviderError> {
        let this = *self;
        if this.success {
            if let Some(effect) = this.effect {
                effect();
            }
        }
        Ok(Receipt {
            tx_hash: this.tx_hash,
            success: this.success,
            gas_used: 21_000,
        })
    }
}

// ── Contracts ────────────────────────────────────────────────────────

pub struct MockToken {
    address: Address,
    ledger: Arc<Ledger>,
    calls: Arc<Calls>,
}

impl MockToken {
    pub fn new(address: Address, ledger: Arc<Ledger>, calls: Arc<Calls>) -> Self {
        MockToken {
            address,
            ledger,
            calls,
        }
    }
}

#[async_trait]
impl Stablecoin for MockToken {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance_of(&self, _owner: Address) -> Result<U256, ProviderError> {
        self.calls.hit("balanceOf");
        Ok(*self.ledger.usdc_balance.lock().unwrap())
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256, ProviderError> {
        self.calls.hit("allowance");
        Ok(self.ledger.allowance())
    }

    async fn approve(
        &self,
        _spender: Address,
        amount: U256,
    ) -> Result<Box<dyn PendingTx>, ProviderError> {
        self.calls.hit("approve");
        *self.ledger.last_approval.lock().unwrap() = Some(amount);
        let takes_effect = *self.ledger.approve_takes_effect.lock().unwrap();
        let success = !*self.ledger.approve_reverts.lock().unwrap();
        let ledger = self.ledger.clone();
        let effect: Option<Hook> = if takes_effect {
            Some(Box::new(move || ledger.set_allowance(amount)))
        } else {
            None
        };
        Ok(Box::new(MockPending {
            tx_hash: self.ledger.next_hash(),
            success,
            effect,
        }))
    }
}

pub struct MockBasket {
    address: Address,
    ledger: Arc<Ledger>,
    calls: Arc<Calls>,
}

#[async_trait]
impl BasketContract for MockBasket {
    fn address(&self) -> Address {
        self.address
    }

    async fn user_balances(&self, _user: Address) -> Result<[U256; BASKET_SIZE], ProviderError> {
        self.calls.hit("getUserBalances");
        Ok(*self.ledger.basket.lock().unwrap())
    }

    async fn estimate_deposit(&self, _amount: U256) -> Result<u64, ProviderError> {
        self.calls.hit("estimateGas");
        match self.ledger.estimate_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(250_000),
        }
    }

    async fn deposit(&self, amount: U256) -> Result<Box<dyn PendingTx>, ProviderError> {
        self.calls.hit("deposit");
        if let Some(err) = self.ledger.deposit_send_error.lock().unwrap().clone() {
            return Err(err);
        }
        let hook = self.ledger.on_deposit_sent.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        let success = !*self.ledger.deposit_reverts.lock().unwrap();
        let ledger = self.ledger.clone();
        Ok(Box::new(MockPending {
            tx_hash: self.ledger.next_hash(),
            success,
            effect: Some(Box::new(move || {
                let mut balance = ledger.usdc_balance.lock().unwrap();
                *balance -= amount;
                let mut allowance = ledger.allowance.lock().unwrap();
                *allowance = allowance.saturating_sub(amount);
                let mut basket = ledger.basket.lock().unwrap();
                for (held, credit) in basket.iter_mut().zip(deposit_credit()) {
                    *held += credit;
                }
            })),
        }))
    }

    async fn withdraw(&self) -> Result<Box<dyn PendingTx>, ProviderError> {
        self.calls.hit("withdraw");
        if let Some(err) = self.ledger.withdraw_send_error.lock().unwrap().clone() {
            return Err(err);
        }
        let success = !*self.ledger.withdraw_reverts.lock().unwrap();
        let ledger = self.ledger.clone();
        Ok(Box::new(MockPending {
            tx_hash: self.ledger.next_hash(),
            success,
            effect: Some(Box::new(move || {
                *ledger.usdc_balance.lock().unwrap() += usdc(19);
                ledger.set_basket([U256::ZERO; BASKET_SIZE]);
            })),
        }))
    }
}

pub struct MockSigner {
    address: Address,
    chain_id: u64,
    ledger: Arc<Ledger>,
    calls: Arc<Calls>,
}

impl ContractSigner for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn stablecoin(&self, token: Address) -> Arc<dyn Stablecoin> {
        Arc::new(MockToken::new(token, self.ledger.clone(), self.calls.clone()))
    }

    fn basket(&self, contract: Address) -> Arc<dyn BasketContract> {
        Arc::new(MockBasket {
            address: contract,
            ledger: self.ledger.clone(),
            calls: self.calls.clone(),
        })
    }
}

// ── Wallet ───────────────────────────────────────────────────────────

pub struct MockWallet {
    pub calls: Arc<Calls>,
    pub ledger: Arc<Ledger>,
    pub accounts: Mutex<Vec<Address>>,
    pub chain: Mutex<u64>,
    pub known_chains: Mutex<Vec<u64>>,
    pub reject_accounts: Mutex<bool>,
    /// Scripted switch answers, consumed in order before the default
    /// behaviour. `Ok(false)` reports success without switching.
    pub switch_script: Mutex<VecDeque<Result<bool, ProviderError>>>,
    pub add_error: Mutex<Option<ProviderError>>,
    pub added: Mutex<Vec<ChainDescriptor>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<WalletEvent>>>,
}

impl MockWallet {
    /// Unlocked wallet with one account, on Base, also knowing Ethereum.
    pub fn on_base() -> Arc<Self> {
        Self::on_chain(BASE, vec![BASE, ETHEREUM])
    }

    pub fn on_chain(chain: u64, known: Vec<u64>) -> Arc<Self> {
        Arc::new(MockWallet {
            calls: Arc::new(Calls::default()),
            ledger: Arc::new(Ledger::default()),
            accounts: Mutex::new(vec![USER]),
            chain: Mutex::new(chain),
            known_chains: Mutex::new(known),
            reject_accounts: Mutex::new(false),
            switch_script: Mutex::new(VecDeque::new()),
            add_error: Mutex::new(None),
            added: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn emit(&self, event: WalletEvent) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn script_switch(&self, answer: Result<bool, ProviderError>) {
        self.switch_script.lock().unwrap().push_back(answer);
    }

    fn switch(&self, params: &Value) -> Result<Value, ProviderError> {
        let target = params[0]["chainId"]
            .as_str()
            .and_then(parse_chain_id)
            .ok_or_else(|| ProviderError::new(ProviderError::INVALID_PARAMS, "bad chainId"))?;

        if let Some(answer) = self.switch_script.lock().unwrap().pop_front() {
            match answer {
                Err(err) => return Err(err),
                Ok(false) => return Ok(Value::Null),
                Ok(true) => {}
            }
        }
        if !self.known_chains.lock().unwrap().contains(&target) {
            return Err(ProviderError::new(
                ProviderError::UNRECOGNIZED_CHAIN,
                "Unrecognized chain ID",
            ));
        }
        let changed = {
            let mut chain = self.chain.lock().unwrap();
            let changed = *chain != target;
            *chain = target;
            changed
        };
        if changed {
            self.emit(WalletEvent::ChainChanged(target));
        }
        Ok(Value::Null)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        match request.method.as_str() {
            methods::REQUEST_ACCOUNTS => {
                self.calls.hit(methods::REQUEST_ACCOUNTS);
                if *self.reject_accounts.lock().unwrap() {
                    return Err(ProviderError::user_rejected());
                }
                Ok(json!(*self.accounts.lock().unwrap()))
            }
            methods::CHAIN_ID => {
                self.calls.hit(methods::CHAIN_ID);
                Ok(json!(format!("{:#x}", *self.chain.lock().unwrap())))
            }
            methods::SWITCH_CHAIN => {
                self.calls.hit(methods::SWITCH_CHAIN);
                self.switch(&request.params)
            }
            methods::ADD_CHAIN => {
                self.calls.hit(methods::ADD_CHAIN);
                if let Some(err) = self.add_error.lock().unwrap().clone() {
                    return Err(err);
                }
                let descriptor: ChainDescriptor = serde_json::from_value(request.params[0].clone())
                    .map_err(|e| ProviderError::new(ProviderError::INVALID_PARAMS, e.to_string()))?;
                self.known_chains.lock().unwrap().push(descriptor.chain_id);
                self.added.lock().unwrap().push(descriptor);
                Ok(Value::Null)
            }
            _ => Err(ProviderError::new(
                ProviderError::UNSUPPORTED_METHOD,
                "unsupported",
            )),
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.calls.hit("disconnect");
        Ok(())
    }

    async fn signer(
        &self,
        account: Address,
        chain_id: u64,
    ) -> Result<Arc<dyn ContractSigner>, ProviderError> {
        self.calls.hit("signer");
        Ok(Arc::new(MockSigner {
            address: account,
            chain_id,
            ledger: self.ledger.clone(),
            calls: self.calls.clone(),
        }))
    }
}

// ── Controller helpers ───────────────────────────────────────────────

pub fn controller(wallet: &Arc<MockWallet>) -> Controller {
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    Controller::new(Deployment::base(), Some(provider))
}

/// Connected controller with the call log cleared.
pub async fn connected(wallet: &Arc<MockWallet>) -> Controller {
    let mut c = controller(wallet);
    c.connect().await.expect("connect");
    wallet.calls.reset();
    c
}
