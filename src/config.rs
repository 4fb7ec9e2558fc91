use alloy::primitives::{Address, address};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::flow::allowance::ApprovalPolicy;
use crate::model::{Asset, BASKET_ASSETS, BASKET_SIZE, ChainDescriptor};

/// Env var holding the hex private key used by the local wallet.
pub const PRIVATE_KEY_ENV: &str = "TOPL1_PRIVATE_KEY";

/// Basket contract on Base.
pub const BASKET_ADDRESS: Address = address!("0x350386d7FB4d9F230ce52eEE794ddc5392777048");

/// Native USDC on Base.
pub const USDC_ADDRESS: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// The stablecoin deposits are made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StablecoinConfig {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
}

/// Everything about the deployed basket the client needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub chain: ChainDescriptor,
    pub basket: Address,
    pub stablecoin: StablecoinConfig,
    pub assets: [Asset; BASKET_SIZE],
    /// Smallest deposit, in whole stablecoin units.
    pub minimum_deposit: Decimal,
    pub approval: ApprovalPolicy,
}

impl Deployment {
    pub fn base() -> Self {
        Deployment {
            chain: ChainDescriptor::base(),
            basket: BASKET_ADDRESS,
            stablecoin: StablecoinConfig {
                symbol: "USDC",
                address: USDC_ADDRESS,
                decimals: 6,
            },
            assets: BASKET_ASSETS,
            minimum_deposit: Decimal::from(10),
            approval: ApprovalPolicy::default(),
        }
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::base()
    }
}

/// Settings the CLI may override.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub approval: Option<ApprovalPolicy>,
}

/// Runtime configuration for commands that talk to the chain.
pub struct AppConfig {
    pub deployment: Deployment,
    pub signer: PrivateKeySigner,
}

impl AppConfig {
    pub fn from_env(overrides: &Overrides) -> Result<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV).with_context(|| {
            format!("{PRIVATE_KEY_ENV} env var not set. Set it to your hex private key.")
        })?;
        let signer: PrivateKeySigner = private_key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid private key: {e}"))?;

        Ok(AppConfig {
            deployment: Self::deployment(overrides),
            signer,
        })
    }

    /// Fixed Base deployment with the CLI overrides applied.
    pub fn deployment(overrides: &Overrides) -> Deployment {
        let mut deployment = Deployment::base();
        if let Some(url) = &overrides.rpc_url {
            deployment.chain = deployment.chain.with_rpc_url(url.clone());
        }
        if let Some(policy) = overrides.approval {
            deployment.approval = policy;
        }
        deployment
    }

    pub fn rpc_url(&self) -> &str {
        self.deployment
            .chain
            .rpc_url()
            .unwrap_or("https://mainnet.base.org")
    }
}
