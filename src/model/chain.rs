use serde::{Deserialize, Serialize};

/// Native gas currency of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A chain as wallets know it.
///
/// Serializes to the EIP-3085 `wallet_addEthereumChain` parameter:
/// `{"chainId": "0x2105", "chainName": "Base", "nativeCurrency": {...},
/// "rpcUrls": [...], "blockExplorerUrls": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    #[serde(with = "hex_quantity")]
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
}

// ── Methods ──────────────────────────────────────────────────────────

impl ChainDescriptor {
    /// Chain id as the `0x`-prefixed hex quantity wallets exchange.
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// First RPC endpoint, if any.
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    pub fn explorer_url(&self) -> Option<&str> {
        self.block_explorer_urls.first().map(String::as_str)
    }

    /// Same chain, different RPC endpoint.
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_urls = vec![rpc_url.into()];
        self
    }
}

// ── Convenience constructors ─────────────────────────────────────────

impl ChainDescriptor {
    pub fn base() -> Self {
        ChainDescriptor {
            chain_id: 8453,
            chain_name: "Base".into(),
            native_currency: NativeCurrency {
                name: "Ethereum".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://mainnet.base.org".into()],
            block_explorer_urls: vec!["https://basescan.org".into()],
        }
    }
}

impl std::fmt::Display for ChainDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.chain_name, self.chain_id)
    }
}

/// Parse a chain id as wallets report it: hex (`"0x2105"`) or decimal.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

mod hex_quantity {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_chain_id(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid chain id `{raw}`")))
    }
}
