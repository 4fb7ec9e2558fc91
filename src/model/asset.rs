use alloy::primitives::U256;
use rust_decimal::Decimal;

use super::amount::{format_fixed, from_base_units};

/// One of the basket's fixed assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub name: &'static str,
    pub symbol: &'static str,
    /// Token decimals of the on-chain representation.
    pub decimals: u8,
}

/// Number of assets the basket splits a deposit into.
pub const BASKET_SIZE: usize = 5;

/// Basket assets in the order `getUserBalances` returns them.
pub const BASKET_ASSETS: [Asset; BASKET_SIZE] = [
    Asset { name: "Ethereum", symbol: "WETH", decimals: 18 },
    Asset { name: "Solana", symbol: "SOL", decimals: 8 },
    Asset { name: "XRP", symbol: "cbXRP", decimals: 18 },
    Asset { name: "Litecoin", symbol: "cbLTC", decimals: 8 },
    Asset { name: "Cardano", symbol: "cbADA", decimals: 18 },
];

impl Asset {
    /// Places shown in balances: 8-decimal tokens show all 8, the rest 6.
    pub fn display_decimals(&self) -> usize {
        if self.decimals == 8 { 8 } else { 6 }
    }
}

/// A user's holding of one basket asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetBalance {
    pub asset: Asset,
    pub amount: Decimal,
}

impl AssetBalance {
    pub fn zero(asset: Asset) -> Self {
        AssetBalance {
            asset,
            amount: Decimal::ZERO,
        }
    }

    pub fn from_raw(asset: Asset, raw: U256) -> Self {
        AssetBalance {
            asset,
            amount: from_base_units(raw, asset.decimals as u32),
        }
    }

    pub fn display(&self) -> String {
        format_fixed(self.amount, self.asset.display_decimals() as u32)
    }
}
