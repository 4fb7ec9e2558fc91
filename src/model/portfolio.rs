use alloy::primitives::U256;
use rust_decimal::Decimal;

use super::asset::{Asset, AssetBalance, BASKET_SIZE};

/// Whether the basket contract may pull the user's stablecoin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowanceState {
    /// Not read yet, or invalidated.
    #[default]
    Unknown,
    /// Last allowance read from chain, in stablecoin base units.
    Known(U256),
}

impl AllowanceState {
    pub fn covers(&self, required: U256) -> bool {
        matches!(self, AllowanceState::Known(current) if *current >= required)
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, AllowanceState::Known(current) if !current.is_zero())
    }
}

/// Balances shown for the connected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portfolio {
    pub assets: [AssetBalance; BASKET_SIZE],
    pub stablecoin: Decimal,
    pub allowance: AllowanceState,
}

impl Portfolio {
    pub fn empty(assets: &[Asset; BASKET_SIZE]) -> Self {
        Portfolio {
            assets: (*assets).map(AssetBalance::zero),
            stablecoin: Decimal::ZERO,
            allowance: AllowanceState::Unknown,
        }
    }

    /// Replace basket holdings with a raw `getUserBalances` result.
    pub fn set_basket(&mut self, raw: [U256; BASKET_SIZE]) {
        for (balance, units) in self.assets.iter_mut().zip(raw) {
            *balance = AssetBalance::from_raw(balance.asset, units);
        }
    }

    pub fn basket_is_empty(&self) -> bool {
        self.assets.iter().all(|b| b.amount.is_zero())
    }

    /// Warning shown when a withdrawal will mostly go to fees.
    pub fn dust_warning(&self) -> Option<&'static str> {
        let threshold = Decimal::new(1, 3);
        if !self.basket_is_empty() && self.assets[0].amount < threshold {
            Some("Withdrawal may be less than deposit due to transaction fees and asset volatility.")
        } else {
            None
        }
    }
}
