use rust_decimal::Decimal;

use crate::model::amount::format_fixed;
use crate::model::{Asset, BASKET_SIZE};

/// Estimated value routed to one asset by a deposit. Display only: the
/// contract's swaps are subject to slippage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewShare {
    pub asset: Asset,
    pub value: Decimal,
}

impl PreviewShare {
    pub fn display(&self) -> String {
        format!("${}", format_fixed(self.value, 2))
    }
}

/// Split `amount` equally (20% each) across the basket.
pub fn distribution_preview(assets: &[Asset; BASKET_SIZE], amount: Decimal) -> Vec<PreviewShare> {
    let weight = Decimal::new(2, 1);
    assets
        .iter()
        .map(|asset| PreviewShare {
            asset: *asset,
            value: amount * weight,
        })
        .collect()
}
