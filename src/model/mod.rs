pub mod amount;
pub mod asset;
pub mod chain;
pub mod portfolio;
pub mod session;

pub use amount::AmountError;
pub use asset::{Asset, AssetBalance, BASKET_ASSETS, BASKET_SIZE};
pub use chain::ChainDescriptor;
pub use portfolio::{AllowanceState, Portfolio};
pub use session::{Connection, Session};
