use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

/// TopL1: deposit USDC into five top L1 tokens on Base, or withdraw back.
///
/// Commands that sign read the key from TOPL1_PRIVATE_KEY.
#[derive(Parser)]
#[command(name = "topl1", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base JSON-RPC endpoint (default: https://mainnet.base.org)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// How much USDC to approve when the allowance is too low
    #[arg(long, global = true, value_enum, default_value = "capped")]
    pub approval: ApprovalMode,

    /// Approval ceiling in USDC for `--approval capped`
    #[arg(long, global = true, default_value = "100000")]
    pub approval_cap: Decimal,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show how a deposit would be split across the basket
    Preview {
        /// Amount of USDC (min 10)
        amount: String,
    },

    /// Connect and print USDC balance, allowance and basket holdings
    Status,

    /// Approve the basket contract to spend USDC
    Approve {
        /// Amount of USDC to cover (default: the minimum deposit)
        amount: Option<String>,
    },

    /// Deposit USDC and diversify into the basket
    Deposit {
        /// Amount of USDC (min 10)
        amount: String,
    },

    /// Withdraw all basket holdings back to USDC
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApprovalMode {
    Exact,
    Capped,
    Unbounded,
}
