use std::sync::Arc;

use alloy::primitives::U256;
use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;

use topl1::config::{AppConfig, Deployment, Overrides};
use topl1::contracts::evm::short_addr;
use topl1::flow::preview::PreviewShare;
use topl1::flow::{ApprovalPolicy, Controller};
use topl1::model::amount::to_base_units;
use topl1::model::AllowanceState;
use topl1::model::amount::{format_fixed, from_base_units};
use topl1::wallet::local::LocalWallet;

use crate::cli::{ApprovalMode, Cli, Command};

/// Entry point for every subcommand.
pub fn run(cli: Cli) -> Result<()> {
    let overrides = overrides(&cli)?;
    match cli.command {
        Command::Preview { amount } => preview(&AppConfig::deployment(&overrides), &amount),
        command => {
            let config = AppConfig::from_env(&overrides)?;
            let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
            rt.block_on(run_async(command, config))
        }
    }
}

fn overrides(cli: &Cli) -> Result<Overrides> {
    let approval = match cli.approval {
        ApprovalMode::Exact => ApprovalPolicy::Exact,
        ApprovalMode::Unbounded => ApprovalPolicy::Unbounded,
        ApprovalMode::Capped => {
            let cap = to_base_units(cli.approval_cap, 6)
                .with_context(|| format!("invalid --approval-cap {}", cli.approval_cap))?;
            ApprovalPolicy::Capped(cap)
        }
    };
    Ok(Overrides {
        rpc_url: cli.rpc_url.clone(),
        approval: Some(approval),
    })
}

fn preview(deployment: &Deployment, amount: &str) -> Result<()> {
    let mut controller = Controller::new(deployment.clone(), None);
    controller.set_amount_input(amount);
    let shares = controller.preview();
    if shares.is_empty() {
        bail!(
            "`{amount}` is not a valid deposit (minimum {} {})",
            deployment.minimum_deposit,
            deployment.stablecoin.symbol
        );
    }
    print_preview(&shares);
    Ok(())
}

async fn run_async(command: Command, config: AppConfig) -> Result<()> {
    // reqwest's rustls needs a process-wide crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let chain_id = config.deployment.chain.chain_id;
    let wallet = Arc::new(LocalWallet::new(
        config.signer.clone(),
        chain_id,
        config.rpc_url(),
    ));
    let mut controller = Controller::new(config.deployment.clone(), Some(wallet));

    println!("=== topl1 ===");
    println!("Network:  {}", config.deployment.chain);
    println!("Contract: {}", config.deployment.basket);
    let connected = controller.connect().await;
    report(&controller);
    connected.context("connecting wallet")?;
    print_portfolio(&controller);

    match command {
        Command::Preview { .. } | Command::Status => return Ok(()),
        Command::Approve { amount } => {
            let outcome = controller.approve(amount.as_deref()).await;
            report(&controller);
            let outcome = outcome.context("approve")?;
            if let Some(tx) = outcome.tx_hash() {
                println!("Approve tx: {tx}");
            }
        }
        Command::Deposit { amount } => {
            controller.set_amount_input(amount.clone());
            print_preview(&controller.preview());
            let receipt = controller.deposit(&amount).await;
            report(&controller);
            let receipt = receipt.context("deposit")?;
            println!("Deposit tx: {}", receipt.tx_hash);
        }
        Command::Withdraw => {
            let receipt = controller.withdraw().await;
            report(&controller);
            let receipt = receipt.context("withdraw")?;
            println!("Withdraw tx: {}", receipt.tx_hash);
        }
    }

    print_portfolio(&controller);
    Ok(())
}

fn report(controller: &Controller) {
    if let Some(status) = controller.status() {
        if status.is_error() {
            eprintln!("ERROR: {status}");
        } else {
            println!("{status}");
        }
    }
}

fn print_preview(shares: &[PreviewShare]) {
    println!("You will receive (20% each):");
    for share in shares {
        println!("  {:<6} {}", share.asset.symbol, share.display());
    }
}

fn print_portfolio(controller: &Controller) {
    let portfolio = controller.portfolio();
    let deployment = controller.deployment();

    if let Some(address) = controller.session().address() {
        println!("Wallet:   {}", short_addr(&address));
    }
    println!(
        "{} balance: {}",
        deployment.stablecoin.symbol,
        format_fixed(portfolio.stablecoin, 2)
    );
    match portfolio.allowance {
        AllowanceState::Unknown => println!("Allowance: unknown"),
        AllowanceState::Known(raw) if raw == U256::MAX => println!("Allowance: unlimited"),
        AllowanceState::Known(raw) => {
            let amount: Decimal = from_base_units(raw, deployment.stablecoin.decimals as u32);
            println!(
                "Allowance: {} {}",
                format_fixed(amount, 2),
                deployment.stablecoin.symbol
            );
        }
    }
    println!("Basket:");
    for balance in &portfolio.assets {
        println!(
            "  {:<6} {:>20}  ({})",
            balance.asset.symbol,
            balance.display(),
            balance.asset.name
        );
    }
    if let Some(warning) = portfolio.dust_warning() {
        println!("WARNING: {warning}");
    }
}
