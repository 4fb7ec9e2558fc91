use tracing::{info, warn};

use crate::errors::{FlowError, ProviderError};
use crate::model::ChainDescriptor;
use crate::wallet::{RpcRequest, WalletProvider, current_chain_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSwitch {
    AlreadyActive,
    Switched,
    /// The wallet did not know the chain; it was registered, then selected.
    AddedAndSwitched,
}

fn switch_failed(err: ProviderError) -> FlowError {
    FlowError::ChainSwitchFailed {
        code: err.code,
        message: err.message,
    }
}

/// Put the wallet on `chain` before anything is signed.
///
/// On 4902 (unknown chain) the chain is registered once and the switch
/// retried once. Any other failure is returned without retrying.
pub async fn ensure_chain(
    provider: &dyn WalletProvider,
    chain: &ChainDescriptor,
) -> Result<ChainSwitch, FlowError> {
    let current = current_chain_id(provider).await?;
    if current == chain.chain_id {
        return Ok(ChainSwitch::AlreadyActive);
    }

    info!(from = current, to = chain.chain_id, "switching wallet chain");
    let outcome = match provider.request(RpcRequest::switch_chain(chain.chain_id)).await {
        Ok(_) => ChainSwitch::Switched,
        Err(err) if err.is_unrecognized_chain() => {
            warn!(chain = %chain, "wallet does not know chain, adding it");
            provider
                .request(RpcRequest::add_chain(chain))
                .await
                .map_err(switch_failed)?;
            provider
                .request(RpcRequest::switch_chain(chain.chain_id))
                .await
                .map_err(switch_failed)?;
            ChainSwitch::AddedAndSwitched
        }
        Err(err) => return Err(switch_failed(err)),
    };

    let actual = current_chain_id(provider).await?;
    if actual != chain.chain_id {
        return Err(FlowError::ChainMismatch {
            expected: chain.chain_id,
            actual,
        });
    }
    Ok(outcome)
}
