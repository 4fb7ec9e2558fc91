use std::sync::Arc;

use alloy::primitives::Address;

use crate::contracts::ContractSigner;

/// A connected account together with its signing capability.
#[derive(Clone)]
pub struct Connection {
    pub address: Address,
    pub signer: Arc<dyn ContractSigner>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("signer_chain", &self.signer.chain_id())
            .finish()
    }
}

/// Wallet session. Address and signer live in one `Option`, so one is
/// never present without the other.
#[derive(Debug, Clone, Default)]
pub struct Session {
    connection: Option<Connection>,
    chain_id: Option<u64>,
}

impl Session {
    pub fn establish(&mut self, address: Address, chain_id: u64, signer: Arc<dyn ContractSigner>) {
        self.connection = Some(Connection { address, signer });
        self.chain_id = Some(chain_id);
    }

    pub fn clear(&mut self) {
        self.connection = None;
        self.chain_id = None;
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn address(&self) -> Option<Address> {
        self.connection.as_ref().map(|c| c.address)
    }

    pub fn signer(&self) -> Option<&Arc<dyn ContractSigner>> {
        self.connection.as_ref().map(|c| &c.signer)
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }
}
