mod mock_common;

use mock_common::*;
use topl1::errors::ProviderError;
use topl1::flow::ChainSwitch;
use topl1::flow::network::ensure_chain;
use topl1::model::ChainDescriptor;
use topl1::FlowError;

const SWITCH: &str = "wallet_switchEthereumChain";
const ADD: &str = "wallet_addEthereumChain";

#[tokio::test]
async fn already_on_chain() {
    let wallet = MockWallet::on_base();
    let outcome = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap();

    assert_eq!(outcome, ChainSwitch::AlreadyActive);
    assert_eq!(wallet.calls.count(SWITCH), 0);
    assert_eq!(wallet.calls.count(ADD), 0);
}

#[tokio::test]
async fn known_chain_is_switched_once() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM, BASE]);
    let outcome = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap();

    assert_eq!(outcome, ChainSwitch::Switched);
    assert_eq!(wallet.calls.count(SWITCH), 1);
    assert_eq!(wallet.calls.count(ADD), 0);
    assert_eq!(*wallet.chain.lock().unwrap(), BASE);
}

#[tokio::test]
async fn unknown_chain_is_added_then_switched() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM]);
    let outcome = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap();

    assert_eq!(outcome, ChainSwitch::AddedAndSwitched);
    assert_eq!(wallet.calls.count(ADD), 1);
    assert_eq!(wallet.calls.count(SWITCH), 2);
    assert_eq!(*wallet.chain.lock().unwrap(), BASE);

    let added = wallet.added.lock().unwrap();
    assert_eq!(added[0], ChainDescriptor::base());
    assert_eq!(added[0].native_currency.symbol, "ETH");
}

#[tokio::test]
async fn other_switch_error_is_not_retried() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM, BASE]);
    wallet.script_switch(Err(ProviderError::internal("wallet busy")));

    let err = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FlowError::ChainSwitchFailed {
            code: ProviderError::INTERNAL,
            message: "wallet busy".into(),
        }
    );
    assert_eq!(wallet.calls.count(SWITCH), 1);
    assert_eq!(wallet.calls.count(ADD), 0);
}

#[tokio::test]
async fn rejected_switch_reads_as_rejection() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM, BASE]);
    wallet.script_switch(Err(ProviderError::user_rejected()));

    let err = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::ChainSwitchFailed { code: 4001, .. }));
    assert!(err.is_user_rejection());
}

#[tokio::test]
async fn failed_add_stops_without_retry() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM]);
    *wallet.add_error.lock().unwrap() = Some(ProviderError::user_rejected());

    let err = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::ChainSwitchFailed { code: 4001, .. }));
    assert_eq!(wallet.calls.count(ADD), 1);
    assert_eq!(wallet.calls.count(SWITCH), 1);
}

#[tokio::test]
async fn retry_failure_is_final() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM]);
    wallet.script_switch(Ok(true));
    wallet.script_switch(Err(ProviderError::internal("still unknown")));

    let err = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::ChainSwitchFailed { code: -32603, .. }));
    assert_eq!(wallet.calls.count(ADD), 1);
    assert_eq!(wallet.calls.count(SWITCH), 2);
}

#[tokio::test]
async fn wallet_that_ignores_switch_is_caught() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM, BASE]);
    wallet.script_switch(Ok(false));

    let err = ensure_chain(wallet.as_ref(), &ChainDescriptor::base())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FlowError::ChainMismatch {
            expected: BASE,
            actual: ETHEREUM,
        }
    );
}

#[tokio::test]
async fn failed_switch_blocks_connect() {
    let wallet = MockWallet::on_chain(ETHEREUM, vec![ETHEREUM]);
    *wallet.add_error.lock().unwrap() = Some(ProviderError::user_rejected());

    let mut c = controller(&wallet);
    let err = c.connect().await.unwrap_err();

    assert!(err.is_user_rejection());
    assert_eq!(c.status().unwrap().text, "Connection rejected by user");
    assert!(!c.session().is_connected());
    assert_eq!(wallet.calls.count("signer"), 0);
}
