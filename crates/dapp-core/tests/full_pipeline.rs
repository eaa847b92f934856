//! End-to-end flows through the public `DappClient` API: pairing with a
//! simulated wallet, signing, broadcasting to an in-memory cluster and
//! reading back balances and history.

use std::sync::Arc;

use chain_sol::program::TRANSFER_FEE_RESERVE;
use chain_sol::{
    bytes_to_address, rent_exempt_minimum, LocalCluster, SolanaRpc, LAMPORTS_PER_SIGNATURE,
    LAMPORTS_PER_SOL,
};
use dapp_core::{
    ConnectionStatus, DappClient, DappConfig, DappError, TransactionKind, TransactionStatus,
    TransferParams, TransferRoute,
};
use url::Url;
use wallet_link::WalletSimulator;

const RECIPIENT: [u8; 32] = [0x55; 32];

fn config() -> DappConfig {
    DappConfig {
        redirect_link: "cointransfer://wallet-callback".into(),
        confirmation_timeout_secs: 1,
        poll_interval_ms: 10,
        ..Default::default()
    }
}

/// A client connected to a simulated wallet on a fresh cluster.
fn setup() -> (DappClient, Arc<LocalCluster>, WalletSimulator) {
    let cluster = Arc::new(LocalCluster::new());
    let client = DappClient::with_rpc(config(), cluster.clone()).unwrap();
    let mut wallet = WalletSimulator::new([7; 32]);

    let connect = Url::parse(&client.connect().unwrap()).unwrap();
    let callback = wallet.approve_connect(&connect).unwrap();
    let address = client.handle_connect_callback(callback.to_string()).unwrap();
    assert_eq!(address, bytes_to_address(&wallet.address()));
    assert_eq!(client.connection_status(), ConnectionStatus::Connected);

    (client, cluster, wallet)
}

fn transfer(lamports: u64) -> TransferParams {
    TransferParams {
        recipient: bytes_to_address(&RECIPIENT),
        lamports,
        route: TransferRoute::System,
        wallet_broadcasts: false,
    }
}

// ─── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn two_sol_sender_sends_half_a_sol() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), 2 * LAMPORTS_PER_SOL);

    let sign = client.prepare_transfer(transfer(LAMPORTS_PER_SOL / 2)).await.unwrap();
    let callback = wallet.approve_sign(&Url::parse(&sign).unwrap()).unwrap();
    let receipt = client.handle_sign_callback(callback.to_string()).await.unwrap();

    assert_eq!(cluster.balance(&RECIPIENT), LAMPORTS_PER_SOL / 2);
    let sender = cluster.balance(&wallet.address());
    assert!(sender < 3 * LAMPORTS_PER_SOL / 2);
    assert_eq!(sender, 2 * LAMPORTS_PER_SOL - LAMPORTS_PER_SOL / 2 - LAMPORTS_PER_SIGNATURE);

    assert_eq!(receipt.status, TransactionStatus::Confirmed);
    let history = client.history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].signature, receipt.signature);
    assert_eq!(history[0].kind, TransactionKind::Transfer);
    assert_eq!(history[0].amount, LAMPORTS_PER_SOL / 2);
    assert_eq!(history[0].status, TransactionStatus::Confirmed);

    // A later refresh sees the cluster's finalized status.
    let refreshed = client.refresh_status(receipt.signature.clone()).await.unwrap();
    assert_eq!(refreshed, TransactionStatus::Finalized);
}

#[tokio::test]
async fn balance_defaults_to_connected_wallet() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), 1_234_567);

    assert_eq!(client.get_balance(None).await.unwrap(), 1_234_567);
    assert_eq!(
        client.get_balance(Some(bytes_to_address(&RECIPIENT))).await.unwrap(),
        0
    );
    assert!(matches!(
        client.get_balance(Some("nope".into())).await,
        Err(DappError::InvalidAddress(_))
    ));
}

#[tokio::test]
async fn deprecated_sign_and_send_path() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);

    let params = TransferParams {
        wallet_broadcasts: true,
        ..transfer(1_000_000)
    };
    let sign = Url::parse(&client.prepare_transfer(params).await.unwrap()).unwrap();
    assert!(sign.path().ends_with("/signAndSendTransaction"));

    // The wallet submits on its own.
    let (callback, signed) = wallet.approve_sign_and_send(&sign).unwrap();
    cluster.send_transaction(&signed).await.unwrap();

    let receipt = client.handle_sign_callback(callback.to_string()).await.unwrap();
    assert_eq!(receipt.status, TransactionStatus::Finalized);
    assert_eq!(cluster.balance(&RECIPIENT), 1_000_000);
    assert_eq!(cluster.sent_count(), 1);
}

#[tokio::test]
async fn airdrop_is_recorded() {
    let (client, cluster, wallet) = setup();

    let signature = client.request_airdrop(LAMPORTS_PER_SOL).await.unwrap();
    assert_eq!(cluster.balance(&wallet.address()), LAMPORTS_PER_SOL);

    let record = &client.history(1)[0];
    assert_eq!(record.signature, signature);
    assert_eq!(record.kind, TransactionKind::Airdrop);
    assert_eq!(record.status, TransactionStatus::Pending);

    assert_eq!(
        client.refresh_status(signature).await.unwrap(),
        TransactionStatus::Finalized
    );
}

// ─── Validation and rejection ────────────────────────────────────────

#[tokio::test]
async fn zero_amount_never_reaches_the_wallet() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);

    assert!(matches!(
        client.prepare_transfer(transfer(0)).await,
        Err(DappError::InvalidAmount(_))
    ));
    // No request is pending, so a valid transfer can follow right away.
    assert!(client.prepare_transfer(transfer(1)).await.is_ok());
}

#[tokio::test]
async fn unaffordable_transfer_fails_preflight() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);

    match client.prepare_transfer(transfer(LAMPORTS_PER_SOL)).await {
        Err(DappError::InsufficientFunds { balance, required }) => {
            assert_eq!(balance, LAMPORTS_PER_SOL);
            assert!(required > LAMPORTS_PER_SOL);
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
    assert_eq!(cluster.sent_count(), 0);
}

#[tokio::test]
async fn program_route_preflight_keeps_the_program_reserve() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);
    let rent = rent_exempt_minimum(0);
    let program = |lamports| TransferParams {
        route: TransferRoute::Program { record_stats: true },
        ..transfer(lamports)
    };

    // The most a System transfer may move is one reserve too much here.
    let system_max = LAMPORTS_PER_SOL - LAMPORTS_PER_SIGNATURE - rent;
    assert!(matches!(
        client.prepare_transfer(program(system_max)).await,
        Err(DappError::InsufficientFunds { .. })
    ));

    let program_max = system_max - TRANSFER_FEE_RESERVE;
    assert!(client.prepare_transfer(program(program_max)).await.is_ok());
}

#[tokio::test]
async fn wallet_rejection_leaves_balances_untouched() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);

    let sign = Url::parse(&client.prepare_transfer(transfer(1_000)).await.unwrap()).unwrap();
    let callback = wallet.reject(&sign, 4001, "User rejected the request.").unwrap();

    assert!(matches!(
        client.handle_sign_callback(callback.to_string()).await,
        Err(DappError::WalletRejected { code: 4001, .. })
    ));
    assert_eq!(cluster.balance(&wallet.address()), LAMPORTS_PER_SOL);
    assert_eq!(cluster.sent_count(), 0);
    assert!(client.history(10).is_empty());
}

#[tokio::test]
async fn second_transfer_while_signing_is_rejected() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);

    client.prepare_transfer(transfer(1_000)).await.unwrap();
    assert!(matches!(
        client.prepare_transfer(transfer(2_000)).await,
        Err(DappError::RequestPending(_))
    ));

    assert!(client.abandon_pending_request());
    assert!(client.prepare_transfer(transfer(2_000)).await.is_ok());
}

#[tokio::test]
async fn callback_after_reset_fails_decryption() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);

    let sign = Url::parse(&client.prepare_transfer(transfer(1_000)).await.unwrap()).unwrap();
    let callback = wallet.approve_sign(&sign).unwrap();
    client.reset_session();

    assert!(matches!(
        client.handle_sign_callback(callback.to_string()).await,
        Err(DappError::NotConnected)
    ));
    assert_eq!(cluster.sent_count(), 0);
}

#[tokio::test]
async fn transfer_after_disconnect_fails_fast() {
    let (client, _cluster, _wallet) = setup();
    let bye = Url::parse(&client.disconnect().unwrap()).unwrap();
    assert!(bye.path().ends_with("/disconnect"));
    assert_eq!(client.connection_status(), ConnectionStatus::Disconnected);
    assert!(client.wallet_address().is_none());

    assert!(matches!(
        client.prepare_transfer(transfer(1_000)).await,
        Err(DappError::NotConnected)
    ));
}

// ─── Network outcomes ────────────────────────────────────────────────

#[tokio::test]
async fn dropped_transaction_times_out_and_stays_pending() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);
    cluster.set_landing_commitment(None);

    let sign = Url::parse(&client.prepare_transfer(transfer(1_000)).await.unwrap()).unwrap();
    let callback = wallet.approve_sign(&sign).unwrap();

    let signature = match client.handle_sign_callback(callback.to_string()).await {
        Err(DappError::ConfirmationTimeout { signature }) => signature,
        other => panic!("expected ConfirmationTimeout, got {other:?}"),
    };
    assert_eq!(client.history(1)[0].status, TransactionStatus::Pending);
    assert_eq!(
        client.refresh_status(signature).await.unwrap(),
        TransactionStatus::Pending
    );
}

#[tokio::test]
async fn expired_blockhash_is_rejected_and_recorded_failed() {
    let (client, cluster, wallet) = setup();
    cluster.fund(&wallet.address(), LAMPORTS_PER_SOL);

    let sign = Url::parse(&client.prepare_transfer(transfer(1_000)).await.unwrap()).unwrap();
    let callback = wallet.approve_sign(&sign).unwrap();
    // The user took too long in the wallet.
    cluster.advance_blocks(200);

    assert!(matches!(
        client.handle_sign_callback(callback.to_string()).await,
        Err(DappError::BroadcastRejected(_))
    ));
    assert_eq!(client.history(1)[0].status, TransactionStatus::Failed);
    assert_eq!(cluster.balance(&RECIPIENT), 0);
}

#[tokio::test]
async fn program_stats_absent_before_initialize() {
    let (client, _cluster, _wallet) = setup();
    assert_eq!(client.program_stats().await.unwrap(), None);
}

#[tokio::test]
async fn history_survives_export_import() {
    let (client, _cluster, _wallet) = setup();
    client.request_airdrop(10).await.unwrap();
    let json = client.export_history().unwrap();

    let other = DappClient::with_rpc(config(), Arc::new(LocalCluster::new())).unwrap();
    other.import_history(json).unwrap();
    assert_eq!(other.history(10), client.history(10));
}
