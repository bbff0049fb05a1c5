//! Black-box flows through the public API only.
//!
//! The in-crate tests cover the state machine in detail; this file checks
//! that the public surface is sufficient to wire the engine with custom
//! collaborators, as an embedding service would.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;

use rewards_ledger::{
    AppConfig, Asset, ChannelPublisher, ConversionRequest, LedgerStore, NetworkConfig,
    SettlementClient, SettlementError, TransferCoordinator, TransferId, TransferStatus,
    TransferStore, UserId, WithdrawalRequest,
};

const USER: UserId = 7;

/// Minimal chain stub: fixed hot-wallet balance, deterministic tx hashes.
struct StubChain {
    hot_balance: u64,
    sends: AtomicU64,
}

#[async_trait]
impl SettlementClient for StubChain {
    async fn external_balance(
        &self,
        _network: &str,
        _address: &str,
    ) -> Result<u64, SettlementError> {
        Ok(self.hot_balance)
    }

    async fn send(
        &self,
        _network: &str,
        _asset: Asset,
        _to_address: &str,
        _amount: u64,
    ) -> Result<String, SettlementError> {
        let n = self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(format!("0xstub{n:060}"))
    }
}

fn engine(hot_balance: u64) -> (Arc<TransferCoordinator>, Arc<LedgerStore>, Arc<StubChain>) {
    // Rates and networks come from configuration in production; build the
    // same tables the YAML loader would.
    let config = AppConfig {
        rates: vec![rewards_ledger::Rate {
            from: Asset::Usdt,
            to: Asset::Xp,
            rate: dec!(10000),
            fee_percent: dec!(2),
            min_amount: dec!(0.1),
            max_amount: dec!(10000),
            is_active: true,
        }],
        networks: vec![NetworkConfig {
            coin: "USDT".into(),
            network: "TRC20".into(),
            minimum_withdraw: dec!(5),
            withdraw_fee: dec!(1),
            hot_wallet_address: "THot777".into(),
        }],
        ..AppConfig::default()
    };

    let ledger = Arc::new(LedgerStore::new());
    let chain = Arc::new(StubChain {
        hot_balance,
        sends: AtomicU64::new(0),
    });
    let (publisher, _events) = ChannelPublisher::new();
    let coordinator = Arc::new(TransferCoordinator::new(
        Arc::clone(&ledger),
        Arc::new(config.rate_table()),
        Arc::new(config.network_table()),
        Arc::new(TransferStore::new()),
        Arc::clone(&chain) as Arc<dyn SettlementClient>,
        Arc::new(publisher),
    ));
    (coordinator, ledger, chain)
}

async fn wait_terminal(
    coordinator: &TransferCoordinator,
    id: TransferId,
) -> rewards_ledger::TransferRecord {
    for _ in 0..500 {
        let record = coordinator.get_transaction(id).unwrap();
        if record.status.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("transfer {id} did not finish");
}

#[tokio::test]
async fn conversion_then_withdrawal_of_proceeds() {
    let (coordinator, ledger, chain) = engine(1_000_000_000);
    ledger.credit(USER, Asset::Usdt, 100_000_000).unwrap(); // 100 USDT

    // Convert 10 USDT to XP
    let receipt = coordinator
        .initiate_conversion(ConversionRequest {
            user_id: USER,
            from_asset: Asset::Usdt,
            to_asset: Asset::Xp,
            amount: dec!(10),
        })
        .await
        .unwrap();
    let record = wait_terminal(&coordinator, receipt.transfer_id).await;
    assert_eq!(record.status, TransferStatus::Completed);
    assert_eq!(ledger.available(USER, Asset::Xp), 98_000);

    // Withdraw 10 of the remaining 90 USDT
    let receipt = coordinator
        .initiate_withdrawal(WithdrawalRequest {
            user_id: USER,
            coin: "usdt".into(), // symbol lookup is case-insensitive
            network: "TRC20".into(),
            address: "TDest999".into(),
            amount: dec!(10),
        })
        .await
        .unwrap();
    let record = wait_terminal(&coordinator, receipt.transfer_id).await;
    assert_eq!(record.status, TransferStatus::Completed);
    assert_eq!(record.external_ref.as_deref(), Some(&format!("0xstub{:060}", 0)[..]));
    assert_eq!(chain.sends.load(Ordering::SeqCst), 1);

    let wallet = ledger.wallet(USER).unwrap();
    assert_eq!(wallet.asset(Asset::Usdt).balance(), 80_000_000);
    assert_eq!(wallet.asset(Asset::Usdt).locked(), 0);
    assert!(wallet.is_consistent());
}

#[tokio::test]
async fn withdrawal_blocked_by_empty_hot_wallet() {
    let (coordinator, ledger, chain) = engine(0);
    ledger.credit(USER, Asset::Usdt, 50_000_000).unwrap();

    let receipt = coordinator
        .initiate_withdrawal(WithdrawalRequest {
            user_id: USER,
            coin: "USDT".into(),
            network: "TRC20".into(),
            address: "TDest999".into(),
            amount: dec!(10),
        })
        .await
        .unwrap();
    let record = wait_terminal(&coordinator, receipt.transfer_id).await;
    assert_eq!(record.status, TransferStatus::Failed);
    assert_eq!(chain.sends.load(Ordering::SeqCst), 0);

    // Full balance usable again after compensation
    assert_eq!(ledger.available(USER, Asset::Usdt), 50_000_000);
}
