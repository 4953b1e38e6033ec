use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use agora_types::Username;

use crate::error::{CoreError, CoreResult};

/// One entry in a wallet's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub amount: f64,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Serializable copy of a wallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub owner: Username,
    pub balance: f64,
    pub transactions: Vec<WalletTransaction>,
}

#[derive(Debug, Default)]
struct Ledger {
    balance: f64,
    transactions: Vec<WalletTransaction>,
}

/// Per-user reward accumulator.
///
/// The balance and the history change together under one lock, so a reader
/// never sees a balance that disagrees with the transactions.
#[derive(Debug)]
pub struct Wallet {
    owner: Username,
    ledger: Mutex<Ledger>,
}

impl Wallet {
    pub fn new(owner: impl Into<Username>) -> Self {
        Self {
            owner: owner.into(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn owner(&self) -> &Username {
        &self.owner
    }

    pub fn balance(&self) -> f64 {
        self.ledger.lock().balance
    }

    pub fn transactions(&self) -> Vec<WalletTransaction> {
        self.ledger.lock().transactions.clone()
    }

    /// Record a reward (or a charge, when negative) and return the new
    /// balance.
    pub fn credit(
        &self,
        amount: f64,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> CoreResult<f64> {
        if !amount.is_finite() {
            return Err(CoreError::InvalidAmount(amount));
        }
        let mut ledger = self.ledger.lock();
        ledger.balance += amount;
        ledger.transactions.push(WalletTransaction {
            amount,
            reason: reason.into(),
            at,
        });
        debug!(owner = %self.owner, amount, balance = ledger.balance, "wallet credited");
        Ok(ledger.balance)
    }

    pub fn summary(&self) -> WalletSummary {
        let ledger = self.ledger.lock();
        WalletSummary {
            owner: self.owner.clone(),
            balance: ledger.balance,
            transactions: ledger.transactions.clone(),
        }
    }
}

/// Wallets keyed by owner, created on first access.
#[derive(Debug, Default)]
pub struct WalletRegistry {
    wallets: DashMap<Username, Arc<Wallet>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wallet of `owner`, created empty if it does not exist yet.
    ///
    /// Concurrent first calls for the same owner all receive the same wallet.
    pub fn get_or_create(&self, owner: &str) -> Arc<Wallet> {
        if let Some(wallet) = self.wallets.get(owner) {
            return Arc::clone(wallet.value());
        }
        let entry = self
            .wallets
            .entry(Username::from(owner))
            .or_insert_with(|| Arc::new(Wallet::new(owner)));
        Arc::clone(entry.value())
    }

    pub fn get(&self, owner: &str) -> Option<Arc<Wallet>> {
        self.wallets.get(owner).map(|w| Arc::clone(w.value()))
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Copies of every wallet, sorted by owner.
    pub fn summaries(&self) -> Vec<WalletSummary> {
        let mut all: Vec<WalletSummary> =
            self.wallets.iter().map(|w| w.value().summary()).collect();
        all.sort_by(|a, b| a.owner.cmp(&b.owner));
        all
    }
}
