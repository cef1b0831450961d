//! In-memory port implementations for service-level tests.

use crate::domain::entities::{CartSnapshot, Order};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::events::OrderPlaced;
use crate::domain::value_objects::{Money, PaymentStatus};
use crate::domain::{Payment, WalletTransaction};
use crate::ports::bkash_port::{BkashExecution, BkashPaymentCreated, CreateBkashPayment};
use crate::ports::{BkashPort, CheckoutStorePort, NotificationPort, WalletStorePort};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Scripted gateway double. `create_payment` always hands out the
/// configured payment id; `execute_payment` pops pre-loaded results.
pub struct MockBkash {
    payment_id: String,
    executions: Mutex<VecDeque<DomainResult<BkashExecution>>>,
    execute_calls: AtomicUsize,
}

impl MockBkash {
    pub const PAYMENT_ID: &'static str = "TR0011AB";
    pub const BKASH_URL: &'static str = "https://sandbox.payment.bkash.com/?paymentId=TR0011AB";

    pub fn new() -> Self {
        Self::with_payment_id(Self::PAYMENT_ID)
    }

    pub fn with_payment_id(payment_id: &str) -> Self {
        Self {
            payment_id: payment_id.to_string(),
            executions: Mutex::new(VecDeque::new()),
            execute_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_execution(&self, result: DomainResult<BkashExecution>) {
        self.executions.lock().unwrap().push_back(result);
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BkashPort for MockBkash {
    async fn create_payment(
        &self,
        _request: CreateBkashPayment,
    ) -> DomainResult<BkashPaymentCreated> {
        Ok(BkashPaymentCreated {
            payment_id: self.payment_id.clone(),
            bkash_url: Self::BKASH_URL.to_string(),
        })
    }

    async fn execute_payment(&self, _payment_id: &str) -> DomainResult<BkashExecution> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.executions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::BkashError("no scripted execution".to_string())))
    }
}

/// In-memory checkout ledger with the same conditional-update semantics as
/// the MySQL store.
pub struct InMemoryCheckoutStore {
    payments: Mutex<HashMap<String, Payment>>,
    carts: Mutex<HashMap<Uuid, CartSnapshot>>,
    orders: Mutex<Vec<Order>>,
    seq: AtomicU64,
    race_next: AtomicBool,
}

impl InMemoryCheckoutStore {
    pub fn new() -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
            carts: Mutex::new(HashMap::new()),
            orders: Mutex::new(Vec::new()),
            seq: AtomicU64::new(0),
            race_next: AtomicBool::new(false),
        }
    }

    pub fn put_cart(&self, user_id: Uuid, cart: CartSnapshot) {
        self.carts.lock().unwrap().insert(user_id, cart);
    }

    pub fn cart(&self, user_id: Uuid) -> Option<CartSnapshot> {
        self.carts.lock().unwrap().get(&user_id).cloned()
    }

    pub fn payment(&self, payment_id: &str) -> Option<Payment> {
        self.payments.lock().unwrap().get(payment_id).cloned()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    /// Makes the next `complete_checkout` lose to a simulated concurrent
    /// delivery that commits first.
    pub fn race_next_completion(&self) {
        self.race_next.store(true, Ordering::SeqCst);
    }

    fn apply_completion(&self, payment: &Payment, trx_id: &str) -> DomainResult<Order> {
        let mut payments = self.payments.lock().unwrap();
        let stored = payments
            .get_mut(&payment.payment_id)
            .ok_or_else(|| DomainError::PaymentNotFound(payment.payment_id.clone()))?;

        if stored.status != PaymentStatus::Pending {
            return Err(DomainError::AlreadyProcessed(payment.payment_id.clone()));
        }

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let number = Order::format_number(Utc::now().date_naive(), seq);
        let order = Order::from_payment(number, payment, trx_id);

        stored.mark_completed(trx_id.to_string(), order.id)?;
        self.orders.lock().unwrap().push(order.clone());
        self.carts.lock().unwrap().remove(&payment.user_id);
        Ok(order)
    }
}

#[async_trait]
impl CheckoutStorePort for InMemoryCheckoutStore {
    async fn insert_payment(&self, payment: &Payment) -> DomainResult<()> {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.payment_id.clone(), payment.clone());
        Ok(())
    }

    async fn find_payment(&self, payment_id: &str) -> DomainResult<Option<Payment>> {
        Ok(self.payments.lock().unwrap().get(payment_id).cloned())
    }

    async fn find_cart(&self, user_id: Uuid) -> DomainResult<Option<CartSnapshot>> {
        Ok(self.carts.lock().unwrap().get(&user_id).cloned())
    }

    async fn complete_checkout(&self, payment: &Payment, trx_id: &str) -> DomainResult<Order> {
        if self.race_next.swap(false, Ordering::SeqCst) {
            // the simulated rival commits, our conditional update matches
            // no pending row
            self.apply_completion(payment, "8TRRIVAL01")?;
            return Err(DomainError::AlreadyProcessed(payment.payment_id.clone()));
        }
        self.apply_completion(payment, trx_id)
    }

    async fn mark_payment_failed(&self, payment: &Payment) -> DomainResult<bool> {
        let mut payments = self.payments.lock().unwrap();
        match payments.get_mut(&payment.payment_id) {
            Some(stored) if stored.status == PaymentStatus::Pending => {
                *stored = payment.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::PaymentNotFound(payment.payment_id.clone())),
        }
    }
}

/// In-memory wallet ledger.
pub struct InMemoryWalletStore {
    transactions: Mutex<HashMap<String, WalletTransaction>>,
    balances: Mutex<HashMap<Uuid, Money>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self {
            transactions: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_balance(&self, user_id: Uuid, balance: Money) {
        self.balances.lock().unwrap().insert(user_id, balance);
    }

    pub fn balance(&self, user_id: Uuid) -> Option<Money> {
        self.balances.lock().unwrap().get(&user_id).copied()
    }

    pub fn transaction(&self, payment_id: &str) -> Option<WalletTransaction> {
        self.transactions.lock().unwrap().get(payment_id).cloned()
    }
}

#[async_trait]
impl WalletStorePort for InMemoryWalletStore {
    async fn insert_transaction(&self, txn: &WalletTransaction) -> DomainResult<()> {
        self.transactions
            .lock()
            .unwrap()
            .insert(txn.payment_id.clone(), txn.clone());
        Ok(())
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> DomainResult<Option<WalletTransaction>> {
        Ok(self.transactions.lock().unwrap().get(payment_id).cloned())
    }

    async fn complete_topup(
        &self,
        txn: &WalletTransaction,
        trx_id: &str,
    ) -> DomainResult<Money> {
        let mut transactions = self.transactions.lock().unwrap();
        let stored = transactions
            .get_mut(&txn.payment_id)
            .ok_or_else(|| DomainError::PaymentNotFound(txn.payment_id.clone()))?;

        if stored.status != PaymentStatus::Pending {
            return Err(DomainError::AlreadyProcessed(txn.payment_id.clone()));
        }

        let mut balances = self.balances.lock().unwrap();
        let balance = balances
            .get_mut(&txn.user_id)
            .ok_or_else(|| DomainError::UserNotFound(txn.user_id.to_string()))?;
        *balance = *balance + txn.amount;
        let new_balance = *balance;

        stored.mark_completed(trx_id.to_string())?;
        stored.balance = Some(new_balance);
        Ok(new_balance)
    }

    async fn mark_failed(&self, txn: &WalletTransaction) -> DomainResult<bool> {
        let mut transactions = self.transactions.lock().unwrap();
        match transactions.get_mut(&txn.payment_id) {
            Some(stored) if stored.status == PaymentStatus::Pending => {
                *stored = txn.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::PaymentNotFound(txn.payment_id.clone())),
        }
    }
}

/// Notifier that records the events it sees.
pub struct RecordingNotifier {
    events: Mutex<Vec<OrderPlaced>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<OrderPlaced> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn order_placed(&self, event: &OrderPlaced) -> DomainResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
