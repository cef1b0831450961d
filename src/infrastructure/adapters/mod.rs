pub mod bkash_adapter;
pub mod mysql_checkout_store;
pub mod mysql_notifier;
pub mod mysql_wallet_store;

pub use bkash_adapter::BkashAdapter;
pub use mysql_checkout_store::MySqlCheckoutStore;
pub use mysql_notifier::MySqlNotifier;
pub use mysql_wallet_store::MySqlWalletStore;
