pub mod adapters;
pub mod config;

pub use adapters::{BkashAdapter, MySqlCheckoutStore, MySqlNotifier, MySqlWalletStore};
pub use config::BkashConfig;
