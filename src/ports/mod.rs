pub mod bkash_port;
pub mod checkout_store_port;
pub mod notification_port;
pub mod wallet_store_port;

pub use bkash_port::BkashPort;
pub use checkout_store_port::CheckoutStorePort;
pub use notification_port::NotificationPort;
pub use wallet_store_port::WalletStorePort;
