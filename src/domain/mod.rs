pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use entities::{CartItem, CartSnapshot, Order, Payment, WalletTransaction};
pub use errors::{DomainError, DomainResult};
pub use events::*;
pub use value_objects::{CallbackOutcome, FailureReason, Money, PaymentStatus, RedirectTarget};
