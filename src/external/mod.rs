pub mod payout;

pub use payout::{BankAccount, PayoutGateway, PayoutStatus};
