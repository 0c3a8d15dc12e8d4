pub mod common;
pub mod earning;
pub mod event;
pub mod pagination;
pub mod referral;
pub mod user;
pub mod withdrawal;

pub use common::*;
pub use earning::*;
pub use event::*;
pub use pagination::*;
pub use referral::*;
pub use user::*;
pub use withdrawal::*;
