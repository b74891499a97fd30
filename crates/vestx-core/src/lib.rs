pub mod account;
pub mod category;
pub mod constants;
pub mod error;
pub mod hash;
pub mod transaction;
pub mod types;
pub mod units;

pub use account::Account;
pub use category::Category;
pub use constants::*;
pub use error::VestxError;
pub use transaction::*;
pub use types::*;
