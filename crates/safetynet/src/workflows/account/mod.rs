//! Borrower account: profile, loans, quests, and the reward catalogue.

pub mod domain;
pub mod reducer;
pub mod router;
pub mod store;

pub use domain::{
    reward_catalogue, AccountState, Breakdown, Loan, LoanStatus, LoyaltyLevel, Quest, Reward,
    RiskLevel, UserProfile,
};
pub use reducer::{reduce, AccountEvent, Notification};
pub use router::account_router;
pub use store::{AccountStore, AccountView};
