//! Underwriting decisions.
//!
//! # Data Flow
//! ```text
//! LoanApplication
//!     → evaluator.rs (bounded CreditGateway lookup)
//!     → decide() (score > threshold → Approved, else ManualReview)
//!     → UnderwritingDecision (stale data noted in reason)
//! ```
//!
//! # Design Decisions
//! - Missing data is an error, never a denial
//! - The rule is pure and total over the score

pub mod evaluator;
pub mod types;

pub use evaluator::{decide, UnderwritingEvaluator};
pub use types::{DecisionStatus, LoanApplication, UnderwritingDecision, UnderwritingError};
