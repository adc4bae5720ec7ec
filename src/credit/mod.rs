//! Credit bureau integration.
//!
//! # Data Flow
//! ```text
//! CreditGateway
//!     → source.rs (CreditSource trait, FetchError)
//!     → http.rs (reqwest client with per-call timeout)
//!     → types.rs (CreditReport, SubjectKey, CreditError)
//! ```
//!
//! # Security Constraints
//! - Subject keys are masked whenever they are displayed or logged
//! - Every upstream call carries a finite deadline

pub mod http;
pub mod source;
pub mod types;

pub use http::HttpCreditSource;
pub use source::{CreditSource, FetchError};
pub use types::{CreditError, CreditLookup, CreditReport, CreditResult, Freshness, SubjectKey};
