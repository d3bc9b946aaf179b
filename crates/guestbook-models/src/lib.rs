#![deny(missing_docs)]

//! # Guestbook Models
//!
//! Core data types shared by the guestbook client, SDK and development
//! ledger.
//!
//! ## Data flow
//!
//! ```text
//! Address ──(wallet)──► ContractCall ──(ledger)──► OperationHandle ──► Confirmation
//!                                                                          │
//! ContractAddress ──(storage, Micheline)──► Vec<Entry> ◄───────────────────┘ refresh
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`address`] | Implicit and originated account addresses |
//! | [`amount`] | `Mutez` balances and display units |
//! | [`entry`] | Guestbook entries |
//! | [`micheline`] | Decoding / encoding of the contract storage |
//! | [`network`] | Target network description |
//! | [`operation`] | Contract calls, operation hashes and confirmations |

pub mod address;
pub mod amount;
pub mod entry;
pub mod error;
pub mod micheline;
pub mod network;
pub mod operation;

// Re-export all public types at crate root for convenience.
pub use address::*;
pub use amount::*;
pub use entry::*;
pub use error::*;
pub use network::*;
pub use operation::*;
