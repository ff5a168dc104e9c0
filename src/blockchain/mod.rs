//! Rootstock integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private keys, mnemonic, RPC URL)
//!     → wallet.rs (in-memory keystore, signing keys)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → transaction.rs (build, sign, broadcast, confirm)
//!     → contracts.rs / tokens.rs (ABI encoding, ERC20/ERC721 reads)
//! ```
//!
//! # Security Constraints
//! - Keys only come from the environment or explicit tool calls
//! - Never log private keys or mnemonics
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the node is unreachable

pub mod client;
pub mod contracts;
pub mod tokens;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

pub use client::RootstockClient;
pub use transaction::{ConfirmationStatus, GasOverrides, TxBuilder};
pub use types::{BlockchainError, BlockchainResult, ChainId, NetworkConfig};
pub use wallet::WalletManager;
