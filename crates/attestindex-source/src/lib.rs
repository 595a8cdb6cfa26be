//! # attestindex-source
//!
//! Transaction sources for AttestIndex. Two ways into the pipeline:
//!
//! - [`ExplorerClient`] lists a contract's historical transactions through
//!   an Etherscan-compatible account API (backfill mode)
//! - [`BlockSubscription`] follows `newHeads` over WebSocket and resolves
//!   fresh blocks through the JSON-RPC provider (watch mode)
//!
//! Both produce `TransactionRef`s; [`ProviderClient`] then supplies calldata
//! and block timestamps during decoding, behind the [`TransactionFetcher`]
//! trait so tests can stub the node away.

pub mod explorer;
pub mod provider;
pub mod subscription;

pub use explorer::ExplorerClient;
pub use provider::{ProviderClient, TransactionFetcher, TxData};
pub use subscription::BlockSubscription;
