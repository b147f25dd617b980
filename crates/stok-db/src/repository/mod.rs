//! # Repository Implementations
//!
//! One repository per concern:
//!
//! - [`article`] - Article CRUD, search and the aggregation queries
//!   (low stock, ranking, mass tax/margin updates)
//! - [`lookup`] - Brands, suppliers and categories
//! - [`config`] - Key-value configuration and typed [`stok_core::StoreSettings`]
//! - [`stock`] - The stock ledger: serialized entry/exit transactions
//!   and the movement history
//!
//! Repositories are cheap handles over a pool clone, created per call
//! through the [`crate::Store`] accessors so a closed store fails fast.

pub mod article;
pub mod config;
pub mod lookup;
pub mod stock;
