//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for validating new transactions
//! - Database functions for storing, querying, and aggregating transactions
//! - JSON route handlers that publish a relay event after each change

mod core;
mod create_endpoint;
mod delete_endpoint;
mod form;
mod get_endpoint;
mod state;
mod update_endpoint;

pub use core::{
    GroupSum, MAX_DESCRIPTION_LENGTH, SumFilter, SumGroup, Transaction, TransactionBuilder,
    TransactionOrder, TransactionType, ValidatedTransaction, aggregate_sums, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, list_transactions,
    map_transaction_row, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use form::TransactionForm;
pub use get_endpoint::{DEFAULT_LIST_LIMIT, get_transaction_endpoint, list_transactions_endpoint};
pub use state::TransactionState;
pub use update_endpoint::update_transaction_endpoint;

#[cfg(test)]
pub use core::count_transactions;
