//! The request body shared by the create and update transaction endpoints.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    transaction::{Transaction, TransactionType, ValidatedTransaction},
};

/// The JSON body for creating or replacing a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The amount of money, must be greater than zero.
    pub amount: f64,
    /// Text detailing the transaction.
    pub description: String,
    /// When the transaction happened, e.g. "2024-03-01".
    pub date: Date,
    /// Either "income" or "expense".
    ///
    /// Kept as a string so an unknown type is reported as a validation error
    /// on the `type` field rather than a generic parse failure.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The category ID, defaults by type when absent or blank.
    #[serde(default)]
    pub category: Option<String>,
}

impl TransactionForm {
    /// Check the form and resolve the default category.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransactionType] for an unknown type, or any
    /// error from [crate::transaction::TransactionBuilder::validate].
    pub fn validate(self) -> Result<ValidatedTransaction, Error> {
        let transaction_type: TransactionType = self.transaction_type.trim().parse()?;

        Transaction::build(self.amount, self.date, &self.description, transaction_type)
            .category(self.category)
            .validate()
    }
}
