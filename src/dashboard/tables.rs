//! Table views for dashboard data display.
//!
//! Provides HTML tables for budget status, top categories and recent transactions.

use maud::{Markup, html};

use crate::{
    analytics::{BudgetHealth, BudgetStatus, CategoryTotal},
    category::resolve_category_name,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
    transaction::{Transaction, TransactionType},
};

const TABLE_STYLE: &str = "w-full text-sm text-left text-gray-500 dark:text-gray-400";
const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_YELLOW_STYLE: &str = "text-yellow-600 dark:text-yellow-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

fn health_style(health: BudgetHealth) -> &'static str {
    match health {
        BudgetHealth::Good => TABLE_CELL_GREEN_STYLE,
        BudgetHealth::Warning => TABLE_CELL_YELLOW_STYLE,
        BudgetHealth::Over => TABLE_CELL_RED_STYLE,
    }
}

fn health_label(health: BudgetHealth) -> &'static str {
    match health {
        BudgetHealth::Good => "Good",
        BudgetHealth::Warning => "Warning",
        BudgetHealth::Over => "Over",
    }
}

/// Renders this month's budgets in the order given, which should be most used first.
pub(super) fn budget_status_table(budget_analysis: &[BudgetStatus]) -> Markup {
    html! {
        div id="budget-status" class="w-full" {
            h3 class="text-xl font-semibold mb-4" { "Budgets This Month" }

            @if budget_analysis.is_empty() {
                p class="text-gray-600 dark:text-gray-400" {
                    "No budgets have been set for this month."
                }
            } @else {
                div class="overflow-x-auto rounded-lg shadow" {
                    table class=(TABLE_STYLE) {
                        thead class=(TABLE_HEADER_STYLE) {
                            tr {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Budget" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Spent" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Remaining" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Used" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            }
                        }
                        tbody {
                            @for status in budget_analysis {
                                tr class=(TABLE_ROW_STYLE) data-status=(health_label(status.status).to_lowercase()) {
                                    th scope="row" class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white"} {
                                        (status.category)
                                    }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(status.budget)) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(status.spent)) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(status.remaining)) }
                                    td class=(TABLE_CELL_STYLE) { (status.percentage_used) "%" }
                                    td class={(TABLE_CELL_STYLE) " font-semibold " (health_style(status.status))} {
                                        (health_label(status.status))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the largest category totals.
pub(super) fn top_categories_list(top_categories: &[CategoryTotal]) -> Markup {
    html! {
        div id="top-categories" class="w-full" {
            h3 class="text-xl font-semibold mb-4" { "Top Categories" }

            @if top_categories.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "Nothing to show yet." }
            } @else {
                ol class="space-y-2" {
                    @for (rank, entry) in top_categories.iter().enumerate() {
                        li class="flex justify-between bg-white dark:bg-gray-800 rounded-lg shadow p-3" {
                            span { (rank + 1) ". " (entry.category) }
                            span class="font-semibold" { (format_currency(entry.amount)) }
                        }
                    }
                }
            }
        }
    }
}

fn signed_amount(transaction: &Transaction) -> (f64, &'static str) {
    match transaction.transaction_type {
        TransactionType::Income => (transaction.amount, TABLE_CELL_GREEN_STYLE),
        TransactionType::Expense => (-transaction.amount, TABLE_CELL_RED_STYLE),
    }
}

/// Renders the newest transactions with income in green and expenses in red.
pub(super) fn recent_transactions_table(transactions: &[Transaction]) -> Markup {
    html! {
        div id="recent-transactions" class="w-full" {
            h3 class="text-xl font-semibold mb-4" { "Recent Transactions" }

            @if transactions.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No transactions yet." }
            } @else {
                div class="overflow-x-auto rounded-lg shadow" {
                    table class=(TABLE_STYLE) {
                        thead class=(TABLE_HEADER_STYLE) {
                            tr {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                            }
                        }
                        tbody {
                            @for transaction in transactions {
                                @let (amount, style) = signed_amount(transaction);
                                tr class=(TABLE_ROW_STYLE) {
                                    td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                    td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                    td class=(TABLE_CELL_STYLE) {
                                        (resolve_category_name(&transaction.category, transaction.transaction_type))
                                    }
                                    td class={(TABLE_CELL_STYLE) " text-right " (style)} {
                                        (format_currency(amount))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
