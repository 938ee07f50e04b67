//! Summary cards for the headline numbers of the analytics snapshot.

use maud::{Markup, html};

use crate::{analytics::AnalyticsSnapshot, html::format_currency};

const TEXT_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TEXT_RED_STYLE: &str = "text-red-600 dark:text-red-400";
const TEXT_NEUTRAL_STYLE: &str = "text-gray-900 dark:text-white";

struct SummaryCard {
    id: &'static str,
    label: &'static str,
    value: String,
    detail: Option<String>,
    tone: &'static str,
}

/// Formats a percentage value, avoiding "-0%" display.
fn format_percentage(value: f64) -> String {
    let rounded = value.round();
    if rounded.abs() < 0.5 {
        "0%".to_string()
    } else {
        format!("{:.0}%", rounded)
    }
}

fn sign_tone(amount: f64) -> &'static str {
    if amount >= 0.0 {
        TEXT_GREEN_STYLE
    } else {
        TEXT_RED_STYLE
    }
}

fn build_cards(snapshot: &AnalyticsSnapshot) -> [SummaryCard; 5] {
    let utilization_tone = if snapshot.total_budget == 0.0 {
        TEXT_NEUTRAL_STYLE
    } else if snapshot.budget_utilization > 100.0 {
        TEXT_RED_STYLE
    } else {
        TEXT_GREEN_STYLE
    };

    [
        SummaryCard {
            id: "total-income",
            label: "Income",
            value: format_currency(snapshot.total_income),
            detail: Some(format!(
                "{} this month",
                format_currency(snapshot.monthly_income)
            )),
            tone: TEXT_GREEN_STYLE,
        },
        SummaryCard {
            id: "total-expenses",
            label: "Expenses",
            value: format_currency(snapshot.total_expenses),
            detail: Some(format!(
                "{} this month",
                format_currency(snapshot.monthly_expenses)
            )),
            tone: TEXT_RED_STYLE,
        },
        SummaryCard {
            id: "net-balance",
            label: "Net Balance",
            value: format_currency(snapshot.net_balance),
            detail: None,
            tone: sign_tone(snapshot.net_balance),
        },
        SummaryCard {
            id: "savings-rate",
            label: "Savings Rate",
            value: format_percentage(snapshot.savings_rate),
            detail: None,
            tone: sign_tone(snapshot.savings_rate),
        },
        SummaryCard {
            id: "budget-utilization",
            label: "Budget Used",
            value: format_percentage(snapshot.budget_utilization),
            detail: Some(format!(
                "{} of {}",
                format_currency(snapshot.total_spent),
                format_currency(snapshot.total_budget)
            )),
            tone: utilization_tone,
        },
    ]
}

/// Renders the row of summary cards.
pub(super) fn summary_cards_view(snapshot: &AnalyticsSnapshot) -> Markup {
    let cards = build_cards(snapshot);

    html! {
        section
            id="summary"
            class="w-full mx-auto mb-8 grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-5 gap-4"
        {
            @for card in &cards {
                div
                    id=(card.id)
                    class="bg-white dark:bg-gray-800 border border-gray-200
                        dark:border-gray-700 rounded-lg p-4 shadow-md"
                {
                    h4 class="text-sm text-gray-600 dark:text-gray-400 mb-1" { (card.label) }

                    p class={"summary-value text-2xl font-bold " (card.tone)} { (card.value) }

                    @if let Some(detail) = &card.detail {
                        p class="text-xs text-gray-500 dark:text-gray-400 mt-1" { (detail) }
                    }
                }
            }
        }
    }
}
