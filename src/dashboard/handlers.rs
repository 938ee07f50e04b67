//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the dashboard and saving budgets from it
//! - HTML view functions for rendering the dashboard UI
//! - State used by the handlers

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    analytics::{AnalyticsQuery, AnalyticsSnapshot, Budgets, CategoryFilter, compute_analytics},
    budget::{BudgetPeriod, budget_limits, bulk_upsert_or_delete, get_budgets},
    dashboard::{
        budget_form::{BudgetFormFields, budget_form_view, parse_budget_fields},
        cards::summary_cards_view,
        charts::{
            DashboardChart, category_chart, charts_script, charts_view, monthly_expenses_chart,
        },
        tables::{budget_status_table, recent_transactions_table, top_categories_list},
    },
    endpoints,
    html::{ECHARTS_URL, HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    timezone::local_today,
    transaction::{TransactionOrder, list_transactions},
};

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions and managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    snapshot: AnalyticsSnapshot,
    budgets: Budgets,
    filter: CategoryFilter,
    charts: [DashboardChart; 2],
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return Error::from(rejection).into_page_response(),
    };

    match build_dashboard_data(&state, query) {
        Ok(data) => dashboard_view(&data).into_response(),
        Err(error) => {
            tracing::warn!("could not render the dashboard: {error}");
            error.into_page_response()
        }
    }
}

/// Save the budgets entered on the dashboard for the current month.
///
/// Blank or zero amounts remove the budget for that category.
pub async fn update_dashboard_budgets_endpoint(
    State(state): State<DashboardState>,
    Form(fields): Form<BudgetFormFields>,
) -> Response {
    let entries = match parse_budget_fields(&fields) {
        Ok(entries) => entries,
        Err(error) => return error.into_alert_response(),
    };

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match bulk_upsert_or_delete(BudgetPeriod::containing(today), &entries, &connection) {
        Ok(result) => {
            tracing::info!(
                "saved {} and removed {} budgets from the dashboard",
                result.total_updated,
                result.total_deleted
            );

            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not save budgets: {error}");
            error.into_alert_response()
        }
    }
}

/// Fetches and builds all data needed for the dashboard display.
///
/// # Errors
/// Returns error if the filter or timezone is invalid or if database queries fail.
fn build_dashboard_data(
    state: &DashboardState,
    query: AnalyticsQuery,
) -> Result<DashboardData, Error> {
    let today = local_today(&state.local_timezone)?;
    let options = query.into_options(today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = list_transactions(TransactionOrder::NewestDate, None, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let budgets = get_budgets(BudgetPeriod::containing(today), &connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;
    let budgets = budget_limits(&budgets);

    let snapshot = compute_analytics(&transactions, &budgets, &options);
    let charts = [
        DashboardChart {
            id: "monthly-expenses-chart",
            options: monthly_expenses_chart(&snapshot.monthly_series, options.year).to_string(),
        },
        DashboardChart {
            id: "categories-chart",
            options: category_chart(&snapshot.category_totals).to_string(),
        },
    ];

    Ok(DashboardData {
        snapshot,
        budgets,
        filter: options.filter,
        charts,
    })
}

/// Reloads the page when another session changes a transaction.
/// How long the page waits before reloading after its live connection closes.
const RECONNECT_DELAY_MS: u32 = 3000;

/// Reloads the page whenever the data it shows may be stale: on every update,
/// on a snapshot sent after missed events, and shortly after the connection drops.
fn live_updates_script() -> HeadElement {
    let script = format!(
        r#"(function() {{
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            const socket = new WebSocket(`${{protocol}}//${{window.location.host}}{}`);
            let seenSnapshot = false;
            socket.addEventListener('message', (event) => {{
                const message = JSON.parse(event.data);
                if (message.kind === 'snapshot' && !seenSnapshot) {{
                    seenSnapshot = true;
                    return;
                }}
                window.location.reload();
            }});
            socket.addEventListener('close', () => {{
                setTimeout(() => window.location.reload(), {});
            }});
        }})();"#,
        endpoints::LIVE_UPDATES,
        RECONNECT_DELAY_MS
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

fn filter_links(selected: CategoryFilter) -> Markup {
    let options = [
        (CategoryFilter::All, "all", "All"),
        (CategoryFilter::Income, "income", "Income"),
        (CategoryFilter::Expense, "expense", "Expenses"),
    ];

    html! {
        nav id="category-filter" class="flex gap-4 mb-4 text-sm" {
            span class="text-gray-600 dark:text-gray-400" { "Categories:" }

            @for (filter, value, label) in options {
                @if filter == selected {
                    span class="font-semibold" aria-current="true" { (label) }
                } @else {
                    a
                        href={(endpoints::DASHBOARD_VIEW) "?filter=" (value)}
                        class=(LINK_STYLE)
                    {
                        (label)
                    }
                }
            }
        }
    }
}

/// Renders the dashboard page with cards, charts, tables and the budget form.
fn dashboard_view(data: &DashboardData) -> Markup {
    let snapshot = &data.snapshot;

    let content = html!(
        div
            id="dashboard-content"
            class={(PAGE_CONTAINER_STYLE) " max-w-screen-xl"}
        {
            h2 class="text-2xl font-bold mb-6 self-start" { "Dashboard" }

            (summary_cards_view(snapshot))

            @if snapshot.transaction_count == 0 {
                div id="no-data" class="mb-8"
                {
                    h3 class="text-xl font-bold" { "Nothing here yet..." }

                    p
                    {
                        "Charts will show up here once you add some transactions via "
                        code { "POST " (endpoints::TRANSACTIONS_API) }
                        "."
                    }
                }
            } @else {
                div class="w-full" {
                    (filter_links(data.filter))
                    (charts_view(&data.charts))
                }
            }

            div class="grid grid-cols-1 xl:grid-cols-2 gap-8 w-full mb-8"
            {
                (budget_status_table(&snapshot.budget_analysis))
                (top_categories_list(&snapshot.top_categories))
            }

            div class="w-full mb-8" {
                (recent_transactions_table(&snapshot.recent_transactions))
            }

            (budget_form_view(&data.budgets))
        }
    );

    let mut head_elements = vec![live_updates_script()];

    if snapshot.transaction_count > 0 {
        head_elements.push(HeadElement::ScriptLink(ECHARTS_URL.to_owned()));
        head_elements.push(charts_script(&data.charts));
    }

    base("Dashboard", &head_elements, &content)
}
