//! The URIs of the pages and API routes.
//!
//! For routes that take a parameter, e.g. '/api/budgets/{budget_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The dashboard page.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route the dashboard budget editor posts to.
pub const DASHBOARD_BUDGETS: &str = "/dashboard/budgets";

/// The route for listing the category taxonomy.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to get, update and delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list, create and bulk update budgets.
pub const BUDGETS_API: &str = "/api/budgets";
/// The route to delete a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for the analytics snapshot.
pub const ANALYTICS_API: &str = "/api/analytics";
/// The WebSocket route for live dashboard updates.
pub const LIVE_UPDATES: &str = "/api/ws";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with the next right brace,
/// e.g. '{budget_id}' in '/api/budgets/{budget_id}'. Only the first parameter
/// is replaced. If there is no parameter, `endpoint_path` is returned as is.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map(|offset| start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}
