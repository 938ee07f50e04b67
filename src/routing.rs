//! Application router configuration.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    analytics::get_analytics_endpoint,
    budget::{
        bulk_update_budgets_endpoint, create_budget_endpoint, delete_budget_endpoint,
        get_budgets_endpoint,
    },
    category::list_categories_endpoint,
    dashboard::{get_dashboard_page, update_dashboard_budgets_endpoint},
    endpoints,
    logging::logging_middleware,
    relay::live_updates_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(
            endpoints::DASHBOARD_BUDGETS,
            post(update_dashboard_budgets_endpoint),
        );

    let api_routes = Router::new()
        .route(endpoints::CATEGORIES_API, get(list_categories_endpoint))
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS_API,
            get(get_budgets_endpoint)
                .post(create_budget_endpoint)
                .put(bulk_update_budgets_endpoint),
        )
        .route(endpoints::BUDGET, delete(delete_budget_endpoint))
        .route(endpoints::ANALYTICS_API, get(get_analytics_endpoint))
        .route(endpoints::LIVE_UPDATES, get(live_updates_endpoint));

    page_routes
        .merge(api_routes)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
