//! The form for setting this month's budgets from the dashboard.

use std::collections::BTreeMap;

use maud::{Markup, html};

use crate::{
    Error,
    analytics::Budgets,
    category::list_categories_by_type,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    transaction::TransactionType,
};

/// The budget form fields, category display name to the entered amount.
pub(super) type BudgetFormFields = BTreeMap<String, String>;

/// Convert the entered amounts to numbers. A blank field means no budget.
///
/// # Errors
/// Returns [Error::InvalidAmount] if a field is not a number.
pub(super) fn parse_budget_fields(fields: &BudgetFormFields) -> Result<Budgets, Error> {
    fields
        .iter()
        .map(|(category_name, amount)| {
            let amount = amount.trim();

            if amount.is_empty() {
                return Ok((category_name.clone(), 0.0));
            }

            amount
                .parse::<f64>()
                .map(|amount| (category_name.clone(), amount))
                .map_err(|_| Error::InvalidAmount(f64::NAN))
        })
        .collect()
}

/// The category names shown in the form: every expense category followed
/// by any other category that already has a budget.
fn editor_categories(budgets: &Budgets) -> Vec<String> {
    let mut names: Vec<String> = list_categories_by_type(TransactionType::Expense)
        .map(|category| category.name.to_owned())
        .collect();

    for name in budgets.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    names
}

/// Renders one number input per category, filled in with the current budget.
pub(super) fn budget_form_view(budgets: &Budgets) -> Markup {
    html! {
        section id="budget-editor" class="w-full mb-8" {
            h3 class="text-xl font-semibold mb-4" { "Set Budgets" }

            form
                hx-post=(endpoints::DASHBOARD_BUDGETS)
                hx-target-error="#alert-container"
                class="bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
            {
                p class="text-sm text-gray-600 dark:text-gray-400 mb-3" {
                    "Monthly limits for the current month. Leave a field blank or enter 0 to remove a budget."
                }

                div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-3 mb-4" {
                    @for (index, name) in editor_categories(budgets).iter().enumerate() {
                        @let input_id = format!("budget-{index}");
                        div {
                            label for=(input_id) class=(FORM_LABEL_STYLE) { (name) }

                            input
                                type="number"
                                id=(input_id)
                                name=(name)
                                min="0"
                                step="0.01"
                                placeholder="No budget"
                                value=[budgets.get(name)]
                                class=(FORM_TEXT_INPUT_STYLE);
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Budgets" }
            }
        }
    }
}

#[cfg(test)]
mod budget_form_tests {
    use scraper::{Html, Selector};

    use crate::{
        Error,
        analytics::Budgets,
        dashboard::budget_form::{BudgetFormFields, budget_form_view, parse_budget_fields},
    };

    #[test]
    fn blank_fields_mean_no_budget() {
        let fields = BudgetFormFields::from([
            ("Food & Dining".to_owned(), " 120.5 ".to_owned()),
            ("Travel".to_owned(), "".to_owned()),
        ]);

        let budgets = parse_budget_fields(&fields).unwrap();

        assert_eq!(
            budgets,
            Budgets::from([
                ("Food & Dining".to_owned(), 120.5),
                ("Travel".to_owned(), 0.0),
            ])
        );
    }

    #[test]
    fn rejects_non_numbers() {
        let fields = BudgetFormFields::from([("Travel".to_owned(), "lots".to_owned())]);

        let result = parse_budget_fields(&fields);

        assert!(matches!(result, Err(Error::InvalidAmount(_))), "got {result:?}");
    }

    #[test]
    fn form_has_an_input_per_expense_category_and_existing_budget() {
        let budgets = Budgets::from([
            ("Housing".to_owned(), 1500.0),
            ("Pets".to_owned(), 40.0),
        ]);

        let html = Html::parse_fragment(&budget_form_view(&budgets).into_string());

        let selector = Selector::parse("input[type='number']").unwrap();
        let inputs: Vec<_> = html.select(&selector).collect();
        assert_eq!(inputs.len(), 12);

        let housing = inputs
            .iter()
            .find(|input| input.value().attr("name") == Some("Housing"))
            .unwrap();
        let housing_value: f64 = housing.value().attr("value").unwrap().parse().unwrap();
        assert_eq!(housing_value, 1500.0);
        let travel = inputs
            .iter()
            .find(|input| input.value().attr("name") == Some("Travel"))
            .unwrap();
        assert_eq!(travel.value().attr("value"), None);
        assert!(
            inputs
                .iter()
                .any(|input| input.value().attr("name") == Some("Pets"))
        );
    }
}
