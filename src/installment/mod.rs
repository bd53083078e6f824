//! Installment purchases: a total price split into monthly ledger entries.

mod expander;
mod plan;

pub use expander::{Installment, expand};
pub use plan::{
    InstallmentPlan, InstallmentPlanId, MIN_INSTALLMENTS, NewInstallmentPlan,
    create_installment_plan, create_installment_plan_table, delete_installment_plan,
    get_installment_plan, get_plan_installments, list_installment_plans,
    update_installment_plan,
};
