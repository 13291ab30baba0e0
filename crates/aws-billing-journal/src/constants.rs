//! Catalog SKUs and AWS names the reconciliation depends on

/// Vendor external ids of the catalog items, one processor each
pub mod item_skus {
    pub const MARKETPLACE: &str = "AWS Marketplace";
    pub const USAGE: &str = "AWS Usage";
    pub const USAGE_INCENTIVATE: &str = "AWS Usage incentivate";
    pub const OTHER_SERVICES: &str = "AWS Other services";
    pub const SUPPORT: &str = "AWS Support";
    pub const SUPPORT_ENTERPRISE: &str = "AWS Support Enterprise";
    pub const SAVING_PLANS: &str = "Saving Plans Recurring Fee";
    pub const SAVING_PLANS_INCENTIVATE: &str = "Saving Plans Recurring Fee incentivate";
    pub const UPFRONT: &str = "Upfront";
    pub const UPFRONT_INCENTIVATE: &str = "Upfront incentivate";
}

/// Cost Explorer `RECORD_TYPE` values
pub mod record_types {
    pub const USAGE: &str = "Usage";
    pub const SUPPORT: &str = "Support";
    pub const REFUND: &str = "Refund";
    pub const SAVING_PLAN_RECURRING_FEE: &str = "SavingsPlanRecurringFee";
    pub const SOLUTION_PROVIDER_DISCOUNT: &str = "Solution Provider Program Discount";
    pub const RECURRING: &str = "Recurring";
    pub const TAX: &str = "Tax";
}

/// Service names with special handling
pub mod services {
    pub const TAX: &str = "Tax";
    pub const SAVINGS_PLANS_COMPUTE_USAGE: &str = "Savings Plans for AWS Compute usage";
}

/// `BILLING_ENTITY` value of marketplace charges
pub const MARKETPLACE_BILLING_ENTITY: &str = "AWS Marketplace";

/// Agreement statuses whose usage is billed
pub const BILLABLE_AGREEMENT_STATUSES: [&str; 2] = ["Active", "Updating"];
