use serde::Serialize;

/// A plan from the built-in catalog. Prices are in dollars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub price: f64,
    pub features: &'static [&'static str],
}

pub static PLANS: [Plan; 3] = [
    Plan {
        id: "basic",
        name: "Basic Plan",
        price: 9.99,
        features: &["Basic features", "5GB storage", "Email support"],
    },
    Plan {
        id: "pro",
        name: "Pro Plan",
        price: 29.99,
        features: &[
            "All Basic features",
            "50GB storage",
            "Priority support",
            "Advanced analytics",
        ],
    },
    Plan {
        id: "enterprise",
        name: "Enterprise Plan",
        price: 99.99,
        features: &[
            "All Pro features",
            "Unlimited storage",
            "Phone support",
            "Custom integrations",
        ],
    },
];

pub fn find_plan(plan_id: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|plan| plan.id == plan_id)
}

pub fn plan_ids() -> Vec<&'static str> {
    PLANS.iter().map(|plan| plan.id).collect()
}
