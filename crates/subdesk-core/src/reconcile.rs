//! Plan templates vs company subscriptions
//!
//! The vendor exposes the catalog of plans and the subscriptions of a company
//! as two unrelated listings. `reconcile` joins them into one per-company view;
//! `merge_subscription`, `apply_update` and `set_status` apply write results locally so the view
//! stays current when the server acknowledges without returning the object.

use crate::models::{CompanySubscription, Plan, SubscriptionStatus, SubscriptionUpdate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A catalog plan and the company's subscription to it, if any.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanAssignment {
    pub plan: Plan,
    pub subscription: Option<CompanySubscription>,
}

/// Everything a company is (or could be) subscribed to.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompanyOverview {
    pub company_id: String,
    pub assignments: Vec<PlanAssignment>,
    /// Subscriptions whose plan is not in the catalog.
    pub orphaned: Vec<CompanySubscription>,
}

/// Which of two subscriptions to the same plan represents it.
fn preferred(a: &CompanySubscription, b: &CompanySubscription) -> Ordering {
    match (a.status.is_active(), b.status.is_active()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.valid_to.cmp(&b.valid_to),
    }
}

/// Join `plans` with the subscriptions of `company_id`.
pub fn reconcile(
    plans: Vec<Plan>,
    subscriptions: Vec<CompanySubscription>,
    company_id: &str,
) -> CompanyOverview {
    let mut by_plan: HashMap<String, CompanySubscription> = HashMap::new();
    let mut orphaned = Vec::new();

    {
        let known: HashSet<&str> = plans.iter().map(|p| p.id.as_str()).collect();

        for sub in subscriptions.into_iter().filter(|s| s.belongs_to(company_id)) {
            if !known.contains(sub.plan_id.as_str()) {
                orphaned.push(sub);
                continue;
            }
            let replace = by_plan
                .get(&sub.plan_id)
                .map_or(true, |current| preferred(current, &sub) == Ordering::Less);
            if replace {
                by_plan.insert(sub.plan_id.clone(), sub);
            }
        }
    }

    let mut assignments: Vec<PlanAssignment> = plans
        .into_iter()
        .map(|plan| {
            let subscription = by_plan.remove(&plan.id);
            PlanAssignment { plan, subscription }
        })
        .collect();
    assignments.sort_by_key(|a| a.plan.display_name.to_lowercase());

    CompanyOverview {
        company_id: company_id.to_string(),
        assignments,
        orphaned,
    }
}

impl CompanyOverview {
    /// Assignments the company currently holds.
    pub fn active(&self) -> impl Iterator<Item = &PlanAssignment> {
        self.assignments.iter().filter(|a| {
            a.subscription
                .as_ref()
                .is_some_and(|s| s.status.is_active())
        })
    }

    /// Apply a subscription returned by a write call.
    ///
    /// Replaces the entry with the same id, else attaches it to its plan, else
    /// records it as orphaned. A real subscription replaces a local placeholder
    /// for the same plan.
    pub fn merge_subscription(&mut self, sub: CompanySubscription) {
        if let Some(existing) = self.find_mut(&sub.id) {
            *existing = sub;
            return;
        }

        if let Some(assignment) = self
            .assignments
            .iter_mut()
            .find(|a| a.plan.id == sub.plan_id)
        {
            assignment.subscription = Some(sub);
            return;
        }

        self.orphaned.push(sub);
    }

    /// Set the status of a known subscription. Returns false when the id is
    /// not part of this overview.
    pub fn set_status(&mut self, subscription_id: &str, status: SubscriptionStatus) -> bool {
        match self.find_mut(subscription_id) {
            Some(sub) => {
                sub.status = status;
                true
            }
            None => false,
        }
    }

    /// Apply the fields a write echoed back to a known subscription. Returns
    /// false when the id is not part of this overview.
    pub fn apply_update(&mut self, subscription_id: &str, update: &SubscriptionUpdate) -> bool {
        match self.find_mut(subscription_id) {
            Some(sub) => {
                sub.apply(update);
                true
            }
            None => false,
        }
    }

    fn find_mut(&mut self, subscription_id: &str) -> Option<&mut CompanySubscription> {
        self.assignments
            .iter_mut()
            .filter_map(|a| a.subscription.as_mut())
            .chain(self.orphaned.iter_mut())
            .find(|s| s.id == subscription_id)
    }
}
