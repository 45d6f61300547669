//! Table rendering for the `--format table` output.

use crate::truncate_string;
use chrono::{DateTime, Utc};
use subdesk_api_client::api::SubscriptionOutcome;
use subdesk_api_client::probe::{ProbeOutcome, ProbeReport, QuickTestReport};
use subdesk_core::models::{Company, CompanySubscription, Plan, ResourceMatch};
use subdesk_core::reconcile::CompanyOverview;
use std::fmt::Write;

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn remaining(sub: &CompanySubscription, now: DateTime<Utc>) -> String {
    match sub.days_remaining(now) {
        Some(days) if days < 0 => "expired".to_string(),
        Some(days) => format!("{} days", days),
        None => "-".to_string(),
    }
}

pub fn render_company(company: &Company) -> String {
    format!("Company: {}\nID:      {}\n", company.name, company.id)
}

pub fn render_plans(plans: &[Plan]) -> String {
    if plans.is_empty() {
        return "No subscription plans found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36} {:<32} {:<10} {:>9}",
        "ID", "NAME", "STATUS", "RESOURCES"
    );
    let _ = writeln!(out, "{}", "-".repeat(90));
    for plan in plans {
        let _ = writeln!(
            out,
            "{:<36} {:<32} {:<10} {:>9}",
            truncate_string(&plan.id, 36),
            truncate_string(&plan.display_name, 32),
            plan.status.as_ref().map(|s| s.as_str()).unwrap_or("-"),
            plan.resources.len()
        );
    }
    let _ = writeln!(out, "\nTotal: {} plan(s)", plans.len());
    out
}

pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan:        {}", plan.display_name);
    let _ = writeln!(out, "ID:          {}", plan.id);
    if let Some(description) = &plan.description {
        let _ = writeln!(out, "Description: {}", description);
    }
    if let Some(status) = &plan.status {
        let _ = writeln!(out, "Status:      {}", status);
    }
    if plan.resources.is_empty() {
        let _ = writeln!(out, "Resources:   none");
    } else {
        let _ = writeln!(out, "Resources:");
        for resource in &plan.resources {
            let _ = writeln!(
                out,
                "  {:<6} {:<36} {}",
                resource.resource_type.as_str(),
                resource.origin_id,
                resource.features.join(", ")
            );
        }
    }
    out
}

pub fn render_resources(matches: &[ResourceMatch]) -> String {
    if matches.is_empty() {
        return "No resources found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:<36} {}", "TYPE", "ID", "NAME");
    let _ = writeln!(out, "{}", "-".repeat(80));
    for m in matches {
        let _ = writeln!(
            out,
            "{:<6} {:<36} {}",
            m.resource_type.as_str(),
            truncate_string(&m.id, 36),
            m.name
        );
    }
    out
}

pub fn render_subscriptions(subs: &[CompanySubscription], now: DateTime<Utc>) -> String {
    if subs.is_empty() {
        return "No subscriptions found for this company.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36} {:<36} {:<10} {:<10} {:>10}",
        "ID", "PLAN", "STATUS", "VALID TO", "REMAINING"
    );
    let _ = writeln!(out, "{}", "-".repeat(106));
    for sub in subs {
        let _ = writeln!(
            out,
            "{:<36} {:<36} {:<10} {:<10} {:>10}",
            truncate_string(&sub.id, 36),
            truncate_string(sub.display_name.as_deref().unwrap_or(&sub.plan_id), 36),
            sub.status.as_str(),
            date(sub.valid_to),
            remaining(sub, now)
        );
    }
    out
}

pub fn render_overview(overview: &CompanyOverview, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Company: {}\n", overview.company_id);
    let _ = writeln!(
        out,
        "{:<32} {:<36} {:<10} {:>10}",
        "PLAN", "SUBSCRIPTION", "STATUS", "REMAINING"
    );
    let _ = writeln!(out, "{}", "-".repeat(91));

    for assignment in &overview.assignments {
        let name = truncate_string(&assignment.plan.display_name, 32);
        match &assignment.subscription {
            Some(sub) => {
                let _ = writeln!(
                    out,
                    "{:<32} {:<36} {:<10} {:>10}",
                    name,
                    truncate_string(&sub.id, 36),
                    sub.status.as_str(),
                    remaining(sub, now)
                );
            }
            None => {
                let _ = writeln!(out, "{:<32} {:<36} {:<10} {:>10}", name, "-", "none", "-");
            }
        }
    }

    if !overview.orphaned.is_empty() {
        let _ = writeln!(out, "\nSubscriptions without a known plan:");
        for sub in &overview.orphaned {
            let _ = writeln!(
                out,
                "  {} (plan {}) {}",
                sub.id,
                sub.plan_id,
                sub.status.as_str()
            );
        }
    }

    let _ = writeln!(
        out,
        "\nActive: {} of {} plan(s)",
        overview.active().count(),
        overview.assignments.len()
    );
    out
}

pub fn render_outcome(outcome: &SubscriptionOutcome) -> String {
    let valid_to = outcome
        .subscription
        .valid_to
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Subscription created (plan {}).\n{}\nStatus: {}, valid until {}\n",
        outcome.plan_id,
        outcome.summary,
        outcome.subscription.status.as_str(),
        valid_to
    )
}

pub fn render_probe_report(report: &ProbeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "SUMMARY: {} endpoint(s) probed", report.total());
    let _ = writeln!(out, "{}", "=".repeat(60));

    if !report.working.is_empty() {
        let _ = writeln!(out, "\nWorking endpoints ({}):", report.working.len());
        for result in &report.working {
            let _ = write!(out, "  {}", result.endpoint);
            if let ProbeOutcome::Success { shape, .. } = &result.outcome {
                match (shape.length, shape.plans_length) {
                    (Some(len), _) => {
                        let _ = write!(out, "  (array of {})", len);
                    }
                    (None, Some(plans)) => {
                        let _ = write!(out, "  (object, {} plans)", plans);
                    }
                    (None, None) => {
                        let _ = write!(out, "  (object: {})", shape.keys.join(", "));
                    }
                }
            }
            let _ = writeln!(out);
        }
    }

    if !report.failed.is_empty() {
        let _ = writeln!(out, "\nFailed endpoints ({}):", report.failed.len());
        for result in &report.failed {
            let _ = writeln!(
                out,
                "  {} - {}",
                result.endpoint,
                result.failure_reason().unwrap_or_default()
            );
        }
    }
    out
}

pub fn render_quick_test(report: &QuickTestReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "GET {}", report.endpoint);
    let _ = writeln!(out, "Status: {}", report.status);
    let _ = writeln!(out, "Headers:");
    for (name, value) in &report.headers {
        let _ = writeln!(out, "  {}: {}", name, value);
    }
    if let Some(shape) = &report.shape {
        let _ = writeln!(
            out,
            "Response: {} with keys [{}]",
            if shape.is_array { "array" } else { "object" },
            shape.keys.join(", ")
        );
        if !shape.first_item_keys.is_empty() {
            let _ = writeln!(out, "First item keys: [{}]", shape.first_item_keys.join(", "));
        }
    }
    if let Some(preview) = &report.body_preview {
        let _ = writeln!(out, "Body: {}", preview);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use subdesk_api_client::probe::{ProbeResult, ResponseShape};
    use subdesk_core::reconcile::reconcile;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap()
    }

    #[test]
    fn empty_plans_message() {
        assert_eq!(render_plans(&[]), "No subscription plans found.\n");
    }

    #[test]
    fn plans_table_lists_each_plan() {
        let plans: Vec<Plan> = serde_json::from_value(json!([
            {"id": "p-1", "displayName": "Hull survey", "status": 1},
            {"id": "p-2", "displayName": "Anchor check"}
        ]))
        .unwrap();
        let table = render_plans(&plans);
        assert!(table.contains("Hull survey"));
        assert!(table.contains("Active"));
        assert!(table.ends_with("Total: 2 plan(s)\n"));
    }

    #[test]
    fn overview_shows_remaining_days_and_orphans() {
        let plans: Vec<Plan> =
            serde_json::from_value(json!([{"id": "p-1", "displayName": "Hull survey"}])).unwrap();
        let subs: Vec<CompanySubscription> = serde_json::from_value(json!([
            {"id": "s-1", "planId": "p-1", "status": 1, "validTo": "2026-10-26T00:00:00Z"},
            {"id": "s-2", "planId": "p-x", "status": 3}
        ]))
        .unwrap();
        let overview = reconcile(plans, subs, "c-1");

        let text = render_overview(&overview, now());
        assert!(text.contains("10 days"));
        assert!(text.contains("s-2 (plan p-x) Expired"));
        assert!(text.contains("Active: 1 of 1 plan(s)"));
    }

    #[test]
    fn probe_report_lists_working_and_failed() {
        let mut report = ProbeReport::default();
        report.push(ProbeResult {
            endpoint: "/api/v3/environment/marinestream/subscriptions".to_string(),
            outcome: ProbeOutcome::Success {
                status: 200,
                shape: ResponseShape::of(&json!([{"id": 1}, {"id": 2}])),
            },
        });
        report.push(ProbeResult {
            endpoint: "/subscriptions".to_string(),
            outcome: ProbeOutcome::Failed {
                status: 404,
                body_preview: "Not Found".to_string(),
            },
        });

        let text = render_probe_report(&report);
        assert!(text.contains("Working endpoints (1):"));
        assert!(text.contains("(array of 2)"));
        assert!(text.contains("/subscriptions - 404"));
    }
}
