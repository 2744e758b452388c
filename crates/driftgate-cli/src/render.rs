//! Output rendering: JSON for machines, markdown for PR comments, and a
//! plain-text summary for terminals and logs.

use driftgate_core::{
    BucketAssessment, ChangeRecord, Evaluation, RiskBucket, Verdict,
};

const DEFAULT_COMMENT_TITLE: &str = "Deployment Risk Review";

/// Pretty-printed JSON of the full evaluation, diagnostics included.
pub fn render_json(evaluation: &Evaluation) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(evaluation)?)
}

// ---------------------------------------------------------------------------
// Markdown (PR comments)
// ---------------------------------------------------------------------------

/// Markdown suitable for posting as a pull request comment.
pub fn render_markdown(evaluation: &Evaluation, custom_title: Option<&str>) -> String {
    let mut lines: Vec<String> = Vec::new();
    let title = custom_title.unwrap_or(DEFAULT_COMMENT_TITLE);
    lines.push(format!("## {title}"));
    lines.push(String::new());

    if let Some(risk) = &evaluation.included.risk {
        lines.push("### Risk Assessment".to_string());
        lines.push(String::new());
        lines.push("| Risk Bucket | Risk Level | Key Concerns |".to_string());
        lines.push("|-------------|------------|--------------|".to_string());
        for bucket in RiskBucket::ORDER {
            match risk.bucket(bucket) {
                Some(assessment) => lines.push(format!(
                    "| {} | {} | {} |",
                    bucket.title(),
                    capitalize(&assessment.risk_level.to_string()),
                    escape_pipes(first_concern(assessment)),
                )),
                None => lines.push(format!(
                    "| {} | Not evaluated | No PR metadata provided |",
                    bucket.title()
                )),
            }
        }
        lines.push(String::new());
    }

    lines.push("### Resource Changes".to_string());
    lines.push(String::new());
    if evaluation.included.is_empty() {
        lines.push("_No substantive changes detected._".to_string());
    } else {
        lines.push("| # | Resource | Type | Action | Risk | Summary |".to_string());
        lines.push("|---|----------|------|--------|------|---------|".to_string());
        for (idx, record) in evaluation.included.records.iter().enumerate() {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} |",
                idx + 1,
                escape_pipes(&record.resource_name),
                escape_pipes(&record.resource_type),
                record.action,
                capitalize(record.risk_level.as_deref().unwrap_or("none")),
                escape_pipes(&record.summary),
            ));
        }
    }
    lines.push(String::new());

    if !evaluation.included.overall_summary.is_empty() {
        lines.push(format!(
            "**Summary:** {}",
            evaluation.included.overall_summary
        ));
        lines.push(String::new());
    }

    if !evaluation.excluded.is_empty() {
        lines.push(format!(
            "_{} change(s) excluded as noise or low-confidence reporting._",
            evaluation.excluded.len()
        ));
        lines.push(String::new());
    }

    push_markdown_verdict(&mut lines, &evaluation.verdict);

    lines.push("---".to_string());
    lines.push("*Generated by driftgate*".to_string());
    lines.join("\n")
}

fn push_markdown_verdict(lines: &mut Vec<String>, verdict: &Verdict) {
    let verdict_text = if verdict.safe { "✅ SAFE" } else { "❌ UNSAFE" };
    lines.push(format!("### Verdict: {verdict_text}"));
    lines.push(String::new());
    lines.push(format!(
        "**Overall Risk Level:** {}",
        capitalize(&verdict.overall_risk_level.to_string())
    ));
    if let Some(bucket) = verdict.highest_risk_bucket {
        lines.push(format!(
            "**Highest Risk Bucket:** {}",
            capitalize(&bucket.to_string())
        ));
    }
    if !verdict.reasoning.is_empty() {
        lines.push(format!("**Reasoning:** {}", verdict.reasoning));
    }
    lines.push(String::new());
}

// ---------------------------------------------------------------------------
// Plain-text summary
// ---------------------------------------------------------------------------

/// Terminal-friendly summary without markup.
pub fn render_summary(evaluation: &Evaluation) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(risk) = &evaluation.included.risk {
        lines.push("Risk assessment:".to_string());
        for bucket in RiskBucket::ORDER {
            match risk.bucket(bucket) {
                Some(assessment) => lines.push(format!(
                    "  {:<22} {:<8} {}",
                    bucket.title(),
                    capitalize(&assessment.risk_level.to_string()),
                    first_concern(assessment),
                )),
                None => lines.push(format!(
                    "  {:<22} {:<8} no PR metadata provided",
                    bucket.title(),
                    "-"
                )),
            }
        }
        lines.push(String::new());
    }

    if evaluation.included.is_empty() {
        lines.push("No substantive changes detected.".to_string());
    } else {
        lines.push(format!(
            "Changes ({} retained, {} excluded):",
            evaluation.included.len(),
            evaluation.excluded.len()
        ));
        for record in &evaluation.included.records {
            lines.push(format!("  {}", change_line(record)));
        }
    }
    lines.push(String::new());

    if !evaluation.included.overall_summary.is_empty() {
        lines.push(format!("Summary: {}", evaluation.included.overall_summary));
        lines.push(String::new());
    }

    let verdict = &evaluation.verdict;
    lines.push(format!(
        "Verdict: {}",
        if verdict.safe { "SAFE" } else { "UNSAFE" }
    ));
    lines.push(format!(
        "Overall risk level: {}",
        capitalize(&verdict.overall_risk_level.to_string())
    ));
    if let Some(bucket) = verdict.highest_risk_bucket {
        lines.push(format!("Highest risk bucket: {}", bucket.title()));
    }
    if !verdict.reasoning.is_empty() {
        lines.push(format!("Reasoning: {}", verdict.reasoning));
    }

    for diag in evaluation.diagnostics.warnings() {
        lines.push(format!("warning: {}", diag.message));
    }

    lines.join("\n")
}

fn change_line(record: &ChangeRecord) -> String {
    let risk = record
        .risk_level
        .as_deref()
        .map(capitalize)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{:<8}] {:<6} {} ({}) - {}",
        record.action, risk, record.resource_name, record.resource_type, record.summary
    )
}

fn first_concern(assessment: &BucketAssessment) -> &str {
    assessment
        .concerns
        .first()
        .map(String::as_str)
        .unwrap_or("None")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn escape_pipes(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftgate_core::{
        ChangeAction, ChangeRecord, ChangeSet, ConfidenceLevel, Diagnostics, RiskAssessment,
        RiskLevel, Verdict,
    };

    fn sample_evaluation(safe: bool) -> Evaluation {
        let record = ChangeRecord {
            resource_name: "app-service".to_string(),
            resource_type: "Microsoft.Web/sites".to_string(),
            action: ChangeAction::Modify,
            summary: "Scales out | adds a slot".to_string(),
            confidence: ConfidenceLevel::High,
            confidence_reason: None,
            risk_level: Some("medium".to_string()),
            risk_reason: None,
        };
        let mut included = ChangeSet::empty();
        included.records.push(record);
        included.overall_summary = "One app service modified".to_string();
        included.risk = Some(RiskAssessment {
            drift: BucketAssessment::placeholder("no drift"),
            intent: None,
            operations: BucketAssessment {
                risk_level: RiskLevel::Medium,
                concerns: vec!["slot swap during business hours".to_string()],
                reasoning: "swap risk".to_string(),
            },
        });
        Evaluation {
            evaluation_id: "test".to_string(),
            verdict: Verdict {
                safe,
                overall_risk_level: RiskLevel::Medium,
                highest_risk_bucket: Some(RiskBucket::Operations),
                reasoning: "operations risk within threshold".to_string(),
                failed_buckets: vec![],
            },
            included,
            excluded: ChangeSet::empty(),
            reclassified: false,
            diagnostics: Diagnostics::new(),
            completed_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_markdown_escapes_pipes_in_summary() {
        let markdown = render_markdown(&sample_evaluation(true), None);
        assert!(markdown.contains("Scales out \\| adds a slot"));
    }

    #[test]
    fn test_markdown_marks_unevaluated_intent_bucket() {
        let markdown = render_markdown(&sample_evaluation(true), None);
        assert!(markdown.contains("| PR Intent Alignment | Not evaluated |"));
        assert!(markdown.contains("### Verdict: ✅ SAFE"));
    }

    #[test]
    fn test_markdown_custom_title() {
        let markdown = render_markdown(&sample_evaluation(true), Some("Staging Review"));
        assert!(markdown.starts_with("## Staging Review"));
    }

    #[test]
    fn test_summary_reports_unsafe_verdict() {
        let text = render_summary(&sample_evaluation(false));
        assert!(text.contains("Verdict: UNSAFE"));
        assert!(text.contains("Highest risk bucket: Risky Operations"));
    }

    #[test]
    fn test_json_round_trips_evaluation() {
        let evaluation = sample_evaluation(true);
        let json = render_json(&evaluation).unwrap();
        let parsed: Evaluation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, evaluation);
    }
}
