//! Plain-text rendering of pipeline results for the terminal.

use std::fmt::Write;

use colored::Colorize;
use quill_app::{EvaluationSummary, RunSummary};
use quill_domain::{AgentTrace, DeliverableKind, IndexStats, PipelineState, SearchResult};
use quill_indexer::LoadReport;
use strum::IntoEnumIterator;

const RULE_WIDTH: usize = 60;
const INPUT_PREVIEW: usize = 100;
const MAX_ISSUES: usize = 5;

pub const EXAMPLE_TASKS: [&str; 4] = [
    "Summarize the top 5 risks mentioned across these project docs and propose mitigations",
    "Create a client update email from the latest weekly report doc",
    "Compare two approaches described in docs and recommend one with justification",
    "Extract all deadlines + owners from docs and format them into an action list",
];

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn heading(title: &str) -> String {
    format!("\n{}\n{}\n{}\n", rule(), title.bold(), rule())
}

fn percent(rate: Option<f64>) -> String {
    rate.map_or_else(|| "N/A".to_string(), |rate| format!("{:.1}%", rate * 100.0))
}

pub fn examples() -> String {
    let mut out = heading("QUILL RESEARCH ASSISTANT");
    out.push_str("\nExample tasks:\n");
    for (idx, task) in EXAMPLE_TASKS.iter().enumerate() {
        let _ = writeln!(out, "{}. {task}", idx + 1);
    }
    out
}

/// Resolves a menu answer: a number picks an example task, anything else is
/// taken as the task itself.
pub fn pick_task(answer: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    let example = answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| EXAMPLE_TASKS.get(idx));
    Some(example.map_or_else(|| answer.to_string(), |task| task.to_string()))
}

pub fn trace(trace: &AgentTrace) -> String {
    let mut out = heading("AGENT TRACE");
    for (idx, event) in trace.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {} Agent", idx + 1, event.agent.to_string().cyan());
        let _ = writeln!(out, "   Action: {}", event.action);
        if let Some(input) = &event.input {
            let preview: String = input.chars().take(INPUT_PREVIEW).collect();
            let _ = writeln!(out, "   Input: {preview}...");
        }
        if let Some(output) = &event.output {
            let _ = writeln!(out, "   Output: {output}");
        }
    }
    out
}

pub fn deliverable(state: &PipelineState) -> String {
    let mut out = heading("FINAL DELIVERABLE");
    out.push('\n');
    if !state.final_output.is_empty() && state.multi_outputs.is_empty() {
        out.push_str(&state.final_output);
    } else if !state.multi_outputs.is_empty() {
        if state.final_output.is_empty() {
            let _ = writeln!(out, "{}\n", "WARNING: Verification did not approve, but here are the drafts:".yellow());
        }
        for kind in DeliverableKind::iter() {
            if let Some(text) = state.multi_outputs.get(&kind) {
                let _ = writeln!(out, "{}\n{text}\n", kind.marker().bold());
            }
        }
    } else if !state.draft.is_empty() {
        let _ = writeln!(out, "{}\n", "WARNING: Verification did not approve, but here's the draft:".yellow());
        out.push_str(&state.draft);
    } else {
        out.push_str(&"ERROR: No output generated".red().to_string());
    }
    out.push('\n');

    out.push_str(&heading("SOURCES"));
    if state.citations.is_empty() {
        out.push_str("  No sources cited\n");
    } else {
        for citation in &state.citations {
            let _ = writeln!(out, "  - {citation}");
        }
    }
    out
}

pub fn verification(state: &PipelineState) -> Option<String> {
    let result = state.verification_result.as_ref()?;
    let mut out = heading("VERIFICATION RESULTS");
    let _ = writeln!(out, "Status: {}", result.status);
    let recommendation = if result.is_approved() {
        result.recommendation.to_string().green()
    } else {
        result.recommendation.to_string().red()
    };
    let _ = writeln!(out, "Recommendation: {recommendation}");
    if state.revisions > 0 {
        let _ = writeln!(out, "Revisions: {}", state.revisions);
    }
    if !state.issues_found.is_empty() {
        let _ = writeln!(out, "\nIssues found: {}", state.issues_found.len());
        for issue in state.issues_found.iter().take(MAX_ISSUES) {
            let _ = writeln!(out, "  - {issue}");
        }
    }
    out.push_str(&rule());
    out.push('\n');
    Some(out)
}

pub fn load_report(report: &LoadReport, stats: &IndexStats) -> String {
    let mut out = heading("INDEX");
    if report.already_loaded {
        out.push_str("Index already loaded\n");
    } else {
        let _ = writeln!(out, "Files indexed: {}", report.files_indexed);
        let _ = writeln!(out, "Chunks indexed: {}", report.chunks_indexed);
    }
    let _ = writeln!(out, "Documents: {} ({} chunks)", stats.total_documents, stats.total_chunks);
    for source in &stats.sources {
        let _ = writeln!(out, "  - {source}");
    }
    if !report.skipped.is_empty() {
        let _ = writeln!(out, "\n{}", format!("Skipped {} file(s):", report.skipped.len()).yellow());
        for skipped in &report.skipped {
            let _ = writeln!(out, "  - {}: {}", skipped.path.display(), skipped.reason);
        }
    }
    out
}

pub fn search_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = heading(&format!("RESULTS FOR \"{query}\""));
    if results.is_empty() {
        out.push_str("No documents found.\n");
    }
    for (idx, result) in results.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n{}. {} (chunk {}, distance {:.4})\n{}",
            idx + 1,
            result.source.cyan(),
            result.chunk_id,
            result.distance,
            result.text
        );
    }
    out
}

pub fn eval_summary(summary: &EvaluationSummary) -> String {
    let rate = |count: usize| (summary.total > 0).then(|| count as f64 / summary.total as f64);
    let mut out = heading("EVALUATION SUMMARY");
    let _ = writeln!(out, "Total tests: {}", summary.total);
    let _ = writeln!(
        out,
        "Passed verification: {}/{} ({})",
        summary.passed_verification,
        summary.total,
        percent(rate(summary.passed_verification))
    );
    let _ = writeln!(
        out,
        "With citations: {}/{} ({})",
        summary.with_citations,
        summary.total,
        percent(rate(summary.with_citations))
    );
    if summary.hallucination_checks > 0 {
        let _ = writeln!(
            out,
            "Hallucination tests passed: {}/{}",
            summary.correctly_declined, summary.hallucination_checks
        );
    }
    if summary.errors > 0 {
        let _ = writeln!(out, "{}", format!("Errors: {}", summary.errors).red());
    }
    out
}

pub fn run_summary(summary: &RunSummary) -> String {
    let mut out = heading("RUN HISTORY");
    let _ = writeln!(out, "Total requests: {}", summary.total_runs);
    let average = summary
        .average_duration
        .map_or_else(|| "N/A".to_string(), |secs| format!("{secs:.2}s"));
    let _ = writeln!(out, "Avg response time: {average}");
    let _ = writeln!(out, "Success rate: {}", percent(summary.success_rate));
    let _ = writeln!(out, "Citation rate: {}", percent(summary.citation_rate));
    let _ = writeln!(out, "Approval rate: {}", percent(summary.approval_rate));
    if !summary.agent_calls.is_empty() {
        out.push_str("\nAgent events:\n");
        for (agent, calls) in &summary.agent_calls {
            let _ = writeln!(out, "  - {agent}: {calls}");
        }
    }
    out
}
