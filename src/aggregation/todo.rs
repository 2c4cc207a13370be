//! Next-stage TODO generation

use serde_json::Value;

use crate::catalog::WorkerCategory;

use super::types::{Severity, StageSummary, TodoItem, TodoKind, TodoPriority, WorkerOutput};

/// Owner of corrective work no route claims
pub const DEFAULT_RESOLVER: &str = "backend-architect";

/// Owner of divergence decisions
pub const DECISION_OWNER: &str = "system-architect";

struct Template {
    task: &'static str,
    priority: TodoPriority,
    worker: &'static str,
}

const fn t(task: &'static str, priority: TodoPriority, worker: &'static str) -> Template {
    Template {
        task,
        priority,
        worker,
    }
}

const AFTER_DESIGN: &[Template] = &[
    t("Implement core components from the agreed design", TodoPriority::High, "backend-architect"),
    t("Set up project structure and dependencies", TodoPriority::Medium, "fullstack-developer"),
    t("Write unit tests alongside the implementation", TodoPriority::Medium, "test-engineer"),
];

const AFTER_IMPLEMENTATION: &[Template] = &[
    t("Run the full test suite and report coverage", TodoPriority::High, "test-engineer"),
    t("Review the changes for correctness and maintainability", TodoPriority::High, "code-reviewer"),
    t("Profile hot paths introduced by the change", TodoPriority::Low, "performance-engineer"),
];

const AFTER_QUALITY: &[Template] = &[
    t("Prepare the deployment pipeline", TodoPriority::High, "devops-engineer"),
    t("Configure monitoring and alerting", TodoPriority::Medium, "sre-engineer"),
];

const AFTER_DEPLOYMENT: &[Template] = &[
    t("Document the deployment and rollback procedure", TodoPriority::Medium, "technical-writer"),
    t("Update user-facing documentation", TodoPriority::Low, "technical-writer"),
];

/// Data keys that add work when any worker reports them
const MARKERS: &[(&str, Template)] = &[
    ("api_spec", t("Implement endpoints against the API specification", TodoPriority::High, "backend-architect")),
    ("database_schema", t("Create migrations for the database schema", TodoPriority::High, "database-specialist")),
    ("ui_mockups", t("Build UI components from the mockups", TodoPriority::Medium, "frontend-developer")),
    ("security_sensitive", t("Review the security-sensitive changes", TodoPriority::High, "security-auditor")),
    ("performance_baseline", t("Compare performance against the recorded baseline", TodoPriority::Medium, "performance-engineer")),
];

/// Issue keywords and the worker that resolves them, first match wins
const RESOLVERS: &[(&str, &str)] = &[
    ("security", "security-auditor"),
    ("performance", "performance-engineer"),
    ("test", "test-engineer"),
    ("api", "api-designer"),
    ("database", "database-specialist"),
];

fn templates_after(stage: WorkerCategory) -> &'static [Template] {
    match stage {
        WorkerCategory::Design => AFTER_DESIGN,
        WorkerCategory::Implementation => AFTER_IMPLEMENTATION,
        WorkerCategory::Quality => AFTER_QUALITY,
        WorkerCategory::Deployment => AFTER_DEPLOYMENT,
        WorkerCategory::Documentation => &[],
    }
}

/// Resolver for an issue, chosen by keyword.
///
/// Keywords match word prefixes, so "tests" routes to testing but "latest"
/// does not.
pub fn resolver_for(issue_text: &str) -> &'static str {
    let lower = issue_text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    RESOLVERS
        .iter()
        .find(|(keyword, _)| words.iter().any(|w| w.starts_with(keyword)))
        .map(|(_, worker)| *worker)
        .unwrap_or(DEFAULT_RESOLVER)
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

/// TODOs for the stage after `summary.stage`: phase templates, marker
/// work, one corrective item per high or critical issue and one decision
/// per divergence
pub fn generate_todos(summary: &StageSummary, outputs: &[WorkerOutput]) -> Vec<TodoItem> {
    let mut todos: Vec<TodoItem> = templates_after(summary.stage)
        .iter()
        .map(|tpl| TodoItem::new(tpl.task, tpl.priority, tpl.worker, TodoKind::Planned))
        .collect();

    for (marker, tpl) in MARKERS {
        let present = outputs
            .iter()
            .any(|o| o.data.get(*marker).map_or(false, is_set));
        if present {
            todos.push(TodoItem::new(
                tpl.task,
                tpl.priority,
                tpl.worker,
                TodoKind::Conditional,
            ));
        }
    }

    for issue in &summary.critical_issues {
        if issue.severity.rank() < Severity::High.rank() {
            // Sorted, nothing severe follows
            break;
        }
        todos.push(TodoItem::new(
            format!("Resolve {} issue from {}: {}", issue.severity, issue.worker, issue.text),
            TodoPriority::High,
            resolver_for(&issue.text),
            TodoKind::Corrective,
        ));
    }

    for entry in &summary.divergence {
        let positions: Vec<String> = entry
            .values
            .iter()
            .map(|v| format!("{} ({})", v.value, v.workers.join(", ")))
            .collect();
        todos.push(TodoItem::new(
            format!("Decide on '{}': {}", entry.key, positions.join(" vs ")),
            TodoPriority::Medium,
            DECISION_OWNER,
            TodoKind::Decision,
        ));
    }

    todos
}
