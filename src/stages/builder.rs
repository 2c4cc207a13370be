//! Groups a worker set into ordered stages and estimates duration

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::analysis::TaskAnalysis;
use crate::catalog::{WorkerCatalog, WorkerCategory};

use super::types::{Stage, StageMode, WorkflowMode, WorkflowPlan};

/// Implementation stages larger than this run sequentially
const PARALLEL_IMPLEMENTATION_LIMIT: usize = 2;

/// Teams larger than this get the parallelism discount
const PARALLEL_TEAM_SIZE: usize = 3;
const PARALLEL_DISCOUNT: f64 = 0.8;
const HOURS_PER_MODULE: f64 = 0.3;

pub const FALLBACK_STAGE_NAME: &str = "Execution";

/// Criteria attached to every Quality stage
pub fn default_quality_gate() -> BTreeMap<String, String> {
    let mut gate = BTreeMap::new();
    gate.insert("testPassRate".to_string(), ">95%".to_string());
    gate.insert("coverage".to_string(), ">80%".to_string());
    gate
}

/// Approximate hours for a plan, rounded to one decimal
pub fn estimate_hours(analysis: &TaskAnalysis, worker_count: usize) -> f64 {
    let mut hours = analysis.complexity.base_hours();
    if worker_count > PARALLEL_TEAM_SIZE {
        hours *= PARALLEL_DISCOUNT;
    }
    hours += HOURS_PER_MODULE * analysis.module_count as f64;
    (hours * 10.0).round() / 10.0
}

pub struct StageGraphBuilder {
    catalog: Arc<WorkerCatalog>,
}

impl StageGraphBuilder {
    pub fn new(catalog: Arc<WorkerCatalog>) -> Self {
        Self { catalog }
    }

    /// Ordered stages for a worker set
    pub fn build_stages(&self, workers: &[String]) -> Vec<Stage> {
        let mut by_category: HashMap<WorkerCategory, Vec<String>> = HashMap::new();
        let mut unknown = Vec::new();

        for worker in workers {
            match self.catalog.category_of(worker) {
                Some(category) => by_category.entry(category).or_default().push(worker.clone()),
                None => unknown.push(worker.clone()),
            }
        }

        if by_category.is_empty() {
            if workers.is_empty() {
                return Vec::new();
            }
            tracing::warn!("No catalogued workers in set; using a single fallback stage");
            return vec![Stage {
                name: FALLBACK_STAGE_NAME.to_string(),
                category: None,
                workers: workers.to_vec(),
                mode: if workers.len() > 1 {
                    StageMode::Parallel
                } else {
                    StageMode::Sequential
                },
                sync_point: false,
                quality_gate: None,
            }];
        }

        if !unknown.is_empty() {
            tracing::warn!(
                "Workers missing from catalog run with implementation: {}",
                unknown.join(", ")
            );
            by_category
                .entry(WorkerCategory::Implementation)
                .or_default()
                .extend(unknown);
        }

        WorkerCategory::ORDERED
            .iter()
            .filter_map(|category| {
                let workers = by_category.remove(category)?;
                Some(stage_for(*category, workers))
            })
            .collect()
    }

    /// Full plan for an analysis and selected worker set
    pub fn build_plan(&self, analysis: &TaskAnalysis, workers: &[String]) -> WorkflowPlan {
        let stages = self.build_stages(workers);
        let overall_mode = overall_mode(&stages);

        WorkflowPlan {
            analysis: analysis.clone(),
            worker_set: workers.to_vec(),
            estimated_hours: estimate_hours(analysis, workers.len()),
            overall_mode,
            stages,
        }
    }
}

fn stage_for(category: WorkerCategory, workers: Vec<String>) -> Stage {
    let mode = match category {
        WorkerCategory::Design | WorkerCategory::Quality => StageMode::Parallel,
        WorkerCategory::Implementation if workers.len() > PARALLEL_IMPLEMENTATION_LIMIT => {
            StageMode::Sequential
        }
        WorkerCategory::Implementation => StageMode::Parallel,
        WorkerCategory::Deployment | WorkerCategory::Documentation => StageMode::Sequential,
    };

    Stage {
        name: category.display_name().to_string(),
        category: Some(category),
        workers,
        mode,
        sync_point: matches!(
            category,
            WorkerCategory::Design | WorkerCategory::Implementation
        ),
        quality_gate: (category == WorkerCategory::Quality).then(default_quality_gate),
    }
}

fn overall_mode(stages: &[Stage]) -> WorkflowMode {
    let parallel = stages.iter().any(|s| s.mode == StageMode::Parallel);
    let sequential = stages.iter().any(|s| s.mode == StageMode::Sequential);
    match (parallel, sequential) {
        (true, true) => WorkflowMode::Hybrid,
        (true, false) => WorkflowMode::Parallel,
        _ => WorkflowMode::Sequential,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Complexity, TaskAnalysis};
    use std::collections::BTreeSet;

    fn builder() -> StageGraphBuilder {
        StageGraphBuilder::new(Arc::new(WorkerCatalog::builtin().unwrap()))
    }

    fn analysis(complexity: Complexity, module_count: u32) -> TaskAnalysis {
        TaskAnalysis {
            keywords: BTreeSet::new(),
            complexity,
            domain: "general".to_string(),
            estimated_size: 0,
            module_count,
            score: 0,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stages_follow_category_order() {
        let stages = builder().build_stages(&names(&[
            "technical-writer",
            "test-engineer",
            "devops-engineer",
            "backend-architect",
            "api-designer",
        ]));

        let order: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["Design", "Implementation", "Quality", "Deployment", "Documentation"]
        );
    }

    #[test]
    fn test_stage_modes_and_sync_points() {
        let stages = builder().build_stages(&names(&[
            "api-designer",
            "database-specialist",
            "backend-architect",
            "test-engineer",
            "security-auditor",
            "devops-engineer",
        ]));

        let design = &stages[0];
        assert_eq!(design.mode, StageMode::Parallel);
        assert!(design.sync_point);

        let implementation = &stages[1];
        assert_eq!(implementation.mode, StageMode::Parallel);
        assert!(implementation.sync_point);

        let quality = &stages[2];
        assert_eq!(quality.mode, StageMode::Parallel);
        assert!(!quality.sync_point);
        let gate = quality.quality_gate.as_ref().unwrap();
        assert_eq!(gate.get("testPassRate").map(String::as_str), Some(">95%"));
        assert_eq!(gate.get("coverage").map(String::as_str), Some(">80%"));

        let deployment = &stages[3];
        assert_eq!(deployment.mode, StageMode::Sequential);
        assert!(!deployment.sync_point);
        assert!(deployment.quality_gate.is_none());
    }

    #[test]
    fn test_large_implementation_stage_is_sequential() {
        let stages = builder().build_stages(&names(&[
            "backend-architect",
            "frontend-developer",
            "debugger",
        ]));

        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].mode, StageMode::Sequential);
    }

    #[test]
    fn test_uncatalogued_workers_get_fallback_stage() {
        let stages = builder().build_stages(&names(&["ghost-a", "ghost-b"]));

        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].name, FALLBACK_STAGE_NAME);
        assert_eq!(stages[0].mode, StageMode::Parallel);
        assert_eq!(stages[0].workers, names(&["ghost-a", "ghost-b"]));

        let single = builder().build_stages(&names(&["ghost"]));
        assert_eq!(single[0].mode, StageMode::Sequential);
    }

    #[test]
    fn test_uncatalogued_worker_joins_implementation() {
        let stages = builder().build_stages(&names(&["api-designer", "ghost"]));

        assert_eq!(stages.len(), 2);
        assert_eq!(stages[1].workers, names(&["ghost"]));
    }

    #[test]
    fn test_estimate_hours() {
        // 0.5 + 0.3
        assert_eq!(estimate_hours(&analysis(Complexity::Simple, 1), 2), 0.8);
        // 2.0 * 0.8 + 0.6
        assert_eq!(estimate_hours(&analysis(Complexity::Standard, 2), 4), 2.2);
        // 5.0 * 0.8 + 0.9
        assert_eq!(estimate_hours(&analysis(Complexity::Complex, 3), 5), 4.9);
        // no discount at exactly 3 workers
        assert_eq!(estimate_hours(&analysis(Complexity::Complex, 1), 3), 5.3);
    }

    #[test]
    fn test_overall_mode() {
        let plan = builder().build_plan(
            &analysis(Complexity::Simple, 1),
            &names(&["debugger", "technical-writer"]),
        );
        assert_eq!(plan.overall_mode, WorkflowMode::Hybrid);

        let plan = builder().build_plan(&analysis(Complexity::Simple, 1), &names(&["technical-writer"]));
        assert_eq!(plan.overall_mode, WorkflowMode::Sequential);
    }
}
