use super::common::*;
use anyhow::Result;
use predicates::prelude::*;

#[tokio::test]
async fn test_cli_help() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_planner(&["--help"]).await?;

    assert_success(&output);
    let stdout = output_to_string(&output);
    assert_contains(&stdout, "workforce-planner");
    assert_contains(&stdout, "plan");
    assert_contains(&stdout, "aggregate");
    assert_contains(&stdout, "catalog");
    assert_contains(&stdout, "config");

    Ok(())
}

#[tokio::test]
async fn test_plan_json_output() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_planner(&["plan", AUTH_TASK, "--json"]).await?;

    assert_success(&output);
    let response: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(response["plan"]["analysis"]["complexity"], "complex");
    assert_eq!(response["cache_hit"], false);
    assert!(response["plan"]["worker_set"].as_array().map_or(0, |a| a.len()) >= 5);

    Ok(())
}

#[tokio::test]
async fn test_plan_text_output_with_options() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env
        .run_planner(&[
            "plan",
            "fix typo",
            "--complexity",
            "standard",
            "--require",
            "ui-designer",
            "--history",
            "debugger success",
        ])
        .await?;

    assert_success(&output);
    let stdout = output_to_string(&output);
    assert!(predicate::str::contains("standard task").eval(&stdout));
    assert!(predicate::str::contains("ui-designer").eval(&stdout));
    assert!(predicate::str::contains("Rationale:").eval(&stdout));
    assert!(predicate::str::contains("estimate").eval(&stdout));

    Ok(())
}

#[tokio::test]
async fn test_plan_rejects_unknown_complexity() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env
        .run_planner(&["plan", "fix typo", "--complexity", "epic"])
        .await?;

    assert!(!output.status.success());
    assert_contains(&stderr_to_string(&output), "unknown complexity");

    Ok(())
}

#[tokio::test]
async fn test_aggregate_command() -> Result<()> {
    let env = TestEnvironment::new()?;
    let file = env.write_file(
        "outputs.json",
        r#"[
            {"worker": "test-engineer", "issues": [{"text": "Flaky test suite", "severity": "high"}], "coverage": 72},
            {"worker": "code-reviewer", "coverage": 72}
        ]"#,
    )?;

    let output = env
        .run_planner(&["aggregate", file.to_str().unwrap(), "--stage", "quality", "--json"])
        .await?;

    assert_success(&output);
    let aggregate: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(aggregate["summary"]["consensus"][0]["key"], "coverage");
    assert_eq!(aggregate["summary"]["critical_issues"][0]["severity"], "high");

    let todos = aggregate["todos"].as_array().cloned().unwrap_or_default();
    assert!(todos
        .iter()
        .any(|t| t["type"] == "corrective" && t["assignedWorker"] == "test-engineer"));

    Ok(())
}

#[tokio::test]
async fn test_aggregate_reports_bad_input() -> Result<()> {
    let env = TestEnvironment::new()?;
    let file = env.write_file("broken.json", "{ not json")?;

    let output = env
        .run_planner(&["aggregate", file.to_str().unwrap(), "--stage", "design"])
        .await?;

    assert!(!output.status.success());
    assert_contains(&stderr_to_string(&output), "Failed to parse worker outputs");

    Ok(())
}

#[tokio::test]
async fn test_catalog_command() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_planner(&["catalog"]).await?;

    assert_success(&output);
    let stdout = output_to_string(&output);
    assert_contains(&stdout, "Design:");
    assert_contains(&stdout, "security-auditor");
    assert_contains(&stdout, "21 workers");

    Ok(())
}

#[tokio::test]
async fn test_config_command_saves_changes() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run_planner(&["config", "--strict-severity", "true"]).await?;
    assert_success(&output);
    assert_contains(&output_to_string(&output), "Configuration saved");

    let output = env.run_planner(&["config", "--show"]).await?;
    assert_success(&output);
    let stdout = output_to_string(&output);
    assert_contains(&stdout, "[aggregation]");
    assert_contains(&stdout, "strict_severity = true");

    Ok(())
}
