use anyhow::Result;
use std::sync::Arc;

use crate::cli::Commands;
use campctl_core::{ExecutionPlan, ExecutionReport, Settings, TaskEngine, TaskRegistry, TaskStatus};
use campctl_local_executor::LocalActionRunner;

pub async fn execute(command: Commands, settings: Settings, json: bool) -> Result<()> {
    let registry = Arc::new(campctl_core::standard_registry(&settings)?);

    match command {
        Commands::Tasks => {
            if json {
                println!("{}", serde_json::to_string_pretty(registry.tasks())?);
            } else {
                print_tasks(&registry);
            }
        }

        Commands::Run {
            tasks,
            continue_on_failure,
            dry_run,
        } => {
            let plan = registry.plan(&tasks)?;

            if dry_run {
                if json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                } else {
                    print_plan(&plan);
                }
                return Ok(());
            }

            let runner = LocalActionRunner::from_settings(&settings)?;
            let engine = TaskEngine::new(registry, Arc::new(runner))
                .with_continue_on_failure(continue_on_failure);

            let report = engine.execute(&plan).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if !report.is_success() {
                let failed: Vec<&str> = report.failed().iter().map(|o| o.name.as_str()).collect();
                anyhow::bail!("{} task(s) failed: {}", failed.len(), failed.join(", "));
            }
        }
    }

    Ok(())
}

fn print_tasks(registry: &TaskRegistry) {
    for (group, tasks) in registry.groups() {
        println!("{} tasks", group);
        println!("{}", "-".repeat(group.len() + 6));
        for task in tasks {
            println!("{:<18} {}", task.name, task.description);
        }
        println!();
    }
}

fn print_plan(plan: &ExecutionPlan) {
    println!("Execution plan for {}:", plan.requested.join(" "));
    for (i, step) in plan.steps.iter().enumerate() {
        if step.upstream.is_empty() {
            println!("  {}. {}", i + 1, step.task.name);
        } else {
            println!(
                "  {}. {} (after {})",
                i + 1,
                step.task.name,
                step.upstream.join(", ")
            );
        }
    }
}

fn print_report(report: &ExecutionReport) {
    println!();
    println!("{}", "=".repeat(60));
    for outcome in &report.outcomes {
        let mark = match outcome.status {
            TaskStatus::Succeeded => "✓",
            TaskStatus::Failed => "✗",
            TaskStatus::Skipped => "-",
        };

        let duration = match (outcome.started_at, outcome.completed_at) {
            (Some(started), Some(completed)) => {
                format!(" ({}s)", completed.signed_duration_since(started).num_seconds())
            }
            _ => String::new(),
        };

        println!("{} {}{}", mark, outcome.name, duration);
        if let Some(error) = &outcome.error {
            println!("    {}", error);
        }
    }
    println!("{}", "=".repeat(60));
}
