use crate::settings::Settings;
use crate::{ComposeOperation, Result, TaskAction, TaskDescriptor, TaskRegistry};

pub const GROUP_LIFECYCLE: &str = "lifecycle";
pub const GROUP_BOOTSTRAP: &str = "bootstrap";
pub const GROUP_VERIFICATION: &str = "verification";

pub const INFRA_STACK: &str = "infra";
pub const APPS_STACK: &str = "apps";

/// `cloneKiosk` for `kiosk`
pub fn clone_task_name(repository: &str) -> String {
    let mut chars = repository.chars();
    match chars.next() {
        Some(first) => format!("clone{}{}", first.to_uppercase(), chars.as_str()),
        None => "clone".to_string(),
    }
}

fn compose(stack: &str, operation: ComposeOperation) -> TaskAction {
    TaskAction::Compose {
        stack: stack.to_string(),
        operation,
        wait_for: None,
    }
}

/// The fixed task table for the camping environment.
pub fn standard_tasks(settings: &Settings) -> Vec<TaskDescriptor> {
    let mut tasks = vec![
        TaskDescriptor::new("infraUp", GROUP_LIFECYCLE, compose(INFRA_STACK, ComposeOperation::Up))
            .with_description("Start the infrastructure containers"),
        TaskDescriptor::new(
            "infraDown",
            GROUP_LIFECYCLE,
            compose(INFRA_STACK, ComposeOperation::Down),
        )
        .with_description("Stop the infrastructure containers and remove their volumes")
        .must_run_after(["appsDown"]),
        TaskDescriptor::new(
            "appsUp",
            GROUP_LIFECYCLE,
            TaskAction::Compose {
                stack: APPS_STACK.to_string(),
                operation: ComposeOperation::Up,
                wait_for: Some(INFRA_STACK.to_string()),
            },
        )
        .with_description("Build and start the application containers once infra is ready")
        .must_run_after(["infraUp"]),
        TaskDescriptor::new("appsDown", GROUP_LIFECYCLE, compose(APPS_STACK, ComposeOperation::Down))
            .with_description("Stop the application containers and remove their volumes"),
        TaskDescriptor::new("appsLogs", GROUP_LIFECYCLE, compose(APPS_STACK, ComposeOperation::Logs))
            .with_description("Follow the application container logs"),
        TaskDescriptor::new("allUp", GROUP_LIFECYCLE, TaskAction::Aggregate)
            .with_description("Start infrastructure, then applications")
            .with_dependencies(["infraUp", "appsUp"]),
        TaskDescriptor::new("allDown", GROUP_LIFECYCLE, TaskAction::Aggregate)
            .with_description("Stop applications, then infrastructure")
            .with_dependencies(["appsDown", "infraDown"]),
    ];

    let mut clone_tasks = Vec::new();
    for repo in &settings.repositories.entries {
        let name = clone_task_name(&repo.name);
        tasks.push(
            TaskDescriptor::new(
                name.clone(),
                GROUP_BOOTSTRAP,
                TaskAction::Bootstrap {
                    repository: repo.name.clone(),
                },
            )
            .with_description(format!(
                "Shallow-clone {} into {} and apply its overlays",
                repo.name,
                settings.repositories.directory.join(&repo.directory).display()
            )),
        );
        clone_tasks.push(name);
    }

    tasks.push(
        TaskDescriptor::new("cloneRepos", GROUP_BOOTSTRAP, TaskAction::Aggregate)
            .with_description("Clone every repository")
            .with_dependencies(clone_tasks),
    );

    tasks.push(
        TaskDescriptor::new("smoke", GROUP_VERIFICATION, TaskAction::Smoke)
            .with_description("Check that every service answers its health endpoint")
            .must_run_after(["appsUp"]),
    );

    tasks
}

pub fn standard_registry(settings: &Settings) -> Result<TaskRegistry> {
    TaskRegistry::new(standard_tasks(settings))
}
