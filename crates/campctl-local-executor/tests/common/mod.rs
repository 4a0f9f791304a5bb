#![allow(dead_code)]

use async_trait::async_trait;
use campctl_core::Settings;
use campctl_local_executor::{CommandOutcome, CommandRunner, CommandSpec, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Records every command. `git clone` is simulated by creating the target
/// directory; commands containing a configured fragment exit with status 1.
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: Mutex<Vec<CommandSpec>>,
    failing: Vec<String>,
}

impl RecordingRunner {
    pub fn failing_on(fragment: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: vec![fragment.to_string()],
        }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        self.calls.lock().unwrap().push(spec.clone());

        let rendered = spec.to_string();
        if self.failing.iter().any(|f| rendered.contains(f.as_str())) {
            return Ok(CommandOutcome { code: Some(1) });
        }

        if spec.program == "git" && spec.args.first().map(String::as_str) == Some("clone") {
            let target = PathBuf::from(spec.args.last().expect("clone target"));
            std::fs::create_dir_all(target.join("src/main/resources"))?;
            std::fs::write(target.join("README.md"), "cloned")?;
        }

        Ok(CommandOutcome { code: Some(0) })
    }
}

/// A project root with the default overlay sources in place
pub fn project(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.root = root.to_path_buf();

    let configs = root.join("infra/configs");
    std::fs::create_dir_all(&configs).unwrap();
    for name in ["kiosk", "admin", "reservation"] {
        std::fs::write(
            configs.join(format!("{}-application.yml", name)),
            format!("spring:\n  application:\n    name: {}\n", name),
        )
        .unwrap();
        std::fs::write(
            configs.join(format!("{}-build.gradle", name)),
            format!("// {} build overlay\n", name),
        )
        .unwrap();
    }

    settings
}
