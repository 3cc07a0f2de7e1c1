// src/hooks.rs
// Git hook installer: post-commit and post-merge trigger incremental reindexing

use anyhow::{Result, bail};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const HOOK_NAMES: &[&str] = &["post-commit", "post-merge"];

/// Install the reindexing hooks into `.git/hooks/` under the given root.
pub fn install_hooks(root: &Path) -> Result<()> {
    let git_hooks_dir = root.join(".git").join("hooks");
    if !git_hooks_dir.exists() {
        bail!(
            "No .git/hooks/ found at {}. Are you in a git repo?",
            root.display()
        );
    }

    for hook_name in HOOK_NAMES {
        let hook_path = git_hooks_dir.join(hook_name);
        std::fs::write(&hook_path, hook_script(hook_name))?;

        #[cfg(unix)]
        {
            let mut perms = std::fs::metadata(&hook_path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&hook_path, perms)?;
        }

        println!("Installed {}", hook_path.display());
    }

    println!("Done. Hooks will trigger incremental reindexing on commit/merge.");
    Ok(())
}

fn hook_script(hook_name: &str) -> String {
    format!(
        r#"#!/bin/sh
# symdex git hook: {hook_name}
# Incrementally reindex changed files after each commit/merge

CHANGED=$(git diff --name-only HEAD~1 HEAD 2>/dev/null || git diff --name-only HEAD 2>/dev/null)
if [ -n "$CHANGED" ]; then
    symdex index --files $CHANGED 2>/dev/null &
fi
"#
    )
}
