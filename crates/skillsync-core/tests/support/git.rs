use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

/// Run git in `cwd` and panic with its stderr on failure.
pub fn git(cwd: &Path, args: &[&str]) {
    let output = git_command()
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("git should run");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@example.com"]);
}

/// A bare remote plus a clone on `branch` with one pushed commit.
pub struct RepoFixture {
    pub temp: TempDir,
    pub remote: PathBuf,
    pub work: PathBuf,
}

impl RepoFixture {
    pub fn new(branch: &str) -> Self {
        let temp = TempDir::new().expect("tempdir should succeed");
        let remote = temp.path().join("remote.git");
        let work = temp.path().join("work");

        git(temp.path(), &["init", "--bare", "remote.git"]);
        git(temp.path(), &["init", "work"]);
        configure_identity(&work);
        git(&work, &["checkout", "-b", branch]);

        fs::create_dir_all(work.join("lambda")).expect("create_dir_all should succeed");
        fs::write(work.join("lambda/index.js"), "exports.handler = () => {};\n")
            .expect("write should succeed");
        git(&work, &["add", "."]);
        git(&work, &["commit", "-m", "initial"]);
        git(&work, &["remote", "add", "origin", remote.to_str().expect("utf-8 path")]);
        git(&work, &["push", "-u", "origin", branch]);

        Self { temp, remote, work }
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.work.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create_dir_all should succeed");
        }
        fs::write(path, content).expect("write should succeed");
    }

    pub fn commit_all(&self, message: &str) {
        git(&self.work, &["add", "-A"]);
        git(&self.work, &["commit", "-m", message]);
    }

    /// Push a commit to the remote from a second clone.
    pub fn push_from_other_clone(&self, branch: &str, rel: &str, content: &str) {
        let other = self.temp.path().join("other");
        git(
            self.temp.path(),
            &[
                "clone",
                "--branch",
                branch,
                self.remote.to_str().expect("utf-8 path"),
                "other",
            ],
        );
        configure_identity(&other);
        fs::write(other.join(rel), content).expect("write should succeed");
        git(&other, &["add", "-A"]);
        git(&other, &["commit", "-m", "remote change"]);
        git(&other, &["push", "origin", branch]);
    }
}
