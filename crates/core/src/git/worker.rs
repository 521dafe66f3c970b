// Shells out to `git` for staging, committing, and syncing.
//
// Commands run through the `CommandExecutor` trait so tests can observe
// every invocation without a real repository. There is exactly one commit
// entry point: an optional timestamp override covers both ordinary commits
// and history fabricated at a past instant.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    EmptyAddPaths,
    SpawnFailed { command: String, message: String },
    CommandFailed { command: String, code: Option<i32>, stderr: String },
}

impl Display for GitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GitError::EmptyAddPaths => write!(f, "git add requires at least one path"),
            GitError::SpawnFailed { command, message } => {
                write!(f, "failed to run `{command}`: {message}")
            }
            GitError::CommandFailed { command, code, stderr } => {
                write!(f, "`{command}` failed with code {:?}: {}", code, stderr.trim())
            }
        }
    }
}

impl Error for GitError {}

// ── Changed files ───────────────────────────────────────────────────

/// One entry from `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

/// Parse `git status --porcelain` output into changed files.
///
/// Untracked (`??`) entries count as added; renames report the new path.
pub fn parse_porcelain(output: &str) -> Vec<ChangedFile> {
    output
        .lines()
        .filter_map(|line| {
            if line.len() < 4 {
                return None;
            }
            let (code, rest) = line.split_at(2);
            let path = match rest.trim_start().split_once(" -> ") {
                Some((_, renamed)) => renamed,
                None => rest.trim_start(),
            };

            let change_type = if code == "??" || code.contains('A') {
                ChangeType::Added
            } else if code.contains('D') {
                ChangeType::Deleted
            } else {
                ChangeType::Modified
            };

            Some(ChangedFile { path: path.to_string(), change_type })
        })
        .collect()
}

// ── Command execution ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error> {
        let output = Command::new(program)
            .args(args)
            .envs(envs.iter().map(|(key, value)| (key.as_str(), value.as_str())))
            .current_dir(cwd)
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ── Worker ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GitWorker<E = ProcessCommandExecutor> {
    repo_path: PathBuf,
    executor: E,
}

impl GitWorker<ProcessCommandExecutor> {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self { repo_path: repo_path.into(), executor: ProcessCommandExecutor }
    }
}

impl<E: CommandExecutor> GitWorker<E> {
    pub fn with_executor(repo_path: impl Into<PathBuf>, executor: E) -> Self {
        Self { repo_path: repo_path.into(), executor }
    }

    /// Files with staged or unstaged changes, per `git status --porcelain`.
    pub fn status(&self) -> Result<Vec<ChangedFile>, GitError> {
        let output = self.run(vec!["status".to_string(), "--porcelain".to_string()], Vec::new())?;
        Ok(parse_porcelain(&output.stdout))
    }

    pub fn add<S: AsRef<str>>(&self, paths: &[S]) -> Result<GitCommandOutput, GitError> {
        if paths.is_empty() {
            return Err(GitError::EmptyAddPaths);
        }

        let mut args = vec!["add".to_string()];
        args.extend(paths.iter().map(|path| path.as_ref().to_string()));
        self.run(args, Vec::new())
    }

    /// Commit the staged change set.
    ///
    /// With `date`, both the author date (`--date`) and the committer date
    /// (`GIT_COMMITTER_DATE`, which `--date` alone does not cover) are set
    /// to the given instant.
    pub fn commit(
        &self,
        message: &str,
        date: Option<&DateTime<Local>>,
    ) -> Result<GitCommandOutput, GitError> {
        let mut args = vec!["commit".to_string(), "-m".to_string(), message.to_string()];
        let mut envs = Vec::new();

        if let Some(date) = date {
            let stamp = date.to_rfc3339();
            args.push("--date".to_string());
            args.push(stamp.clone());
            envs.push(("GIT_COMMITTER_DATE".to_string(), stamp));
        }

        self.run(args, envs)
    }

    pub fn push(&self, remote: &str, branch: &str) -> Result<GitCommandOutput, GitError> {
        self.run(vec!["push".to_string(), remote.to_string(), branch.to_string()], Vec::new())
    }

    pub fn pull_rebase(&self, remote: &str, branch: &str) -> Result<GitCommandOutput, GitError> {
        self.run(
            vec![
                "pull".to_string(),
                "--rebase".to_string(),
                remote.to_string(),
                branch.to_string(),
            ],
            Vec::new(),
        )
    }

    fn run(
        &self,
        args: Vec<String>,
        envs: Vec<(String, String)>,
    ) -> Result<GitCommandOutput, GitError> {
        let command = format!("git {}", args.join(" "));
        let result =
            self.executor.execute("git", &args, &envs, &self.repo_path).map_err(|error| {
                GitError::SpawnFailed { command: command.clone(), message: error.to_string() }
            })?;

        if result.success {
            return Ok(GitCommandOutput { stdout: result.stdout, stderr: result.stderr });
        }

        let stderr = if result.stderr.trim().is_empty() { result.stdout } else { result.stderr };

        Err(GitError::CommandFailed { command, code: result.code, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Invocation {
        program: String,
        args: Vec<String>,
        envs: Vec<(String, String)>,
        cwd: PathBuf,
    }

    #[derive(Clone)]
    struct MockExecutor {
        calls: Arc<Mutex<Vec<Invocation>>>,
        responses: Arc<Mutex<VecDeque<Result<CommandResult, std::io::Error>>>>,
    }

    impl MockExecutor {
        fn new(responses: Vec<Result<CommandResult, std::io::Error>>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            }
        }

        fn ok(stdout: &str) -> Result<CommandResult, std::io::Error> {
            Ok(CommandResult {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            })
        }

        fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().expect("mock calls lock poisoned").clone()
        }
    }

    impl CommandExecutor for MockExecutor {
        fn execute(
            &self,
            program: &str,
            args: &[String],
            envs: &[(String, String)],
            cwd: &Path,
        ) -> Result<CommandResult, std::io::Error> {
            self.calls.lock().expect("mock calls lock poisoned").push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
                envs: envs.to_vec(),
                cwd: cwd.to_path_buf(),
            });

            self.responses
                .lock()
                .expect("mock responses lock poisoned")
                .pop_front()
                .expect("missing mock response")
        }
    }

    #[test]
    fn status_parses_porcelain_output() {
        let mock = MockExecutor::new(vec![MockExecutor::ok(
            " M data.json\n?? backfill-log.txt\nD  old.md\n",
        )]);

        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());
        let changed = worker.status().expect("status should succeed");

        assert_eq!(
            changed,
            vec![
                ChangedFile { path: "data.json".into(), change_type: ChangeType::Modified },
                ChangedFile { path: "backfill-log.txt".into(), change_type: ChangeType::Added },
                ChangedFile { path: "old.md".into(), change_type: ChangeType::Deleted },
            ]
        );

        let calls = mock.calls();
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args, vec!["status", "--porcelain"]);
        assert_eq!(calls[0].cwd, PathBuf::from("/tmp/repo"));
    }

    #[test]
    fn porcelain_rename_reports_new_path() {
        let changed = parse_porcelain("R  notes.md -> daily-progress.md\n");
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].path, "daily-progress.md");
    }

    #[test]
    fn add_requires_at_least_one_path() {
        let mock = MockExecutor::new(Vec::new());
        let worker = GitWorker::with_executor("/tmp/repo", mock);

        let error = worker.add::<&str>(&[]).expect_err("add should fail");
        assert_eq!(error, GitError::EmptyAddPaths);
    }

    #[test]
    fn commit_without_date_passes_no_env() {
        let mock = MockExecutor::new(vec![MockExecutor::ok("[main abc123] update\n")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());

        let _ = worker.commit("Update progress log", None).expect("commit should succeed");

        let calls = mock.calls();
        assert_eq!(calls[0].args, vec!["commit", "-m", "Update progress log"]);
        assert!(calls[0].envs.is_empty());
    }

    #[test]
    fn commit_with_date_overrides_author_and_committer_dates() {
        let mock = MockExecutor::new(vec![MockExecutor::ok("[main def456] update\n")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());

        let date = Local.with_ymd_and_hms(2024, 3, 10, 13, 45, 0).unwrap();
        let _ = worker.commit("Record activity", Some(&date)).expect("commit should succeed");

        let stamp = date.to_rfc3339();
        let calls = mock.calls();
        assert_eq!(calls[0].args, vec!["commit", "-m", "Record activity", "--date", stamp.as_str()]);
        assert_eq!(calls[0].envs, vec![("GIT_COMMITTER_DATE".to_string(), stamp)]);
    }

    #[test]
    fn push_targets_remote_and_branch() {
        let mock = MockExecutor::new(vec![MockExecutor::ok("")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());

        let _ = worker.push("origin", "main").expect("push should succeed");
        assert_eq!(mock.calls()[0].args, vec!["push", "origin", "main"]);
    }

    #[test]
    fn pull_rebase_returns_command_failure_with_stderr() {
        let mock = MockExecutor::new(vec![Ok(CommandResult {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: "fatal: couldn't find remote ref main\n".to_string(),
        })]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());

        let error = worker.pull_rebase("origin", "main").expect_err("pull --rebase should fail");
        assert_eq!(
            error,
            GitError::CommandFailed {
                command: "git pull --rebase origin main".to_string(),
                code: Some(1),
                stderr: "fatal: couldn't find remote ref main\n".to_string(),
            }
        );
    }

    #[test]
    fn failure_falls_back_to_stdout_when_stderr_is_empty() {
        let mock = MockExecutor::new(vec![Ok(CommandResult {
            success: false,
            code: Some(1),
            stdout: "nothing to commit, working tree clean\n".to_string(),
            stderr: String::new(),
        })]);
        let worker = GitWorker::with_executor("/tmp/repo", mock);

        let error = worker.commit("Update notes", None).expect_err("commit should fail");
        match error {
            GitError::CommandFailed { stderr, .. } => {
                assert!(stderr.contains("working tree clean"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
