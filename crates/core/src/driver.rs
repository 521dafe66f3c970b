// The commit driver: walks a schedule, mutates the working-tree artifacts,
// and drives git one commit at a time.
//
// Every git and filesystem failure is caught where it happens, logged, and
// treated as "this operation did not happen"; a bad slot never aborts the
// rest of the run. Each batch ends with a single push.

use std::path::PathBuf;

use chrono::{DateTime, Days, Local};
use rand::Rng;
use tracing::{info, warn};

use crate::artifact::{self, ActivityEntry};
use crate::config::Config;
use crate::git::{CommandExecutor, GitWorker, ProcessCommandExecutor};
use crate::schedule::{BackfillPlan, CommitTime, DaySchedule};

/// Canned commit messages, picked uniformly at random per commit. Not tied
/// to the scheduled time in any way.
const COMMIT_MESSAGES: [&str; 8] = [
    "Update progress log",
    "Add daily progress entry",
    "Record activity for today",
    "Refresh activity data",
    "Update notes",
    "Log progress checkpoint",
    "Keep the log current",
    "Tidy up activity records",
];

fn pick_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    COMMIT_MESSAGES[rng.gen_range(0..COMMIT_MESSAGES.len())]
}

/// Resolve `today - days_ago` at the given time of day in the local zone.
///
/// Returns `None` for instants the local zone skips (DST gaps); ambiguous
/// instants resolve to the earlier offset.
fn historical_timestamp(
    today: &DateTime<Local>,
    days_ago: u32,
    time: &CommitTime,
) -> Option<DateTime<Local>> {
    let date = today.date_naive().checked_sub_days(Days::new(u64::from(days_ago)))?;
    let naive = date.and_hms_opt(time.hour, time.minute, 0)?;
    naive.and_local_timezone(Local).earliest()
}

pub struct CommitDriver<E = ProcessCommandExecutor> {
    root: PathBuf,
    git: GitWorker<E>,
    config: Config,
}

impl CommitDriver<ProcessCommandExecutor> {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        let git = GitWorker::new(&root);
        Self { root, git, config }
    }
}

impl<E: CommandExecutor> CommitDriver<E> {
    pub fn with_executor(root: impl Into<PathBuf>, config: Config, executor: E) -> Self {
        let root = root.into();
        let git = GitWorker::with_executor(&root, executor);
        Self { root, git, config }
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Run the live daily batch: one commit attempt per scheduled time, in
    /// order, with a pause between attempts. Returns the number of commits
    /// that landed.
    ///
    /// The scheduled times pace and describe the run; the commits
    /// themselves carry ordinary wall-clock timestamps. Pushes once at the
    /// end, and only when at least one commit landed.
    pub async fn run_daily<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now: DateTime<Local>,
        schedule: &DaySchedule,
    ) -> u32 {
        info!(slots = schedule.len(), "starting daily run");
        let mut committed = 0u32;

        for (index, time) in schedule.times.iter().enumerate() {
            self.mutate_daily_artifacts(now, time);

            match self.git.add(&["."]) {
                Err(error) => warn!(%error, slot = %time, "staging failed"),
                Ok(_) => match self.git.status() {
                    Err(error) => warn!(%error, slot = %time, "status check failed"),
                    Ok(changed) if changed.is_empty() => {
                        info!(slot = %time, "working tree clean, nothing to commit");
                    }
                    Ok(_) => {
                        let message = pick_message(rng);
                        match self.git.commit(message, None) {
                            Ok(_) => {
                                committed += 1;
                                info!(slot = %time, message, "committed");
                            }
                            Err(error) => warn!(%error, slot = %time, "commit failed"),
                        }
                    }
                },
            }

            if index + 1 < schedule.len() {
                tokio::time::sleep(self.config.pacing.commit_delay()).await;
            }
        }

        if committed > 0 {
            self.sync_remote();
        } else {
            info!("no commits landed, skipping push");
        }

        committed
    }

    /// Fabricate history for every planned past day, oldest first. Each
    /// commit carries an explicit date override. Returns the number of
    /// commits that landed; pushes once at the end regardless.
    pub async fn run_backfill<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        today: DateTime<Local>,
        plan: &BackfillPlan,
    ) -> u32 {
        info!(days = plan.days.len(), commits = plan.commit_count(), "starting backfill");
        let mut committed = 0u32;

        for day in &plan.days {
            for time in &day.times {
                match historical_timestamp(&today, day.days_ago, time) {
                    None => {
                        warn!(days_ago = day.days_ago, slot = %time, "no valid local timestamp, skipping");
                    }
                    Some(stamp) => {
                        let message = pick_message(rng);

                        let line = format!("{} {message}", stamp.format("%Y-%m-%d %H:%M"));
                        let log_path = self.artifact_path(&self.config.artifacts.backfill_log);
                        if let Err(error) = artifact::append_backfill_line(&log_path, &line) {
                            warn!(%error, "failed to update backfill log");
                        }

                        let result = self
                            .git
                            .add(&["."])
                            .and_then(|_| self.git.commit(message, Some(&stamp)));
                        match result {
                            Ok(_) => {
                                committed += 1;
                                info!(date = %stamp, message, "backfill commit");
                            }
                            Err(error) => warn!(%error, date = %stamp, "backfill commit failed"),
                        }
                    }
                }

                tokio::time::sleep(self.config.pacing.backfill_delay()).await;
            }
        }

        let git_config = &self.config.git;
        match self.git.push(&git_config.remote, &git_config.branch) {
            Ok(_) => info!(remote = %git_config.remote, branch = %git_config.branch, "pushed"),
            Err(error) => warn!(%error, "push failed"),
        }

        committed
    }

    /// Write the per-commit content mutation for a live slot: a new
    /// activity record and a progress line under the log header.
    fn mutate_daily_artifacts(&self, now: DateTime<Local>, time: &CommitTime) {
        let data_path = self.artifact_path(&self.config.artifacts.data_file);
        if let Err(error) = artifact::append_activity_entry(&data_path, &ActivityEntry::new(now)) {
            warn!(%error, "failed to update activity file");
        }

        let progress_path = self.artifact_path(&self.config.artifacts.progress_file);
        let entry = format!("- {} progress checkpoint (slot {time})", now.to_rfc3339());
        if let Err(error) = artifact::append_progress_entry(&progress_path, &entry) {
            warn!(%error, "failed to update progress log");
        }
    }

    /// Rebase on the remote, then push. Failures are logged and the run
    /// still ends normally; nothing is retried.
    fn sync_remote(&self) {
        let git_config = &self.config.git;

        if let Err(error) = self.git.pull_rebase(&git_config.remote, &git_config.branch) {
            warn!(%error, "pull --rebase failed");
        }

        match self.git.push(&git_config.remote, &git_config.branch) {
            Ok(_) => info!(remote = %git_config.remote, branch = %git_config.branch, "pushed"),
            Err(error) => warn!(%error, "push failed"),
        }
    }
}
