// Git capability: a thin worker over the `git` binary.

pub mod worker;

pub use worker::{
    ChangeType, ChangedFile, CommandExecutor, CommandResult, GitCommandOutput, GitError,
    GitWorker, ProcessCommandExecutor,
};
