use crate::error::Result;
use crate::pipeline;
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Access to the PATH the installed tool is looked up on.
pub trait Environment {
    fn path_entries(&self) -> Vec<PathBuf>;

    fn prepend_path(&mut self, dir: &Path) -> Result<()>;

    fn search_path(&self) -> Result<OsString> {
        join_paths(self.path_entries())
    }

    fn path_starts_with(&self, dir: &Path) -> bool {
        self.path_entries().first().is_some_and(|first| first == dir)
    }
}

fn join_paths(entries: Vec<PathBuf>) -> Result<OsString> {
    env::join_paths(entries).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e).into())
}

/// The environment of this process. Prepending also tells the pipeline
/// agent, so later steps in the job inherit the change.
#[derive(Debug, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn path_entries(&self) -> Vec<PathBuf> {
        env::var_os("PATH")
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default()
    }

    fn prepend_path(&mut self, dir: &Path) -> Result<()> {
        let mut entries = vec![dir.to_path_buf()];
        entries.extend(self.path_entries());
        let joined = join_paths(entries)?;
        env::set_var("PATH", &joined);
        pipeline::prepend_path(dir);
        tracing::debug!("Prepended {} to PATH", dir.display());
        Ok(())
    }
}
