use std::fs::File;
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};

/// name of the metadata directory inside a worktree
pub const METADATA_DIR: &str = ".arbor";

/// an arbor repository: a worktree plus its metadata directory
pub struct Repo {
    worktree: PathBuf,
    path: PathBuf,
    config: Config,
}

impl Repo {
    /// initialize a new repository in the given worktree
    pub fn init(worktree: &Path) -> Result<Self> {
        let path = worktree.join(METADATA_DIR);
        if path.exists() {
            return Err(Error::RepoExists(path));
        }

        // create directory structure
        for sub in ["blobs", "trees", "commits", "refs", "tmp"] {
            std::fs::create_dir_all(path.join(sub)).with_path(&path)?;
        }

        let repo = Self {
            worktree: worktree.to_path_buf(),
            path,
            config: Config::default(),
        };
        repo.save_config()?;

        tracing::debug!(path = %repo.path.display(), "initialized repository");
        Ok(repo)
    }

    /// open the repository whose worktree is `worktree`
    pub fn open(worktree: &Path) -> Result<Self> {
        let path = worktree.join(METADATA_DIR);
        if !path.is_dir() {
            return Err(Error::RepositoryNotFound(worktree.to_path_buf()));
        }

        // a missing config file means defaults
        let config_path = path.join("config.toml");
        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self {
            worktree: worktree.to_path_buf(),
            path,
            config,
        })
    }

    /// find the repository containing `start` by walking up parent directories
    pub fn discover(start: &Path) -> Result<Self> {
        let start = start.canonicalize().with_path(start)?;
        for dir in start.ancestors() {
            if dir.join(METADATA_DIR).is_dir() {
                return Self::open(dir);
            }
        }
        Err(Error::RepositoryNotFound(start))
    }

    /// worktree root (the directory that gets committed)
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    /// metadata directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// save configuration changes
    pub fn save_config(&self) -> Result<()> {
        self.config.validate()?;
        self.config.save(&self.config_path())
    }

    /// path to config.toml
    pub fn config_path(&self) -> PathBuf {
        self.path.join("config.toml")
    }

    /// path to blobs directory
    pub fn blobs_path(&self) -> PathBuf {
        self.path.join("blobs")
    }

    /// path to trees directory
    pub fn trees_path(&self) -> PathBuf {
        self.path.join("trees")
    }

    /// path to commits directory
    pub fn commits_path(&self) -> PathBuf {
        self.path.join("commits")
    }

    /// path to refs directory
    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    /// path to the HEAD pointer file
    pub fn head_path(&self) -> PathBuf {
        self.path.join("HEAD")
    }

    /// path to tmp directory (for atomic writes)
    pub fn tmp_path(&self) -> PathBuf {
        self.path.join("tmp")
    }

    /// path to lock file
    pub fn lock_path(&self) -> PathBuf {
        self.path.join(".lock")
    }

    /// acquire exclusive lock on repository, waiting for other holders
    /// returns a guard that releases the lock on drop
    pub fn lock(&self) -> Result<RepoLock> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;

        let flock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| Error::Io {
            path: lock_path,
            source: std::io::Error::from(errno),
        })?;

        Ok(RepoLock { flock })
    }

    /// try to acquire exclusive lock, returning None if already locked
    pub fn try_lock(&self) -> Result<Option<RepoLock>> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Some(RepoLock { flock })),
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => Ok(None),
            Err(_) => Err(Error::LockContention),
        }
    }
}

/// guard that holds repository lock until dropped
pub struct RepoLock {
    #[allow(dead_code)]
    flock: Flock<File>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_repo_init() {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();

        let meta = dir.path().join(METADATA_DIR);
        assert!(meta.join("blobs").is_dir());
        assert!(meta.join("trees").is_dir());
        assert!(meta.join("commits").is_dir());
        assert!(meta.join("refs").is_dir());
        assert!(meta.join("tmp").is_dir());
        assert!(meta.join("config.toml").is_file());

        assert_eq!(repo.path(), meta);
        assert_eq!(repo.worktree(), dir.path());
        assert_eq!(repo.config().ref_name, "main");
    }

    #[test]
    fn test_repo_init_already_exists() {
        let dir = tempdir().unwrap();

        Repo::init(dir.path()).unwrap();
        let result = Repo::init(dir.path());

        assert!(matches!(result, Err(Error::RepoExists(_))));
    }

    #[test]
    fn test_repo_open_not_found() {
        let dir = tempdir().unwrap();

        let result = Repo::open(dir.path());
        assert!(matches!(result, Err(Error::RepositoryNotFound(_))));
    }

    #[test]
    fn test_repo_open_without_config_uses_defaults() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(METADATA_DIR)).unwrap();

        let repo = Repo::open(dir.path()).unwrap();
        assert_eq!(repo.config(), &Config::default());
    }

    #[test]
    fn test_repo_discover_from_subdirectory() {
        let dir = tempdir().unwrap();
        Repo::init(dir.path()).unwrap();

        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = Repo::discover(&nested).unwrap();
        assert_eq!(repo.worktree(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_repo_discover_not_found() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("x/y");
        std::fs::create_dir_all(&nested).unwrap();

        let result = Repo::discover(&nested);
        assert!(matches!(result, Err(Error::RepositoryNotFound(_))));
    }

    #[test]
    fn test_repo_paths() {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        let meta = dir.path().join(METADATA_DIR);

        assert_eq!(repo.blobs_path(), meta.join("blobs"));
        assert_eq!(repo.trees_path(), meta.join("trees"));
        assert_eq!(repo.commits_path(), meta.join("commits"));
        assert_eq!(repo.refs_path(), meta.join("refs"));
        assert_eq!(repo.head_path(), meta.join("HEAD"));
        assert_eq!(repo.tmp_path(), meta.join("tmp"));
    }

    #[test]
    fn test_repo_lock() {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();

        let lock = repo.lock().unwrap();

        // try to acquire again should fail
        let result = repo.try_lock().unwrap();
        assert!(result.is_none());

        drop(lock);

        let lock2 = repo.try_lock().unwrap();
        assert!(lock2.is_some());
    }

    #[test]
    fn test_config_modification() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        repo.config_mut().ignore.push("target".to_string());
        repo.save_config().unwrap();

        let repo2 = Repo::open(dir.path()).unwrap();
        assert_eq!(repo2.config().ignore, vec!["target".to_string()]);
    }
}
