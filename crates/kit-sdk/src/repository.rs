use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use kit_store::{
    decode_header, Blob, Commit, Header, LooseObjectStore, Object, ObjectStore, TreeEntry,
};
use kit_tree::{list_tree, TreeBuilder, METADATA_DIR};
use kit_types::{Identity, ObjectHash};
use tracing::{debug, info};

use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};

/// Symbolic ref written to `HEAD` by [`Repository::init`].
pub const INITIAL_HEAD: &str = "ref: refs/heads/main\n";

/// A repository rooted at an explicit working directory.
///
/// Layout:
/// ```text
/// <work_dir>/.git/HEAD
/// <work_dir>/.git/config.toml      (optional)
/// <work_dir>/.git/objects/xx/yyyy...
/// <work_dir>/.git/refs/
/// ```
#[derive(Debug)]
pub struct Repository {
    work_dir: PathBuf,
    metadata_dir: PathBuf,
    config: RepoConfig,
    store: LooseObjectStore,
}

impl Repository {
    /// Create the metadata directories and `HEAD`, then open the repository.
    ///
    /// Re-running on an existing repository keeps its `HEAD`.
    pub fn init(work_dir: impl AsRef<Path>) -> SdkResult<Self> {
        let work_dir = work_dir.as_ref();
        let metadata_dir = work_dir.join(METADATA_DIR);
        for dir in [
            metadata_dir.clone(),
            metadata_dir.join("objects"),
            metadata_dir.join("refs"),
            metadata_dir.join("refs").join("heads"),
        ] {
            fs::create_dir_all(&dir).map_err(|e| SdkError::io(&dir, e))?;
        }

        let head = metadata_dir.join("HEAD");
        if !head.exists() {
            fs::write(&head, INITIAL_HEAD).map_err(|e| SdkError::io(&head, e))?;
        }

        info!(path = %metadata_dir.display(), "initialized repository");
        Self::open(work_dir)
    }

    /// Open an initialized repository.
    pub fn open(work_dir: impl AsRef<Path>) -> SdkResult<Self> {
        let work_dir = work_dir.as_ref().to_path_buf();
        let metadata_dir = work_dir.join(METADATA_DIR);
        let objects_dir = metadata_dir.join("objects");
        if !objects_dir.is_dir() {
            return Err(SdkError::NotInitialized(work_dir));
        }

        let config = RepoConfig::load(&metadata_dir)?;
        let store = LooseObjectStore::new(objects_dir)
            .with_compression_level(config.core.compression_level);

        Ok(Self {
            work_dir,
            metadata_dir,
            config,
            store,
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn store(&self) -> &LooseObjectStore {
        &self.store
    }

    // ---- Object operations ----

    /// Read and decode any object.
    pub fn cat_file(&self, hash: &ObjectHash) -> SdkResult<Object> {
        Ok(self.store.read_object(hash)?)
    }

    /// Header and raw body bytes of a stored object.
    pub fn read_body(&self, hash: &ObjectHash) -> SdkResult<(Header, Vec<u8>)> {
        let encoded = self.store.get(hash)?;
        let (header, body) = decode_header(&encoded)?;
        Ok((header, body.to_vec()))
    }

    /// Kind and size of a stored object, without parsing its body.
    pub fn object_header(&self, hash: &ObjectHash) -> SdkResult<Header> {
        Ok(self.read_body(hash)?.0)
    }

    /// Hash a file as a blob, storing it when `write` is set.
    pub fn hash_object(&self, path: &Path, write: bool) -> SdkResult<ObjectHash> {
        let content = fs::read(path).map_err(|e| SdkError::io(path, e))?;
        let encoded = kit_store::encode(&Object::Blob(Blob::new(content)));
        let hash = if write {
            self.store.put(&encoded)?
        } else {
            kit_store::hash(&encoded)
        };
        debug!(path = %path.display(), hash = %hash, write, "hashed file");
        Ok(hash)
    }

    // ---- Tree operations ----

    /// Snapshot the working directory and return the root tree hash.
    pub fn write_tree(&self) -> SdkResult<ObjectHash> {
        Ok(TreeBuilder::new(&self.store).build(&self.work_dir)?)
    }

    /// Entries of a stored tree, in stored order.
    pub fn ls_tree(&self, hash: &ObjectHash) -> SdkResult<Vec<TreeEntry>> {
        Ok(list_tree(&self.store, hash)?)
    }

    // ---- Commit operations ----

    /// Create a commit of `tree` stamped with the configured identity and
    /// the current local time.
    pub fn commit_tree(
        &self,
        tree: &ObjectHash,
        parent: Option<&ObjectHash>,
        message: &str,
    ) -> SdkResult<ObjectHash> {
        let who = self.identity_now()?;
        self.commit_tree_as(tree, parent, message, who.clone(), who)
    }

    /// Create a commit with explicit identities.
    ///
    /// `tree` must be a stored tree and `parent`, if any, a stored commit.
    pub fn commit_tree_as(
        &self,
        tree: &ObjectHash,
        parent: Option<&ObjectHash>,
        message: &str,
        author: Identity,
        committer: Identity,
    ) -> SdkResult<ObjectHash> {
        self.store.read_object(tree)?.into_tree(*tree)?;
        if let Some(parent) = parent {
            self.store.read_object(parent)?.into_commit(*parent)?;
        }

        let commit = Commit {
            tree: *tree,
            parent: parent.copied(),
            author,
            committer,
            message: message.to_string(),
        };
        let hash = self.store.write_object(&Object::Commit(commit))?;
        debug!(hash = %hash, tree = %tree, "stored commit");
        Ok(hash)
    }

    /// The configured identity at the current local time.
    pub fn identity_now(&self) -> SdkResult<Identity> {
        let now = Local::now();
        let offset_minutes = now.offset().local_minus_utc() / 60;
        Ok(Identity::new(
            &self.config.user.name,
            &self.config.user.email,
            now.timestamp(),
            offset_minutes,
        )?)
    }
}
