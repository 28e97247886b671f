use crate::history::{EntryType, HistoryStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::Duration;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Build an input mapping from key/value pairs.
pub(crate) fn input<I, K, V>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A store over `<dir>/history.json` with test-friendly lock timings.
pub(crate) fn store_in(dir: &Path) -> HistoryStore {
    HistoryStore::new(dir.join("history.json"), dir.join("history.csv"))
        .with_lock_timeout(Duration::from_secs(30))
}

pub(crate) fn social_post_input() -> BTreeMap<String, String> {
    input([
        ("dish_name", "Pasta"),
        ("theme", "Italian"),
        ("tone", "fun"),
    ])
}

pub(crate) fn review_reply_input() -> BTreeMap<String, String> {
    input([
        ("review_text", "Great food"),
        ("sentiment", "positive"),
        ("tone", "warm"),
    ])
}

pub(crate) fn append_social_post(store: &HistoryStore, output: &str) {
    store
        .append(EntryType::SocialPost, social_post_input(), output)
        .unwrap();
}
