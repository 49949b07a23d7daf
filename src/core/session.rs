use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};
use tracing::warn;
use super::errors::{PostError, Result};
use super::traits::SessionStore;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const USER_ID_KEY: &str = "userId";

fn poisoned<T>(_: T) -> PostError {
    PostError::internal_error("Session lock poisoned")
}

/// 读锁中毒时仍然读取数据, 避免把已有 token 当成未登录
fn read_entries(entries: &RwLock<HashMap<String, String>>) -> RwLockReadGuard<'_, HashMap<String, String>> {
    entries.read().unwrap_or_else(|err| {
        warn!("session lock poisoned, reading last written entries");
        err.into_inner()
    })
}

/// 纯内存会话
#[derive(Debug, Default)]
pub struct MemorySession {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(ACCESS_TOKEN_KEY.to_string(), token.to_string());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        read_entries(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

/// 以 toml 文件持久化的会话, 每次写入都会落盘
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileSession {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|err| PostError::Config(format!("Can't read session file {}: {}", path.display(), err)))?;
            toml::from_str(&content)
                .map_err(|err| PostError::Config(format!("Invalid session file {}: {}", path.display(), err)))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let content = toml::to_string(entries)
            .map_err(|err| PostError::internal_error(err.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|err| PostError::internal_error(format!("Can't write session file {}: {}", self.path.display(), err)))?;
        Ok(())
    }

    /// 先落盘再更新内存, 写盘失败时两边保持一致
    fn update(&self, edit: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let mut next = entries.clone();
        edit(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

impl SessionStore for FileSession {
    fn get(&self, key: &str) -> Option<String> {
        read_entries(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(HashMap::clear)
    }
}
