//! Name-pair whitelist.
//!
//! Registration and login may be limited to a roster of people, each keyed by
//! their Chinese name with the English name as the second factor. The roster
//! is loaded from CSV (`id,chinese_name,english_name`); entries added at
//! runtime are appended to a second CSV so they survive restarts.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum WhitelistError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: expected at least 3 comma-separated fields")]
    Malformed { path: PathBuf, line: usize },

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("failed to append to {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Decides who may register and log in.
pub trait Whitelist: Send + Sync {
    fn is_authorized(&self, chinese_name: &str, english_name: &str) -> bool;

    fn add(&self, chinese_name: &str, english_name: &str) -> Result<(), WhitelistError>;
}

/// Whitelist backed by roster CSV files.
#[derive(Debug, Default)]
pub struct RosterWhitelist {
    entries: RwLock<HashMap<String, String>>,
    additions: Option<PathBuf>,
}

impl RosterWhitelist {
    /// Load the roster and, if present, the file of runtime additions. Later
    /// rows win when a Chinese name appears twice.
    pub fn load(roster: &Path, additions: Option<&Path>) -> Result<Self, WhitelistError> {
        let mut entries = HashMap::new();
        read_roster(roster, &mut entries)?;
        if let Some(path) = additions {
            if path.exists() {
                read_roster(path, &mut entries)?;
            }
        }

        info!(path = %roster.display(), entries = entries.len(), "Whitelist loaded");

        Ok(Self {
            entries: RwLock::new(entries),
            additions: additions.map(Path::to_path_buf),
        })
    }

    /// An in-memory roster with no backing file.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(cn, en)| (cn.to_string(), en.to_string()))
            .collect();
        Self {
            entries: RwLock::new(entries),
            additions: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Whitelist for RosterWhitelist {
    fn is_authorized(&self, chinese_name: &str, english_name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(chinese_name)
            .is_some_and(|en| en == english_name)
    }

    fn add(&self, chinese_name: &str, english_name: &str) -> Result<(), WhitelistError> {
        let chinese_name = chinese_name.trim();
        let english_name = english_name.trim();
        for name in [chinese_name, english_name] {
            if name.is_empty() || name.contains([',', '\n', '\r', '"']) {
                return Err(WhitelistError::InvalidName(name.to_string()));
            }
        }

        if let Some(path) = &self.additions {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| WhitelistError::Append {
                    path: path.clone(),
                    source,
                })?;
            writeln!(file, "X,{chinese_name},{english_name}").map_err(|source| {
                WhitelistError::Append {
                    path: path.clone(),
                    source,
                }
            })?;
        }

        let previous = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(chinese_name.to_string(), english_name.to_string());
        if let Some(previous) = previous {
            warn!(chinese_name, previous = %previous, english_name, "Whitelist entry replaced");
        } else {
            info!(chinese_name, english_name, "Whitelist entry added");
        }
        Ok(())
    }
}

fn read_roster(path: &Path, entries: &mut HashMap<String, String>) -> Result<(), WhitelistError> {
    let content = std::fs::read_to_string(path).map_err(|source| WhitelistError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(|f| f.trim().trim_matches('"')).collect();
        let (Some(cn), Some(en)) = (fields.get(1), fields.get(2)) else {
            return Err(WhitelistError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
            });
        };
        entries.insert((*cn).to_string(), (*en).to_string());
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pair_must_match() {
        let list = RosterWhitelist::from_pairs([("张三", "zhangsan")]);
        assert!(list.is_authorized("张三", "zhangsan"));
        assert!(!list.is_authorized("张三", "lisi"));
        assert!(!list.is_authorized("李四", "zhangsan"));
    }

    #[test]
    fn loads_roster_and_additions() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        let additions = dir.path().join("new_users.csv");
        std::fs::write(&roster, "1,张三,zhangsan\n\n2,李四,lisi\n").unwrap();
        std::fs::write(&additions, "X,王五,wangwu\n").unwrap();

        let list = RosterWhitelist::load(&roster, Some(&additions)).unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.is_authorized("王五", "wangwu"));
    }

    #[test]
    fn malformed_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        std::fs::write(&roster, "1,张三,zhangsan\nbroken\n").unwrap();

        let err = RosterWhitelist::load(&roster, None).unwrap_err();
        assert!(matches!(err, WhitelistError::Malformed { line: 2, .. }), "{err}");
    }

    #[test]
    fn added_entries_persist() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        let additions = dir.path().join("new_users.csv");
        std::fs::write(&roster, "1,张三,zhangsan\n").unwrap();

        let list = RosterWhitelist::load(&roster, Some(&additions)).unwrap();
        list.add("赵六", "zhaoliu").unwrap();
        assert!(list.is_authorized("赵六", "zhaoliu"));

        let reloaded = RosterWhitelist::load(&roster, Some(&additions)).unwrap();
        assert!(reloaded.is_authorized("赵六", "zhaoliu"));
    }

    #[test]
    fn rejects_names_that_break_csv() {
        let list = RosterWhitelist::default();
        assert!(list.add("a,b", "c").is_err());
        assert!(list.add("", "c").is_err());
        assert!(list.is_empty());
    }
}
