use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::app::ports::{CandidateListPort, HostOutputPort};
use crate::domain::StarRecord;
use crate::pipeline::storage::lists::format_names;
use crate::pipeline::storage::rdb::format_record;

/// File-based implementation of HostOutputPort and CandidateListPort.
pub struct FileHostOutputAdapter {
    /// RDB file new records are appended to
    pub output: PathBuf,
    /// Candidate list rewritten after every star
    pub names: PathBuf,
    pub manual: PathBuf,
}

impl FileHostOutputAdapter {
    pub fn new(output: PathBuf, names: PathBuf, manual: PathBuf) -> Self {
        Self {
            output,
            names,
            manual,
        }
    }

    async fn ensure_parent(path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!("Failed to create output directory {:?}: {}", parent, e)
                })?;
                debug!("Created output directory: {:?}", parent);
            }
        }
        Ok(())
    }

    async fn rewrite_names(&self, names: &[String]) -> anyhow::Result<()> {
        Self::ensure_parent(&self.names).await?;
        tokio::fs::write(&self.names, format_names(names))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to rewrite {:?}: {}", self.names, e))
    }

    /// Append `line` on a line of its own, even when the file lacks a final newline.
    async fn append_line(path: &Path, line: &str) -> anyhow::Result<()> {
        Self::ensure_parent(path).await?;

        let needs_break = match tokio::fs::read(path).await {
            Ok(existing) => existing.last().is_some_and(|b| *b != b'\n'),
            Err(_) => false,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open {:?}: {}", path, e))?;

        let mut content = String::with_capacity(line.len() + 2);
        if needs_break {
            content.push('\n');
        }
        content.push_str(line);
        content.push('\n');

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write to {:?}: {}", path, e))?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl CandidateListPort for FileHostOutputAdapter {
    async fn write_candidates(&self, names: &[String]) -> anyhow::Result<()> {
        self.rewrite_names(names).await?;
        debug!("Wrote {} candidates to {:?}", names.len(), self.names);
        Ok(())
    }
}

#[async_trait]
impl HostOutputPort for FileHostOutputAdapter {
    async fn append_record(&self, record: &StarRecord) -> anyhow::Result<()> {
        Self::append_line(&self.output, &format_record(record)).await?;
        debug!("Appended {} to {:?}", record.name, self.output);
        Ok(())
    }

    async fn write_remaining(&self, names: &[String]) -> anyhow::Result<()> {
        self.rewrite_names(names).await?;
        debug!("{} names left in {:?}", names.len(), self.names);
        Ok(())
    }

    async fn append_manual(&self, name: &str) -> anyhow::Result<()> {
        Self::append_line(&self.manual, name.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::storage::rdb::Catalog;

    fn adapter(dir: &Path) -> FileHostOutputAdapter {
        FileHostOutputAdapter::new(
            dir.join("out/add.rdb"),
            dir.join("names.txt"),
            dir.join("manual.list"),
        )
    }

    #[tokio::test]
    async fn test_append_record_keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = adapter(dir.path());
        tokio::fs::create_dir_all(dir.path().join("out")).await.unwrap();
        let existing = format_record(&StarRecord::empty("Old"));
        tokio::fs::write(&adapter.output, &existing).await.unwrap();

        adapter.append_record(&StarRecord::empty("New")).await.unwrap();

        let content = tokio::fs::read_to_string(&adapter.output).await.unwrap();
        assert!(content.starts_with(&format!("{}\n", existing)));
        let catalog = Catalog::parse(&content);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[1].name, "New");
    }

    #[tokio::test]
    async fn test_remaining_and_manual_lists() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = adapter(dir.path());

        adapter
            .write_remaining(&["B".to_string(), "C".to_string()])
            .await
            .unwrap();
        adapter.write_remaining(&["C".to_string()]).await.unwrap();
        adapter.append_manual("X").await.unwrap();
        adapter.append_manual(" Y ").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&adapter.names).await.unwrap(), "C\n");

        adapter.write_candidates(&[]).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&adapter.names).await.unwrap(), "");
        assert_eq!(tokio::fs::read_to_string(&adapter.manual).await.unwrap(), "X\nY\n");
    }
}
