use async_trait::async_trait;
use bulkmill_core::{Command, Consumer, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

struct OpenLog {
    path: PathBuf,
    writer: BufWriter<File>,
    lines: usize,
}

/// Writes every group into its own file, one body per line.
///
/// The file is named after the first item of the group,
/// `bulk<epoch-seconds>.log`. Groups that start within the same second get a
/// `-1`, `-2`, ... suffix so earlier output is never overwritten.
pub struct FileSink {
    directory: PathBuf,
    current: Option<OpenLog>,
    files_written: u64,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            current: None,
            files_written: 0,
        }
    }

    /// Create the output directory if needed
    pub async fn create(directory: impl Into<PathBuf>) -> Result<Self> {
        let sink = Self::new(directory);
        tokio::fs::create_dir_all(&sink.directory).await?;
        Ok(sink)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn files_written(&self) -> u64 {
        self.files_written
    }

    async fn open(&self, command: &Command) -> Result<OpenLog> {
        let stem = format!("bulk{}", command.epoch_seconds());
        let mut attempt = 0u32;

        loop {
            let file_name = match attempt {
                0 => format!("{stem}.log"),
                n => format!("{stem}-{n}.log"),
            };
            let path = self.directory.join(file_name);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    return Ok(OpenLog {
                        path,
                        writer: BufWriter::new(file),
                        lines: 0,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl Consumer for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn receive(&mut self, command: &Command) -> Result<()> {
        let log = match self.current.take() {
            Some(log) => log,
            None => self.open(command).await?,
        };
        let log = self.current.insert(log);

        log.writer.write_all(command.body().as_bytes()).await?;
        log.writer.write_all(b"\n").await?;
        log.lines += 1;
        Ok(())
    }

    async fn relax(&mut self) -> Result<()> {
        let Some(mut log) = self.current.take() else {
            return Ok(());
        };

        log.writer.flush().await?;
        self.files_written += 1;
        tracing::debug!(path = %log.path.display(), lines = log.lines, "Bulk log written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64, body: &str) -> Command {
        Command::new(Utc.timestamp_opt(secs, 0).unwrap(), body)
    }

    #[tokio::test]
    async fn test_group_is_written_to_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());

        sink.receive(&at(1_700_000_000, "a, b")).await.unwrap();
        sink.receive(&at(1_700_000_005, "c")).await.unwrap();
        sink.relax().await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("bulk1700000000.log")).unwrap();
        assert_eq!(content, "a, b\nc\n");
        assert_eq!(sink.files_written(), 1);
    }

    #[tokio::test]
    async fn test_same_second_groups_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());

        for body in ["first", "second", "third"] {
            sink.receive(&at(42, body)).await.unwrap();
            sink.relax().await.unwrap();
        }

        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("bulk42.log"), "first\n");
        assert_eq!(read("bulk42-1.log"), "second\n");
        assert_eq!(read("bulk42-2.log"), "third\n");
    }

    #[tokio::test]
    async fn test_relax_without_items_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());

        sink.relax().await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(sink.files_written(), 0);
    }

    #[tokio::test]
    async fn test_create_makes_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("bulks");

        let mut sink = FileSink::create(&nested).await.unwrap();
        sink.receive(&at(1, "x")).await.unwrap();
        sink.relax().await.unwrap();

        assert!(nested.join("bulk1.log").exists());
        assert_eq!(sink.directory(), nested.as_path());
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("absent"));

        assert!(sink.receive(&at(1, "x")).await.is_err());
    }
}
