use anyhow::anyhow;
use formatx::formatx;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::str::from_utf8;
use std::sync::Arc;

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes each location key to its own file in a directory, named by filling the key into
/// `file_template` (e.g. `"{}.csv"`).
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }

    pub fn file_path(&self, location_key: &str) -> anyhow::Result<PathBuf> {
        let file_name = formatx!(&self.file_template, location_key)
            .map_err(|err| anyhow!("Invalid output file template '{}': {err:?}", self.file_template))?;
        Ok(self.directory_path.join(file_name))
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        std::fs::create_dir_all(&self.directory_path)?;
        Ok(BufWriter::new(File::create(self.file_path(location_key)?)?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Keeps every written "file" as a string in memory, keyed by location key.
#[derive(Clone, Debug, Default)]
pub struct MemoryOutput(Arc<Mutex<IndexMap<String, String>>>);

impl MemoryOutput {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn location_keys(&self) -> Vec<String> {
        self.0.lock().keys().cloned().collect()
    }

    pub fn contents(&self, location_key: &str) -> Option<String> {
        self.0.lock().get(location_key).cloned()
    }
}

impl Output for MemoryOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        // a new writer for a key replaces what was there, as a new file would
        self.0.lock().insert(location_key.to_string(), String::new());
        Ok(MemoryFileWriter {
            files: self.0.clone(),
            location_key: location_key.to_string(),
        })
    }
}

impl Output for &MemoryOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <MemoryOutput as Output>::writer_for_location_key(self, location_key)
    }
}

struct MemoryFileWriter {
    files: Arc<Mutex<IndexMap<String, String>>>,
    location_key: String,
}

impl Write for MemoryFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let utf8 = from_utf8(buf)
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Tried to write out invalid UTF-8."))?;
        self.files
            .lock()
            .entry(self.location_key.clone())
            .or_default()
            .push_str(utf8);
        Ok(utf8.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
