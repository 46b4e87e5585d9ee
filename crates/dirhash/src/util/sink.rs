use crate::error::{DirhashError, Result};
use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const OUT_DIR_PREFIX: &str = "out_dir_";
pub const LOG_FILE: &str = "log.txt";

/// Creates a fresh, timestamp-named output directory under `base`.
pub fn create_output_dir<P: AsRef<Path>>(base: P) -> Result<PathBuf> {
    let base = base.as_ref();
    let now = Utc::now();
    let dir = base.join(format!(
        "{}{}.{:06}",
        OUT_DIR_PREFIX,
        now.timestamp(),
        now.timestamp_subsec_micros()
    ));

    fs::create_dir_all(base).map_err(|e| DirhashError::file_io(base, e))?;
    fs::create_dir(&dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => DirhashError::AlreadyExists(dir.clone()),
        _ => DirhashError::file_io(&dir, e),
    })?;

    log::debug!("Created output directory {}", dir.display());
    Ok(dir)
}

/// Text sink that appends every line to one or more files and optionally echoes it.
///
/// Each line is flushed before `line` returns so the artifacts stay readable if
/// the process dies.
pub struct LogSink {
    files: Vec<(PathBuf, BufWriter<File>)>,
    echo: bool,
}

impl LogSink {
    pub fn create<P: AsRef<Path>>(path: P, echo: bool) -> Result<Self> {
        let mut sink = Self {
            files: Vec::new(),
            echo,
        };
        sink.add_file(path)?;
        Ok(sink)
    }

    /// Duplicates all subsequent output into another file.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DirhashError::file_io(path, e))?;
        self.files.push((path.to_path_buf(), BufWriter::new(file)));
        Ok(())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(p, _)| p.as_path())
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        let text = text.as_ref();
        if self.echo {
            println!("{}", text);
        }
        for (path, writer) in &mut self.files {
            writeln!(writer, "{}", text)
                .and_then(|_| writer.flush())
                .map_err(|e| DirhashError::file_io(path.as_path(), e))?;
        }
        Ok(())
    }

    /// Failures always reach the console, on stderr, regardless of `echo`.
    pub fn error(&mut self, text: impl AsRef<str>) -> Result<()> {
        let text = text.as_ref();
        eprintln!("{}", text);
        log::error!("{}", text);

        let echo = std::mem::replace(&mut self.echo, false);
        let result = self.line(text);
        self.echo = echo;
        result
    }
}
