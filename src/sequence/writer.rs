use crate::sequence::window::TimeWindow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write one line per window: every event ID followed by a space, then a
/// newline. Empty windows become empty lines.
pub fn write_windows<W: Write>(mut writer: W, windows: &[TimeWindow]) -> io::Result<()> {
    for window in windows {
        for id in &window.events {
            write!(writer, "{} ", id)?;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Replace `path` with the serialized windows.
///
/// Output goes to a hidden sibling file first and is renamed over `path`
/// once fully written, so a failure never leaves a truncated sequence file
/// under the final name.
pub fn write_sequence_file(path: &Path, windows: &[TimeWindow]) -> Result<(), WriteError> {
    let tmp_path = staging_path(path);

    let result = File::create(&tmp_path)
        .and_then(|file| write_windows(BufWriter::new(file), windows))
        .and_then(|()| fs::rename(&tmp_path, path));

    result.map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
