use crate::dark_regions::format::header_line;
use crate::dark_regions::types::RegionCategory;
use crate::error::{DarkRegionError, Result};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

/// Destinations of the three region files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub incomplete: PathBuf,
    pub low_depth: PathBuf,
    pub low_mapq: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            incomplete: PathBuf::from("incomplete.bed"),
            low_depth: PathBuf::from("low_coverage.dark.bed"),
            low_mapq: PathBuf::from("low_mapq.dark.bed"),
        }
    }
}

impl OutputPaths {
    pub fn path(&self, category: RegionCategory) -> &Path {
        match category {
            RegionCategory::Incomplete => &self.incomplete,
            RegionCategory::LowDepthDark => &self.low_depth,
            RegionCategory::LowMapqDark => &self.low_mapq,
        }
    }

    /// Inserts `.salt_<salt>` before each file's last extension. Device paths are kept.
    pub fn salted(&self, salt: &str) -> OutputPaths {
        OutputPaths {
            incomplete: salted_path(&self.incomplete, salt),
            low_depth: salted_path(&self.low_depth, salt),
            low_mapq: salted_path(&self.low_mapq, salt),
        }
    }

    /// Picks a salt none of the three salted names is using and creates empty placeholders
    /// for them, so concurrent runs writing into one directory never share a destination.
    pub fn reserve_unique(&self) -> Result<(OutputPaths, OutputReservation)> {
        let anchor = RegionCategory::ALL
            .into_iter()
            .map(|category| self.path(category))
            .find(|path| !is_device(path));
        let anchor = match anchor {
            Some(anchor) => anchor,
            None => return Ok((self.clone(), OutputReservation::default())),
        };

        let (stem, extension) = split_extension(anchor);
        let prefix = format!("{}.salt_", stem);
        let dir = parent_dir(anchor);
        'salts: loop {
            let placeholder = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&extension)
                .rand_bytes(SALT_LENGTH)
                .tempfile_in(dir)
                .map_err(|source| DarkRegionError::Output {
                    path: anchor.to_path_buf(),
                    source,
                })?
                .into_temp_path();
            let name = placeholder
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let salt = name[prefix.len()..name.len() - extension.len()].to_string();

            let salted = self.salted(&salt);
            let mut reservation = OutputReservation {
                placeholders: vec![placeholder],
            };
            for category in RegionCategory::ALL {
                let path = salted.path(category);
                if is_device(path) || reservation.holds(path) {
                    continue;
                }
                match OpenOptions::new().write(true).create_new(true).open(path) {
                    Ok(_) => reservation.placeholders.push(TempPath::from_path(path)),
                    // Dropping the reservation removes what was already created.
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue 'salts,
                    Err(source) => {
                        return Err(DarkRegionError::Output {
                            path: path.to_path_buf(),
                            source,
                        })
                    }
                }
            }
            return Ok((salted, reservation));
        }
    }
}

const SALT_LENGTH: usize = 5;

/// Empty files holding salted output names until the run finishes.
///
/// Dropping it deletes the placeholders; [`release`](Self::release) leaves whatever now
/// sits at those paths alone.
#[derive(Debug, Default)]
pub struct OutputReservation {
    placeholders: Vec<TempPath>,
}

impl OutputReservation {
    fn holds(&self, path: &Path) -> bool {
        self.placeholders.iter().any(|held| &**held == path)
    }

    pub fn release(self) -> Result<()> {
        for placeholder in self.placeholders {
            placeholder.keep().map_err(|e| DarkRegionError::Output {
                path: e.path.to_path_buf(),
                source: e.error,
            })?;
        }
        Ok(())
    }
}

fn is_device(path: &Path) -> bool {
    path.starts_with("/dev")
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// File name without its last extension, and that extension with its dot.
fn split_extension(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) if dot > 0 => (name[..dot].to_string(), name[dot..].to_string()),
        _ => (name, String::new()),
    }
}

fn salted_path(path: &Path, salt: &str) -> PathBuf {
    if is_device(path) {
        return path.to_path_buf();
    }
    let (stem, extension) = split_extension(path);
    path.with_file_name(format!("{}.salt_{}{}", stem, salt, extension))
}

/// A BED file that only appears at its destination once [`commit`](Self::commit) is called.
///
/// Rows go to a temporary file in the destination directory which is renamed over the
/// destination on commit; dropping an uncommitted output removes it. Device paths such as
/// `/dev/stdout` are written in place. A `.gz` destination is gzip-compressed.
pub struct BedOutput {
    destination: PathBuf,
    staged: Option<TempPath>,
    writer: Box<dyn Write>,
}

impl BedOutput {
    pub fn create(destination: &Path) -> Result<Self> {
        let output_error = |source: io::Error| DarkRegionError::Output {
            path: destination.to_path_buf(),
            source,
        };

        let (file, staged) = if is_device(destination) {
            let file = OpenOptions::new()
                .write(true)
                .open(destination)
                .map_err(output_error)?;
            (file, None)
        } else {
            let (file, path) = NamedTempFile::new_in(parent_dir(destination))
                .map_err(output_error)?
                .into_parts();
            (file, Some(path))
        };

        let writer: Box<dyn Write> = if is_gzip(destination) {
            niffler::get_writer(
                Box::new(file),
                niffler::compression::Format::Gzip,
                niffler::Level::Six,
            )
            .map_err(|e| output_error(io::Error::other(e)))?
        } else {
            Box::new(file)
        };

        Ok(Self {
            destination: destination.to_path_buf(),
            staged,
            writer: Box::new(BufWriter::new(writer)),
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Flushes and moves the staged file into place.
    pub fn commit(mut self) -> Result<()> {
        let output_error = |source: io::Error| DarkRegionError::Output {
            path: self.destination.clone(),
            source,
        };
        self.writer.flush().map_err(output_error)?;
        // Dropping the writer finishes the gzip stream and closes the file.
        let writer = std::mem::replace(&mut self.writer, Box::new(io::sink()));
        drop(writer);

        if let Some(staged) = self.staged.take() {
            staged
                .persist(&self.destination)
                .map_err(|e| output_error(e.error))?;
            set_readable(&self.destination).map_err(output_error)?;
        }
        Ok(())
    }
}

impl Write for BedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

#[cfg(unix)]
fn set_readable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// The three region files of one run, indexed by [`RegionCategory::index`].
pub struct RegionOutputs {
    outputs: [BedOutput; 3],
}

impl RegionOutputs {
    pub fn create(paths: &OutputPaths, write_header: bool) -> Result<Self> {
        let mut outputs = [
            BedOutput::create(paths.path(RegionCategory::Incomplete))?,
            BedOutput::create(paths.path(RegionCategory::LowDepthDark))?,
            BedOutput::create(paths.path(RegionCategory::LowMapqDark))?,
        ];
        if write_header {
            for category in RegionCategory::ALL {
                let output = &mut outputs[category.index()];
                writeln!(output, "{}", header_line(category)).map_err(|source| {
                    DarkRegionError::Output {
                        path: output.destination().to_path_buf(),
                        source,
                    }
                })?;
            }
        }
        Ok(Self { outputs })
    }

    pub fn sinks_mut(&mut self) -> &mut [BedOutput; 3] {
        &mut self.outputs
    }

    pub fn commit(self) -> Result<()> {
        for output in self.outputs {
            output.commit()?;
        }
        Ok(())
    }
}
