use super::*;
use qlib_core::ENV_LIBPATH;
use qlib_core::Error;
use qlib_core::LIBRARY_PREFIX;
use qlib_core::LIBRARY_SUFFIX;
use std::path::Path;
use std::path::PathBuf;

/// Where a library comes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// An ILF file at an explicit location.
    Path(PathBuf),
    /// A name fragment, found as `lib{NAME}.sql` on the search path.
    Name(String),
    /// Symbols declared in code.
    Annotated {
        name: String,
        annotations: Annotations,
    },
}

impl From<&str> for Source {
    /// Strings holding a path separator are paths; anything else is a name.
    fn from(s: &str) -> Self {
        match s.contains(std::path::MAIN_SEPARATOR) || s.contains('/') {
            true => Self::Path(PathBuf::from(s)),
            false => Self::Name(s.to_string()),
        }
    }
}
impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}
impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Library name implied by a file: `libusers.sql` is `users`; any other
/// file is named by its stem.
pub fn library_name(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file
        .strip_prefix(LIBRARY_PREFIX)
        .and_then(|f| f.strip_suffix(LIBRARY_SUFFIX))
        .filter(|name| !name.is_empty())
    {
        Some(name) => name.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone()),
    }
}

/// Resolves [`Source`]s into libraries against a search path.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    paths: Vec<PathBuf>,
}

impl Loader {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
    /// Search path taken from `QLIB_LIBPATH`, empty if unset.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os(ENV_LIBPATH)
                .map(|v| std::env::split_paths(&v).collect::<Vec<_>>())
                .unwrap_or_default(),
        )
    }
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
    /// Finds `lib{name}.sql` in the first search directory holding it.
    pub fn find(&self, name: &str) -> Result<PathBuf, Error> {
        let file = format!("{}{}{}", LIBRARY_PREFIX, name, LIBRARY_SUFFIX);
        self.paths
            .iter()
            .map(|dir| dir.join(&file))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
                searched: self.paths.clone(),
            })
    }
    pub fn load(&self, source: impl Into<Source>) -> Result<Library, Error> {
        match source.into() {
            Source::Annotated { name, annotations } => Ok(Library::build(name, annotations)?),
            Source::Path(path) => Self::read(&path),
            Source::Name(name) => Self::read(&self.find(&name)?),
        }
    }
    fn read(path: &Path) -> Result<Library, Error> {
        log::debug!("loading library from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Library::build(library_name(path), text.as_str())?)
    }
}

/// Loads a library using the search path from the environment.
pub fn load(source: impl Into<Source>) -> Result<Library, Error> {
    Loader::from_env().load(source)
}
