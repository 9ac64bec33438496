use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::task::spawn_blocking;

const DEFAULT_EXTENSIONS: [&str; 5] = [".txt", ".json", ".csv", ".md", ".py"];
const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// Facts about a path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// The final component.
    pub name: String,
    /// The absolute path.
    pub path: PathBuf,
    /// Size in bytes, `0` when missing.
    pub size: u64,
    /// The extension with its leading dot, or empty.
    pub extension: String,
    /// Whether the path exists.
    pub exists: bool,
}

/// Guarded file access: only some extensions, only files below a size cap.
#[derive(Clone, Debug)]
pub struct FileOps {
    allowed_extensions: Vec<String>,
    max_size_bytes: u64,
}

impl Default for FileOps {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS, DEFAULT_MAX_SIZE_MB)
    }
}

impl FileOps {
    /// Creates file operations limited to `extensions` (with the leading
    /// dot) and files of at most `max_size_mb` megabytes.
    pub fn new<I, S>(extensions: I, max_size_mb: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_extensions: extensions.into_iter().map(Into::into).collect(),
            max_size_bytes: max_size_mb * 1024 * 1024,
        }
    }

    /// Describes a path. Never fails; a missing file is reported through
    /// [`FileInfo::exists`].
    pub fn get_file_info<P: AsRef<Path>>(&self, path: P) -> FileInfo {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).ok();
        FileInfo {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: std::path::absolute(path).unwrap_or_else(|_| path.to_owned()),
            size: metadata.as_ref().map_or(0, |m| m.len()),
            extension: extension_of(path),
            exists: metadata.is_some(),
        }
    }

    /// Reads a UTF-8 text file.
    pub async fn read_text_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<String, FileOpError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                FileOpError::NotFound(path.to_owned())
            } else {
                FileOpError::io(path, err)
            }
        })?;
        self.check_extension(path)?;
        self.check_size(metadata.len())?;

        let content = fs::read_to_string(path)
            .await
            .map_err(|err| FileOpError::io(path, err))?;
        info!("successfully read file: {}", path.display());
        Ok(content)
    }

    /// Writes a text file, creating missing parent directories.
    pub async fn write_text_file<P: AsRef<Path>>(
        &self,
        path: P,
        content: &str,
    ) -> Result<(), FileOpError> {
        let path = path.as_ref();
        self.check_extension(path)?;
        create_parent(path).await?;
        fs::write(path, content)
            .await
            .map_err(|err| FileOpError::io(path, err))?;
        info!("successfully wrote file: {}", path.display());
        Ok(())
    }

    /// Reads and parses a JSON file.
    pub async fn read_json_file<T, P>(&self, path: P) -> Result<T, FileOpError>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let content = self.read_text_file(&path).await?;
        serde_json::from_str(&content).map_err(FileOpError::Json)
    }

    /// Writes a value as pretty-printed JSON.
    pub async fn write_json_file<T, P>(
        &self,
        path: P,
        data: &T,
    ) -> Result<(), FileOpError>
    where
        T: Serialize + ?Sized,
        P: AsRef<Path>,
    {
        let content =
            serde_json::to_string_pretty(data).map_err(FileOpError::Json)?;
        self.write_text_file(path, &content).await
    }

    /// Lists the files in `dir` matching the glob `pattern`.
    ///
    /// Directories are skipped.
    pub async fn list_directory<P: AsRef<Path>>(
        &self,
        dir: P,
        pattern: &str,
    ) -> Result<Vec<FileInfo>, FileOpError> {
        let dir = dir.as_ref();
        if !fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
            return Err(FileOpError::NotADirectory(dir.to_owned()));
        }

        let full_pattern = dir.join(pattern);
        let paths = glob::glob(&full_pattern.to_string_lossy())
            .map_err(|err| FileOpError::Pattern(err.to_string()))?;
        let ops = self.clone();
        let files = spawn_blocking(move || {
            paths
                .flatten()
                .filter(|path| path.is_file())
                .map(|path| ops.get_file_info(path))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|err| FileOpError::io(dir, io::Error::other(err)))?;

        info!("listed {} files in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Downloads `url` into `path`.
    pub async fn download_file<P: AsRef<Path>>(
        &self,
        url: &str,
        path: P,
        timeout: Duration,
    ) -> Result<(), FileOpError> {
        let path = path.as_ref();
        self.check_extension(path)?;

        let body = reqwest::Client::new()
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(FileOpError::Http)?
            .bytes()
            .await
            .map_err(FileOpError::Http)?;
        self.check_size(body.len() as u64)?;

        create_parent(path).await?;
        fs::write(path, &body)
            .await
            .map_err(|err| FileOpError::io(path, err))?;
        info!("successfully downloaded {url} to {}", path.display());
        Ok(())
    }

    fn check_extension(&self, path: &Path) -> Result<(), FileOpError> {
        let extension = extension_of(path);
        if self.allowed_extensions.iter().any(|ext| *ext == extension) {
            Ok(())
        } else {
            error!("file extension not allowed: {extension:?}");
            Err(FileOpError::ExtensionNotAllowed(extension))
        }
    }

    fn check_size(&self, size: u64) -> Result<(), FileOpError> {
        if size > self.max_size_bytes {
            error!("file too large: {size} bytes");
            return Err(FileOpError::TooLarge(size));
        }
        Ok(())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

async fn create_parent(path: &Path) -> Result<(), FileOpError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|err| FileOpError::io(parent, err)),
        _ => Ok(()),
    }
}

/// The error type of [`FileOps`].
#[derive(Debug)]
pub enum FileOpError {
    /// The file does not exist.
    NotFound(PathBuf),
    /// The path is not a directory.
    NotADirectory(PathBuf),
    /// The extension is not in the allow list.
    ExtensionNotAllowed(String),
    /// The file exceeds the size cap, in bytes.
    TooLarge(u64),
    /// The glob pattern is invalid.
    Pattern(String),
    /// The content is not valid JSON, or the value cannot be serialized.
    Json(serde_json::Error),
    /// The download failed.
    Http(reqwest::Error),
    /// Any other I/O error.
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl FileOpError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }
}

impl Display for FileOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOpError::NotFound(path) => {
                write!(f, "file does not exist: {}", path.display())
            }
            FileOpError::NotADirectory(path) => {
                write!(f, "not a directory: {}", path.display())
            }
            FileOpError::ExtensionNotAllowed(ext) => {
                write!(f, "file extension not allowed: {ext:?}")
            }
            FileOpError::TooLarge(size) => write!(f, "file too large: {size} bytes"),
            FileOpError::Pattern(reason) => write!(f, "invalid pattern: {reason}"),
            FileOpError::Json(err) => write!(f, "invalid JSON: {err}"),
            FileOpError::Http(err) => write!(f, "download failed: {err}"),
            FileOpError::Io { path, source } => {
                write!(f, "{}: {source}", path.display())
            }
        }
    }
}

impl StdError for FileOpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FileOpError::Json(err) => Some(err),
            FileOpError::Http(err) => Some(err),
            FileOpError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[tokio::test]
    async fn test_write_then_read_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/notes.md");
        let ops = FileOps::default();

        ops.write_text_file(&path, "# hello").await.unwrap();
        assert_eq!(ops.read_text_file(&path).await.unwrap(), "# hello");

        let info = ops.get_file_info(&path);
        assert!(info.exists);
        assert_eq!(info.name, "notes.md");
        assert_eq!(info.extension, ".md");
        assert_eq!(info.size, 7);
        assert!(info.path.is_absolute());
    }

    #[tokio::test]
    async fn test_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let ops = FileOps::default();

        let err = ops
            .write_text_file(dir.path().join("run.sh"), "echo")
            .await
            .unwrap_err();
        assert!(matches!(err, FileOpError::ExtensionNotAllowed(ext) if ext == ".sh"));

        let err = ops
            .read_text_file(dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileOpError::NotFound(_)));

        let tiny = FileOps::new([".txt"], 0);
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "x").unwrap();
        let err = tiny.read_text_file(&path).await.unwrap_err();
        assert!(matches!(err, FileOpError::TooLarge(1)));

        let info = ops.get_file_info(dir.path().join("missing.txt"));
        assert!(!info.exists);
        assert_eq!(info.size, 0);
    }

    #[tokio::test]
    async fn test_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let ops = FileOps::default();

        ops.write_json_file(&path, &json!({"a": [1, 2]})).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"a\": [\n    1,\n    2\n  ]\n}");

        let value: Value = ops.read_json_file(&path).await.unwrap();
        assert_eq!(value, json!({"a": [1, 2]}));

        std::fs::write(&path, "{oops").unwrap();
        let err = ops.read_json_file::<Value, _>(&path).await.unwrap_err();
        assert!(matches!(err, FileOpError::Json(_)));
    }

    #[tokio::test]
    async fn test_list_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("sub.txt")).unwrap();
        let ops = FileOps::default();

        let mut names: Vec<_> = ops
            .list_directory(dir.path(), "*")
            .await
            .unwrap()
            .into_iter()
            .map(|info| info.name)
            .collect();
        names.sort();
        assert_eq!(names, ["a.txt", "b.json"]);

        let txt = ops.list_directory(dir.path(), "*.txt").await.unwrap();
        assert_eq!(txt.len(), 1);

        let err = ops
            .list_directory(dir.path().join("a.txt"), "*")
            .await
            .unwrap_err();
        assert!(matches!(err, FileOpError::NotADirectory(_)));
    }
}
