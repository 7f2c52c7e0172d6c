// Import walker: maps files and top-level directories on disk to notes
// and notebooks on the remote service.
//
// - A file becomes one note (title = file name).
// - A directory becomes a notebook named after it; its files become
//   notes in it. Subdirectories are never descended into.
// - Within a directory the first failure aborts that directory; across
//   command-line arguments failures are logged and the loop continues.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::api::NotebookInfo;
use crate::config::ImportOptions;
use crate::error::ApiError;
use crate::markup::text_to_html;

/// Fields of a note to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote<'a> {
    /// Notebook path; empty means the user's default notebook.
    pub notebook: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub source: &'a str,
    pub content: String,
}

/// The notebook/note operations the walker needs from the service.
pub trait NoteService {
    fn create_notebook(&self, name: &str) -> Result<NotebookInfo, ApiError>;
    fn find_notebook(&self, name: &str) -> Result<NotebookInfo, ApiError>;
    /// Returns the remote path of the new note.
    fn create_note(&self, note: &NewNote<'_>) -> Result<String, ApiError>;
}

/// Outcome of `import_paths`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: Vec<PathBuf>,
}

impl ImportSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What one directory import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirImport {
    pub notebook: NotebookInfo,
    pub imported: usize,
    /// Subfolders that were skipped, in the order they were announced.
    pub ignored_folders: Vec<String>,
}

/// Console line printed for a skipped subfolder.
pub fn ignored_folder_notice(name: &str) -> String {
    format!("  Ignoring folder: {}", name)
}

/// Upload one file as a note into `notebook_path`.
pub fn import_file<S: NoteService + ?Sized>(
    service: &S,
    opts: &ImportOptions,
    notebook_path: &str,
    file: &Path,
) -> Result<String> {
    print!("Importing {} ... ", file.display());
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let text = opts.decoder.decode(&bytes);
    let title = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let note = NewNote {
        notebook: notebook_path,
        title: &title,
        author: &opts.author,
        source: &opts.source,
        content: text_to_html(&text),
    };
    let path = service
        .create_note(&note)
        .with_context(|| format!("Creating note failed for {}", file.display()))?;
    info!(file = %file.display(), note = %path, "note created");
    Ok(path)
}

fn notebook_name(dir: &Path) -> Result<String> {
    if let Some(name) = dir.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    dir.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .ok_or_else(|| anyhow!("Cannot derive a notebook name from {}", dir.display()))
}

/// Create the notebook, or reuse the existing one of the same name.
fn find_or_create_notebook<S: NoteService + ?Sized>(service: &S, name: &str) -> Result<NotebookInfo> {
    match service.create_notebook(name) {
        Ok(nb) => {
            println!("Folder {} created!", name);
            Ok(nb)
        }
        Err(create_err) => {
            info!(notebook = name, error = %create_err, "create failed, looking up existing notebook");
            let nb = service
                .find_notebook(name)
                .with_context(|| format!("Finding notebook failed for {}", name))?;
            println!("Folder {} found!", name);
            Ok(nb)
        }
    }
}

/// Import every regular file directly inside `dir` into a notebook named
/// after it.
pub fn import_dir<S: NoteService + ?Sized>(
    service: &S,
    opts: &ImportOptions,
    dir: &Path,
) -> Result<DirImport> {
    println!("Importing files in folder {} ... ", dir.display());
    let name = notebook_name(dir)?;
    let notebook = find_or_create_notebook(service, &name)?;

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    let mut imported = 0;
    let mut ignored_folders = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name().to_string_lossy().into_owned();
            println!("{}", ignored_folder_notice(&name));
            ignored_folders.push(name);
            continue;
        }
        let note_path = import_file(service, opts, &notebook.path, &path)?;
        println!("imported: {}", note_path);
        imported += 1;
    }
    Ok(DirImport {
        notebook,
        imported,
        ignored_folders,
    })
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            warn!(error = %e, "cannot resolve working directory");
            path.to_path_buf()
        }
    }
}

/// Import each command-line path. A failing argument is reported and
/// skipped; the rest still run.
pub fn import_paths<S: NoteService + ?Sized>(
    service: &S,
    opts: &ImportOptions,
    paths: &[PathBuf],
) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for arg in paths {
        let path = absolute(arg);
        if path.is_dir() {
            match import_dir(service, opts, &path) {
                Ok(report) => summary.imported += report.imported,
                Err(e) => {
                    error!(path = %path.display(), error = %format!("{:#}", e), "directory import failed");
                    println!("Importing folder failed: {:#}", e);
                    summary.failed.push(path);
                }
            }
        } else {
            match import_file(service, opts, "", &path) {
                Ok(note_path) => {
                    println!("imported: {}", note_path);
                    summary.imported += 1;
                }
                Err(e) => {
                    error!(path = %path.display(), error = %format!("{:#}", e), "file import failed");
                    println!("Importing file failed: {:#}", e);
                    summary.failed.push(path);
                }
            }
        }
    }
    info!(imported = summary.imported, failed = summary.failed.len(), "import finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        notes: RefCell<Vec<(String, String, String)>>,
    }

    impl NoteService for Recorder {
        fn create_notebook(&self, name: &str) -> Result<NotebookInfo, ApiError> {
            Ok(NotebookInfo::new(name, format!("/{}", name)))
        }

        fn find_notebook(&self, name: &str) -> Result<NotebookInfo, ApiError> {
            Err(ApiError::NotFound(name.to_string()))
        }

        fn create_note(&self, note: &NewNote<'_>) -> Result<String, ApiError> {
            self.notes.borrow_mut().push((
                note.notebook.to_string(),
                note.title.to_string(),
                note.content.clone(),
            ));
            Ok(format!("{}/{}", note.notebook, note.title))
        }
    }

    #[test]
    fn test_import_file_builds_note() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, "a <b>\tc\n").unwrap();

        let service = Recorder::default();
        let opts = ImportOptions::default();
        let path = import_file(&service, &opts, "/nb", &file).unwrap();

        assert_eq!(path, "/nb/hello.txt");
        let notes = service.notes.borrow();
        assert_eq!(notes[0].1, "hello.txt");
        assert_eq!(notes[0].2, text_to_html("a <b>\tc\n"));
    }

    #[test]
    fn test_import_file_decodes_input() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gbk.txt");
        std::fs::write(&file, [0xD6, 0xD0, 0xCE, 0xC4]).unwrap();

        let service = Recorder::default();
        let opts = ImportOptions::new("me", "", "gbk");
        import_file(&service, &opts, "", &file).unwrap();
        assert_eq!(service.notes.borrow()[0].2, "中文");
    }

    #[test]
    fn test_import_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let service = Recorder::default();
        let res = import_file(&service, &ImportOptions::default(), "", &dir.path().join("nope.txt"));
        assert!(res.is_err());
        assert!(service.notes.borrow().is_empty());
    }

    #[test]
    fn test_notebook_name_from_trailing_slash() {
        assert_eq!(notebook_name(Path::new("/tmp/notes/")).unwrap(), "notes");
    }

    #[test]
    fn test_absolute() {
        let p = absolute(Path::new("rel.txt"));
        assert!(p.is_absolute());
        assert!(p.ends_with("rel.txt"));
    }
}
