//! Destination naming and directory collaborators.
//!
//! Workers ask a [`DestinationNamer`] for a file name and a
//! [`DirectoryResolver`] for the directory once a fetch has been accepted.
//! Both are synchronous and may block (the prompt reads stdin), so workers
//! call them on the blocking thread pool.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;
use url::Url;

use super::error::NamingError;
use super::outcome::Target;

/// Supplies the file name a target is saved under.
pub trait DestinationNamer: Send + Sync {
    /// Returns a plain file name (no directory components) for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError`] if no usable name can be produced.
    fn name_for(&self, target: &Target) -> Result<String, NamingError>;
}

/// Supplies the directory downloads are written into.
pub trait DirectoryResolver: Send + Sync {
    /// Returns the destination directory.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::Directory`] if the directory is unusable.
    fn resolve(&self) -> Result<PathBuf, NamingError>;
}

/// Asks the user for a file name, one line per target.
///
/// Prompt and answer happen under one lock so concurrent workers never
/// interleave their questions.
#[derive(Debug)]
pub struct PromptNamer<R, W> {
    io: Mutex<(R, W)>,
    hold_stdout: bool,
}

impl PromptNamer<BufReader<Stdin>, Stdout> {
    /// Prompts on stdout and reads answers from stdin.
    ///
    /// Process stdout stays locked until the answer is read, so result lines
    /// printed elsewhere wait instead of landing inside the prompt.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout()).holding_stdout()
    }
}

impl<R, W> PromptNamer<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    /// Creates a namer over arbitrary input and output.
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
            hold_stdout: false,
        }
    }

    /// Keeps process stdout locked from prompt until answer.
    #[must_use]
    pub fn holding_stdout(mut self) -> Self {
        self.hold_stdout = true;
        self
    }
}

impl<R, W> DestinationNamer for PromptNamer<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn name_for(&self, target: &Target) -> Result<String, NamingError> {
        let mut guard = self.io.lock().unwrap_or_else(PoisonError::into_inner);
        let (input, output) = &mut *guard;
        // Reentrant: writes to `Stdout` from this thread still go through.
        let _stdout = self.hold_stdout.then(|| std::io::stdout().lock());

        write!(output, "Save {target} as: ").map_err(NamingError::Input)?;
        output.flush().map_err(NamingError::Input)?;

        let mut answer = String::new();
        let read = input.read_line(&mut answer).map_err(NamingError::Input)?;
        if read == 0 {
            return Err(NamingError::EndOfInput);
        }
        validate_file_name(&answer)
    }
}

/// Derives the file name from the last URL path segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlNamer;

impl DestinationNamer for UrlNamer {
    fn name_for(&self, target: &Target) -> Result<String, NamingError> {
        let name = Url::parse(target.url())
            .ok()
            .as_ref()
            .and_then(file_name_from_url)
            .unwrap_or_else(timestamp_file_name);
        debug!(url = %target, name = %name, "derived file name from URL");
        Ok(name)
    }
}

/// Where downloads are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDirectory {
    /// The process working directory at the time of each lookup.
    Working,
    /// A fixed directory that must already exist.
    Fixed(PathBuf),
    /// A fixed directory created on first use if absent.
    Created(PathBuf),
}

impl DirectoryResolver for OutputDirectory {
    fn resolve(&self) -> Result<PathBuf, NamingError> {
        match self {
            Self::Working => std::env::current_dir().map_err(|source| NamingError::Directory {
                path: PathBuf::from("."),
                source,
            }),
            Self::Fixed(path) => {
                if path.is_dir() {
                    Ok(path.clone())
                } else {
                    Err(NamingError::Directory {
                        path: path.clone(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "directory does not exist",
                        ),
                    })
                }
            }
            Self::Created(path) => {
                ensure_directory(path)?;
                Ok(path.clone())
            }
        }
    }
}

/// Creates `path` (and parents) if it does not exist yet.
///
/// # Errors
///
/// Returns [`NamingError::Directory`] if creation fails.
pub fn ensure_directory(path: &Path) -> Result<(), NamingError> {
    if path.is_dir() {
        return Ok(());
    }
    debug!(path = %path.display(), "creating download directory");
    std::fs::create_dir_all(path).map_err(|source| NamingError::Directory {
        path: path.to_path_buf(),
        source,
    })
}

/// Trims a user-supplied name and checks it is a single plain path segment.
///
/// # Errors
///
/// Returns [`NamingError::EmptyName`] for blank input and
/// [`NamingError::UnsafeName`] for names with directory components.
pub fn validate_file_name(raw: &str) -> Result<String, NamingError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(NamingError::EmptyName);
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(name.to_string()),
        _ => Err(NamingError::UnsafeName(name.to_string())),
    }
}

/// Replaces characters that are invalid on common filesystems.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match sanitized.as_str() {
        "" => "_".to_string(),
        "." | ".." => sanitized.replace('.', "_"),
        _ => sanitized,
    }
}

fn file_name_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    Some(sanitize_filename(&decoded))
}

fn timestamp_file_name() -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("download_{timestamp}.bin")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_prompt_namer_trims_answer_and_prompts_with_url() {
        let mut output = Vec::new();
        {
            let namer = PromptNamer::new(Cursor::new(b"  report.pdf \n".to_vec()), &mut output);
            let name = namer
                .name_for(&Target::new("https://example.com/r"))
                .unwrap();
            assert_eq!(name, "report.pdf");
        }
        let prompt = String::from_utf8(output).unwrap();
        assert_eq!(prompt, "Save https://example.com/r as: ");
    }

    #[test]
    fn test_prompt_namer_reads_one_line_per_target() {
        let namer = PromptNamer::new(Cursor::new(b"one.bin\ntwo.bin\n".to_vec()), Vec::<u8>::new());
        let target = Target::new("https://example.com/x");
        assert_eq!(namer.name_for(&target).unwrap(), "one.bin");
        assert_eq!(namer.name_for(&target).unwrap(), "two.bin");
        assert!(matches!(
            namer.name_for(&target),
            Err(NamingError::EndOfInput)
        ));
    }

    /// Delivers each sent chunk as one read; EOF once the sender is gone.
    struct ChannelReader(std::sync::mpsc::Receiver<Vec<u8>>);

    impl std::io::Read for ChannelReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.recv() {
                Ok(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Err(_) => Ok(0),
            }
        }
    }

    #[test]
    fn test_prompt_holding_stdout_blocks_other_writers_until_answered() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::time::Duration;

        let (answer_tx, answer_rx) = std::sync::mpsc::channel();
        let namer = Arc::new(
            PromptNamer::new(BufReader::new(ChannelReader(answer_rx)), Vec::<u8>::new())
                .holding_stdout(),
        );
        let asking = {
            let namer = Arc::clone(&namer);
            std::thread::spawn(move || namer.name_for(&Target::new("https://example.com/a")))
        };
        std::thread::sleep(Duration::from_millis(100));

        let printed = Arc::new(AtomicBool::new(false));
        let printer = {
            let printed = Arc::clone(&printed);
            std::thread::spawn(move || {
                let _stdout = std::io::stdout().lock();
                printed.store(true, Ordering::SeqCst);
            })
        };
        std::thread::sleep(Duration::from_millis(100));
        assert!(
            !printed.load(Ordering::SeqCst),
            "stdout must stay locked while the prompt waits"
        );

        answer_tx.send(b"a.bin\n".to_vec()).unwrap();
        assert_eq!(asking.join().unwrap().unwrap(), "a.bin");
        printer.join().unwrap();
        assert!(printed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_prompt_namer_rejects_blank_answer() {
        let namer = PromptNamer::new(Cursor::new(b"   \n".to_vec()), Vec::<u8>::new());
        assert!(matches!(
            namer.name_for(&Target::new("https://example.com/x")),
            Err(NamingError::EmptyName)
        ));
    }

    #[test]
    fn test_validate_file_name_rejects_directory_components() {
        for name in ["../escape.bin", "sub/file.bin", "/abs.bin", "..", "."] {
            assert!(
                matches!(validate_file_name(name), Err(NamingError::UnsafeName(_))),
                "{name} should be rejected"
            );
        }
        assert_eq!(validate_file_name("ok.tar.gz").unwrap(), "ok.tar.gz");
    }

    #[test]
    fn test_url_namer_uses_last_segment_decoded() {
        let name = UrlNamer
            .name_for(&Target::new("https://example.com/files/my%20report.pdf?x=1"))
            .unwrap();
        assert_eq!(name, "my report.pdf");
    }

    #[test]
    fn test_url_namer_falls_back_for_bare_host() {
        let name = UrlNamer
            .name_for(&Target::new("https://example.com/"))
            .unwrap();
        assert!(name.starts_with("download_"), "unexpected name {name}");
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("a:b*c?.bin"), "a_b_c_.bin");
        assert_eq!(sanitize_filename("x\\y"), "x_y");
        assert_eq!(sanitize_filename(".."), "__");
        assert_eq!(sanitize_filename(""), "_");
    }

    #[test]
    fn test_output_directory_created_makes_missing_dirs() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        let resolved = OutputDirectory::Created(nested.clone()).resolve().unwrap();
        assert_eq!(resolved, nested);
        assert!(nested.is_dir());
    }

    #[test]
    fn test_output_directory_fixed_requires_existing_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        assert!(matches!(
            OutputDirectory::Fixed(missing).resolve(),
            Err(NamingError::Directory { .. })
        ));
        assert_eq!(
            OutputDirectory::Fixed(temp.path().to_path_buf())
                .resolve()
                .unwrap(),
            temp.path()
        );
    }
}
