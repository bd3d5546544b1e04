use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

/// Where the producer reads its samples from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Stdin,
    Path(PathBuf),
}

impl Source {
    /// `-` selects standard input.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Source::Stdin
        } else {
            Source::Path(PathBuf::from(arg))
        }
    }

    pub fn open(&self) -> io::Result<OpenSource> {
        match self {
            Source::Stdin => Ok(OpenSource {
                reader: Box::new(io::stdin()),
                kind: SourceKind::Stdin,
            }),
            Source::Path(path) => {
                let file = File::open(path)?;
                let kind = SourceKind::of(&file)?;
                Ok(OpenSource {
                    reader: Box::new(file),
                    kind,
                })
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => f.write_str("<stdin>"),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

pub struct OpenSource {
    pub reader: Box<dyn Read + Send>,
    pub kind: SourceKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Regular,
    BlockDevice,
    Fifo,
    CharDevice,
    Directory,
    Stdin,
    Other,
}

impl SourceKind {
    fn of(file: &File) -> io::Result<Self> {
        let file_type = file.metadata()?.file_type();
        if file_type.is_dir() {
            return Ok(SourceKind::Directory);
        }
        if file_type.is_file() {
            return Ok(SourceKind::Regular);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_fifo() {
                return Ok(SourceKind::Fifo);
            }
            if file_type.is_block_device() {
                return Ok(SourceKind::BlockDevice);
            }
            if file_type.is_char_device() {
                return Ok(SourceKind::CharDevice);
            }
        }
        Ok(SourceKind::Other)
    }

    /// Whether hitting end of stream means waiting for a new writer rather
    /// than being done for good.
    pub fn reopens(self) -> bool {
        matches!(
            self,
            SourceKind::Fifo | SourceKind::CharDevice | SourceKind::Other
        )
    }

    pub fn readable(self) -> bool {
        self != SourceKind::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_means_stdin() {
        assert_eq!(Source::from_arg("-"), Source::Stdin);
        assert_eq!(
            Source::from_arg("/tmp/data"),
            Source::Path(PathBuf::from("/tmp/data"))
        );
        assert_eq!(Source::Stdin.to_string(), "<stdin>");
    }

    #[test]
    fn regular_file_does_not_reopen() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let opened = Source::Path(file.path().to_path_buf()).open().unwrap();
        assert_eq!(opened.kind, SourceKind::Regular);
        assert!(!opened.kind.reopens());
    }

    #[test]
    fn directory_is_not_readable() {
        let dir = tempfile::tempdir().unwrap();
        let opened = Source::Path(dir.path().to_path_buf()).open();
        // Some platforms refuse to open directories at all.
        if let Ok(opened) = opened {
            assert_eq!(opened.kind, SourceKind::Directory);
            assert!(!opened.kind.readable());
        }
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Source::Path(dir.path().join("nope")).open().is_err());
    }

    #[test]
    fn reopen_policy() {
        assert!(SourceKind::Fifo.reopens());
        assert!(SourceKind::CharDevice.reopens());
        assert!(!SourceKind::BlockDevice.reopens());
        assert!(!SourceKind::Stdin.reopens());
    }
}
