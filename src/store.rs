use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::{LegendasError, Result};

/// Read a whole subtitle file.
pub async fn read_subtitle<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LegendasError::FileNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path).await?;
    info!("Read {} bytes from {}", content.len(), path.display());
    Ok(content)
}

/// Write translated subtitle text, replacing any existing file.
pub async fn write_translated<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content).await?;
    info!("Wrote translated subtitles to {}", path.display());
    Ok(())
}

/// `movie.en.srt` -> `movie.<tag>.srt`. A name with a single extension
/// (`movie.srt`) only has that one replaced.
pub fn translated_output_path<P: AsRef<Path>>(input: P, tag: &str) -> PathBuf {
    let input = input.as_ref();
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let segments: Vec<&str> = file_name.split('.').collect();
    let keep = match segments.len() {
        0 | 1 => segments.len(),
        2 => 1,
        n => n - 2,
    };
    let stem = segments[..keep].join(".");

    input.with_file_name(format!("{}.{}.srt", stem, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_output_path_replaces_two_extensions() {
        assert_eq!(
            translated_output_path("/media/show/name.en.srt", "pt_br"),
            PathBuf::from("/media/show/name.pt_br.srt")
        );
        assert_eq!(
            translated_output_path("Show.S01E02.eng.srt", "pt_br"),
            PathBuf::from("Show.S01E02.pt_br.srt")
        );
    }

    #[test]
    fn test_output_path_single_extension() {
        assert_eq!(translated_output_path("movie.srt", "es"), PathBuf::from("movie.es.srt"));
        assert_eq!(translated_output_path("movie", "es"), PathBuf::from("movie.es.srt"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = read_subtitle(temp.child("missing.srt").path()).await.unwrap_err();
        assert!(matches!(err, LegendasError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("out.pt_br.srt");

        write_translated(file.path(), "1\nA\nOlá\n").await.unwrap();
        file.assert("1\nA\nOlá\n");
        assert_eq!(read_subtitle(file.path()).await.unwrap(), "1\nA\nOlá\n");
    }
}
