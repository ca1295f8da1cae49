// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

/// Appends to the file at `path_str`, creating it if needed. The file never rolls over.
///
/// # Errors
///
/// Returns an error if:
/// - The path has no parent directory
/// - The path has no file name
pub fn try_create(
    path_str: &str,
) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
    let path = PathBuf::from(path_str);

    let parent = path.parent().ok_or_else(|| {
        miette::miette!(
            "Can't access the folder of {}. It might not exist, or you don't have the \
             required permissions.",
            path.display()
        )
    })?;

    let file_name = path.file_name().ok_or_else(|| {
        miette::miette!("{} doesn't name a file.", path.display())
    })?;

    Ok(tracing_appender::rolling::never(parent, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn creates_file_in_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("rawterm.log");
        let mut appender = try_create(file_path.to_str().unwrap()).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "hello\n");
    }

    #[test]
    fn root_has_no_file_name() {
        assert!(try_create("/").is_err());
    }
}
