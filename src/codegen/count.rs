//! Line counting for generated files

use super::CodegenError;
use std::path::Path;
use tokio::io::AsyncReadExt;

const READ_CHUNK: usize = 64 * 1024;

/// Count newline bytes in the file at `path`
///
/// A file without a trailing newline reports one less than its visual
/// line count.
pub async fn count_lines(path: &Path) -> Result<usize, CodegenError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|source| CodegenError::io(path, source))?;

    let mut buffer = vec![0u8; READ_CHUNK];
    let mut count = 0;
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|source| CodegenError::io(path, source))?;
        if read == 0 {
            break;
        }
        count += buffer[..read].iter().filter(|&&b| b == b'\n').count();
    }

    Ok(count)
}
