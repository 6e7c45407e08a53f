use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub fn create_file_buf_write<P: AsRef<Path>>(path: P) -> io::Result<BufWriter<File>> {
    let file = File::create(path)?;
    Ok(BufWriter::new(file))
}

pub fn open_file_buf_read<P: AsRef<Path>>(path: P) -> io::Result<BufReader<File>> {
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}

// directly copied from [https://doc.rust-lang.org/std/io/trait.BufRead.html#method.has_data_left]
// unfortunately, that method isn't stable yet
pub fn has_data_left<R: BufRead>(mut reader: R) -> io::Result<bool> {
    reader.fill_buf().map(|b| !b.is_empty())
}

pub fn create_parent_dirs<P: AsRef<Path>>(path: P) -> io::Result<()> {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes a file through `write` into a temporary sibling and renames it over
/// `path` once everything has been flushed, so readers never observe a
/// half-written file. Missing parent directories are created.
pub fn write_atomically<P, F>(path: P, write: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let path = path.as_ref();
    create_parent_dirs(path)?;
    let temp_path = temp_sibling(path);
    let result: io::Result<()> = (|| {
        let mut file = create_file_buf_write(&temp_path)?;
        write(&mut file)?;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    })();
    match result {
        Ok(()) => fs::rename(&temp_path, path),
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn bincode_to_io(error: bincode::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

/// zstd-compressed bincode blob.
pub fn serialize_compressed_into<W, T>(writer: W, value: &T) -> io::Result<W>
where
    W: Write,
    T: Serialize + ?Sized,
{
    let mut encoder = zstd::Encoder::new(writer, 0)?;
    bincode::serialize_into(&mut encoder, value).map_err(bincode_to_io)?;
    encoder.finish()
}

/// Decompresses the whole blob without interpreting it, for callers that need
/// to try more than one payload type.
pub fn read_decompressed<R: Read>(reader: R) -> io::Result<Vec<u8>> {
    zstd::stream::decode_all(reader)
}

/// Deserializes exactly one `T` from `bytes`. Trailing bytes are an error.
pub fn deserialize_exact<T: DeserializeOwned>(bytes: &[u8]) -> io::Result<T> {
    let mut remaining = bytes;
    let value = bincode::deserialize_from(&mut remaining).map_err(bincode_to_io)?;
    if has_data_left(remaining)? {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "deserialization of file didn't reach EOF",
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pair {
        a: u32,
        b: Vec<f32>,
    }

    #[test]
    fn atomic_write_creates_parent_dirs_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/blob.bin");
        write_atomically(&path, |w| w.write_all(b"payload")).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"payload");
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, b"old").unwrap();
        let result = write_atomically(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        });
        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn compressed_blob_decodes_only_as_the_written_type() {
        let value = Pair {
            a: 7,
            b: vec![1.0, -2.5],
        };
        let bytes = serialize_compressed_into(Vec::new(), &value).unwrap();
        let raw = read_decompressed(bytes.as_slice()).unwrap();
        assert_eq!(deserialize_exact::<Pair>(&raw).unwrap(), value);
        // a lone u32 leaves the vector behind as trailing data
        assert!(deserialize_exact::<u32>(&raw).is_err());
        // two pairs need more bytes than one pair provides
        assert!(deserialize_exact::<(Pair, Pair)>(&raw).is_err());
    }
}
