/// Content hashing for duplicate detection.
///
/// Files are hashed in full with SHA-256. Two files with the same digest are
/// treated as byte-identical regardless of name or location.
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const HASH_CHUNK_SIZE: usize = 8192;

/// A SHA-256 digest of a file's full content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Hashes everything readable from `reader`.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    Ok(ContentDigest(bytes))
}

/// Hashes the full content of the file at `path`.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read
/// (permission denied, removed mid-scan, device fault).
///
/// # Examples
///
/// ```no_run
/// use file_collector::content_hash::digest;
/// use std::path::Path;
///
/// let d = digest(Path::new("/photos/IMG_0001.jpg")).unwrap();
/// println!("{}", d);
/// ```
pub fn digest(path: &Path) -> io::Result<ContentDigest> {
    let file = File::open(path)?;
    digest_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_known_sha256_vector() {
        let d = digest_reader(&b"abc"[..]).unwrap();
        assert_eq!(
            d.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(d.to_string().len(), 64);
    }

    #[test]
    fn test_identical_content_same_digest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.jpg");
        let b = temp_dir.path().join("nested_name.png");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();

        assert_eq!(digest(&a).unwrap(), digest(&b).unwrap());
    }

    #[test]
    fn test_different_content_different_digest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();

        assert_ne!(digest(&a).unwrap(), digest(&b).unwrap());
    }

    #[test]
    fn test_content_larger_than_one_chunk() {
        let data = vec![7u8; HASH_CHUNK_SIZE * 3 + 17];
        let mut tail_changed = data.clone();
        *tail_changed.last_mut().unwrap() = 8;

        assert_eq!(
            digest_reader(&data[..]).unwrap(),
            digest_reader(&data[..]).unwrap()
        );
        assert_ne!(
            digest_reader(&data[..]).unwrap(),
            digest_reader(&tail_changed[..]).unwrap()
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = digest(&temp_dir.path().join("vanished.jpg"));
        assert!(result.is_err());
    }
}
