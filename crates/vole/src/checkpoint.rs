// Checkpoint — save and load named parameter arrays
//
// Binary checkpoint format (.vole):
//
//   Header:
//     magic:   [u8; 4]  = b"VOLE"
//     version: u32 LE   = 1
//     count:   u32 LE   = number of arrays
//
//   For each array:
//     key_len:  u32 LE
//     key:      [u8; key_len]  (UTF-8, format: "model/param")
//     ndim:     u32 LE
//     dims:     [u32 LE; ndim]
//     data_len: u64 LE         (in bytes)
//     data:     [f64 LE; data_len / 8]  (row-major)
//
// Usage:
//   checkpoint::save_arrays("weights.vole", &named)?;
//   let named = checkpoint::load_arrays("weights.vole")?;
//
//   checkpoint::save_params("model.vole", &tree)?;
//   let loaded = checkpoint::load_into("model.vole", &mut tree)?;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::{ArrayD, IxDyn};

use crate::params::{ParamError, ParamTree};

const MAGIC: &[u8; 4] = b"VOLE";
const VERSION: u32 = 1;

/// Errors from checkpoint serialization.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream does not start with the checkpoint magic.
    #[error("invalid checkpoint: expected magic {MAGIC:?}, got {got:?}")]
    BadMagic { got: [u8; 4] },

    /// The stream was written by an incompatible version.
    #[error("unsupported checkpoint version {got} (expected {VERSION})")]
    UnsupportedVersion { got: u32 },

    /// A key is not valid UTF-8.
    #[error("invalid UTF-8 key: {0}")]
    BadKey(#[from] std::string::FromUtf8Error),

    /// Entry payload disagrees with its declared shape.
    #[error("corrupt entry {key}: shape {dims:?} needs {expected} bytes, got {got}")]
    EntrySizeMismatch {
        key: String,
        dims: Vec<usize>,
        expected: usize,
        got: usize,
    },

    /// Loaded pairs do not fit the receiving parameter tree.
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Convenience Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

// Low-level IO helpers

fn write_u32(w: &mut impl Write, v: u32) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u64(w: &mut impl Write, v: u64) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u32(r: &mut impl Read) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_bytes(r: &mut impl Read, len: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

// Core write/read

/// Write named arrays to a writer in the Vole checkpoint format.
pub fn write_checkpoint(
    writer: &mut impl Write,
    arrays: &[(String, ArrayD<f64>)],
) -> Result<()> {
    writer.write_all(MAGIC)?;
    write_u32(writer, VERSION)?;
    write_u32(writer, arrays.len() as u32)?;

    for (key, array) in arrays {
        let key_bytes = key.as_bytes();
        write_u32(writer, key_bytes.len() as u32)?;
        writer.write_all(key_bytes)?;

        let dims = array.shape();
        write_u32(writer, dims.len() as u32)?;
        for &d in dims {
            write_u32(writer, d as u32)?;
        }

        write_u64(writer, (array.len() * 8) as u64)?;
        // iter() walks logical (row-major) order even for views.
        for &v in array.iter() {
            writer.write_all(&v.to_le_bytes())?;
        }
    }

    Ok(())
}

/// Read named arrays from a reader in the Vole checkpoint format.
pub fn read_checkpoint(reader: &mut impl Read) -> Result<Vec<(String, ArrayD<f64>)>> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(CheckpointError::BadMagic { got: magic });
    }

    let version = read_u32(reader)?;
    if version != VERSION {
        return Err(CheckpointError::UnsupportedVersion { got: version });
    }

    let count = read_u32(reader)? as usize;
    let mut arrays = Vec::with_capacity(count);

    for _ in 0..count {
        let key_len = read_u32(reader)? as usize;
        let key = String::from_utf8(read_bytes(reader, key_len)?)?;

        let ndim = read_u32(reader)? as usize;
        let mut dims = Vec::with_capacity(ndim);
        for _ in 0..ndim {
            dims.push(read_u32(reader)? as usize);
        }

        let data_len = read_u64(reader)? as usize;
        let expected = dims.iter().product::<usize>() * 8;
        if data_len != expected {
            return Err(CheckpointError::EntrySizeMismatch {
                key,
                dims,
                expected,
                got: data_len,
            });
        }

        let data = read_bytes(reader, data_len)?;
        let values: Vec<f64> = data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect();

        let array = match ArrayD::from_shape_vec(IxDyn(&dims), values) {
            Ok(a) => a,
            Err(_) => {
                return Err(CheckpointError::EntrySizeMismatch {
                    key,
                    dims,
                    expected,
                    got: data_len,
                })
            }
        };
        arrays.push((key, array));
    }

    Ok(arrays)
}

// High-level API — files and in-memory buffers

/// Save named arrays to a file.
pub fn save_arrays(
    path: impl AsRef<Path>,
    arrays: &[(String, ArrayD<f64>)],
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_checkpoint(&mut writer, arrays)?;
    writer.flush()?;
    tracing::debug!(
        path = %path.as_ref().display(),
        arrays = arrays.len(),
        "wrote checkpoint"
    );
    Ok(())
}

/// Load named arrays from a file.
pub fn load_arrays(path: impl AsRef<Path>) -> Result<Vec<(String, ArrayD<f64>)>> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let arrays = read_checkpoint(&mut reader)?;
    tracing::debug!(
        path = %path.as_ref().display(),
        arrays = arrays.len(),
        "read checkpoint"
    );
    Ok(arrays)
}

/// Serialize named arrays to an in-memory byte vector.
pub fn to_bytes(arrays: &[(String, ArrayD<f64>)]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_checkpoint(&mut buf, arrays)?;
    Ok(buf)
}

/// Deserialize named arrays from an in-memory byte slice.
pub fn from_bytes(data: &[u8]) -> Result<Vec<(String, ArrayD<f64>)>> {
    let mut cursor = std::io::Cursor::new(data);
    read_checkpoint(&mut cursor)
}

// High-level API — ParamTree bridge

/// Save a parameter tree to a file, flattening it to `/`-separated keys.
pub fn save_params(path: impl AsRef<Path>, tree: &ParamTree) -> Result<()> {
    save_arrays(path, &tree.flatten())
}

/// Load a parameter tree from a file.
///
/// The tree is rebuilt from the stored keys; reconstructing a model
/// around it is the caller's concern.
pub fn load_params(path: impl AsRef<Path>) -> Result<ParamTree> {
    let arrays = load_arrays(path)?;
    Ok(ParamTree::from_flat(arrays)?)
}

/// Load a checkpoint into an existing tree.
///
/// Every stored key must address an existing parameter of identical
/// shape; a mismatched architecture fails here, at apply time. Returns
/// the number of parameters updated.
pub fn load_into(path: impl AsRef<Path>, tree: &mut ParamTree) -> Result<usize> {
    let arrays = load_arrays(path)?;
    Ok(tree.apply(&arrays)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn arr(shape: &[usize], values: &[f64]) -> ArrayD<f64> {
        ArrayD::from_shape_vec(shape.to_vec(), values.to_vec()).unwrap()
    }

    #[test]
    fn roundtrip_single_array() {
        let arrays = vec![("x".to_string(), arr(&[2, 2], &[1.0, 2.0, 3.0, 4.0]))];
        let bytes = to_bytes(&arrays).unwrap();
        let loaded = from_bytes(&bytes).unwrap();
        assert_eq!(loaded, arrays);
    }

    #[test]
    fn roundtrip_preserves_f64_exactly() {
        let values = vec![std::f64::consts::PI, std::f64::consts::E, 0.0, -1.5];
        let arrays = vec![("precision".to_string(), arr(&[4], &values))];
        let bytes = to_bytes(&arrays).unwrap();
        let loaded = from_bytes(&bytes).unwrap();
        assert_eq!(loaded[0].1.as_slice().unwrap(), values.as_slice());
    }

    #[test]
    fn roundtrip_multiple_and_3d() {
        let data: Vec<f64> = (0..24).map(|i| i as f64).collect();
        let arrays = vec![
            ("model/w1".to_string(), arr(&[2, 3], &data[..6])),
            ("model/b1".to_string(), arr(&[3], &data[..3])),
            ("volume".to_string(), arr(&[2, 3, 4], &data)),
        ];
        let bytes = to_bytes(&arrays).unwrap();
        let loaded = from_bytes(&bytes).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].0, "model/w1");
        assert_eq!(loaded[2].1.shape(), &[2, 3, 4]);
        assert_eq!(loaded, arrays);
    }

    #[test]
    fn empty_checkpoint_roundtrips() {
        let arrays: Vec<(String, ArrayD<f64>)> = vec![];
        let bytes = to_bytes(&arrays).unwrap();
        assert!(from_bytes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn invalid_magic_rejected() {
        let result = from_bytes(b"JUNKdata");
        assert!(matches!(result, Err(CheckpointError::BadMagic { .. })));
    }

    #[test]
    fn future_version_rejected() {
        let arrays = vec![("x".to_string(), arr(&[1], &[1.0]))];
        let mut bytes = to_bytes(&arrays).unwrap();
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        let result = from_bytes(&bytes);
        assert!(matches!(
            result,
            Err(CheckpointError::UnsupportedVersion { got: 99 })
        ));
    }

    #[test]
    fn truncated_stream_rejected() {
        let arrays = vec![("x".to_string(), arr(&[4], &[1.0, 2.0, 3.0, 4.0]))];
        let bytes = to_bytes(&arrays).unwrap();
        let result = from_bytes(&bytes[..bytes.len() - 5]);
        assert!(matches!(result, Err(CheckpointError::Io(_))));
    }

    #[test]
    fn file_roundtrip() {
        let arrays = vec![("test".to_string(), arr(&[3], &[1.0, 2.0, 3.0]))];
        let path = std::env::temp_dir().join("vole_test_checkpoint.vole");
        save_arrays(&path, &arrays).unwrap();
        let loaded = load_arrays(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, arrays);
    }
}
