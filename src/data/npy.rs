// ============================================================
// Layer 4 — NumPy .npy Codec
// ============================================================
// Thin layer over ndarray-npy.
//
// Reading:
//   The file is read once, then decoded as each supported element
//   type in turn until the header's descr matches:
//     f4  f8  i1  u1  i2  u2  i4  i8
//   Values come back as f32 in C order, whatever the file's
//   dtype, byte order or memory order. The model only ever sees
//   single-precision floats.
//
// Writing:
//   Reconstructions and losses are written as little-endian f32.
//
// Reference: numpy/lib/format.py (format specification)

use ndarray::{ArrayD, IxDyn};
use ndarray_npy::{ReadNpyError, ReadNpyExt, ReadableElement, WriteNpyError, WriteNpyExt};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NpyError {
    #[error("cannot access '{path}': {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode .npy data: {0}")]
    Read(#[from] ReadNpyError),

    #[error("cannot encode .npy data: {0}")]
    Write(#[from] WriteNpyError),

    #[error("{len} values do not fill shape {shape:?}")]
    Shape { shape: Vec<usize>, len: usize },

    #[error("unsupported dtype: expected f4, f8, i1, u1, i2, u2, i4 or i8")]
    UnsupportedDtype,
}

/// A decoded .npy array: its shape and values cast to f32.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data:  Vec<f32>,
}

type Decoder = fn(&[u8]) -> Result<Option<NpyArray>, NpyError>;

pub fn read_npy(path: impl AsRef<Path>) -> Result<NpyArray, NpyError> {
    let path  = path.as_ref();
    let bytes = fs::read(path).map_err(|source| NpyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_npy(&bytes)
}

pub fn parse_npy(bytes: &[u8]) -> Result<NpyArray, NpyError> {
    let decoders: [Decoder; 8] = [
        |b: &[u8]| decode_as(b, |v: f32| v),
        |b: &[u8]| decode_as(b, |v: f64| v as f32),
        |b: &[u8]| decode_as(b, |v: i8| v as f32),
        |b: &[u8]| decode_as(b, |v: u8| v as f32),
        |b: &[u8]| decode_as(b, |v: i16| v as f32),
        |b: &[u8]| decode_as(b, |v: u16| v as f32),
        |b: &[u8]| decode_as(b, |v: i32| v as f32),
        |b: &[u8]| decode_as(b, |v: i64| v as f32),
    ];
    for decode in decoders {
        if let Some(array) = decode(bytes)? {
            return Ok(array);
        }
    }
    Err(NpyError::UnsupportedDtype)
}

/// Decode as element type `T`. `Ok(None)` means the file holds another dtype.
fn decode_as<T>(bytes: &[u8], cast: impl Fn(T) -> f32) -> Result<Option<NpyArray>, NpyError>
where
    T: ReadableElement + Copy,
{
    match ArrayD::<T>::read_npy(bytes) {
        Ok(array) => Ok(Some(NpyArray {
            shape: array.shape().to_vec(),
            // logical iteration order is C order even for fortran-ordered files
            data:  array.iter().map(|v| cast(*v)).collect(),
        })),
        Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `data` with the given shape as an f32 array.
pub fn write_npy(path: impl AsRef<Path>, shape: &[usize], data: &[f32]) -> Result<(), NpyError> {
    let path  = path.as_ref();
    let array = ArrayD::from_shape_vec(IxDyn(shape), data.to_vec()).map_err(|_| NpyError::Shape {
        shape: shape.to_vec(),
        len:   data.len(),
    })?;
    let file = File::create(path).map_err(|source| NpyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    array.write_npy(BufWriter::new(file))?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-build a file of the given format version, header padded
    /// to a 64-byte boundary the way numpy does it.
    fn npy_bytes(major: u8, dict: &str, body: &[u8]) -> Vec<u8> {
        let preamble = if major == 1 { 10 } else { 12 };
        let mut header = dict.to_string();
        while (preamble + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');

        let mut out = b"\x93NUMPY".to_vec();
        out.extend_from_slice(&[major, 0]);
        if major == 1 {
            out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        } else {
            out.extend_from_slice(&(header.len() as u32).to_le_bytes());
        }
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(body);
        out
    }

    fn f32_body(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("recon.npy");
        let data: Vec<f32> = (0..12).map(|v| v as f32 * 0.5).collect();

        write_npy(&path, &[1, 2, 1, 2, 3], &data).unwrap();
        let arr = read_npy(&path).unwrap();
        assert_eq!(arr.shape, vec![1, 2, 1, 2, 3]);
        assert_eq!(arr.data, data);
    }

    #[test]
    fn test_write_rejects_mismatched_shape() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_npy(dir.path().join("bad.npy"), &[2, 2], &[0.0; 3]).unwrap_err();
        assert!(matches!(err, NpyError::Shape { len: 3, .. }));
    }

    #[test]
    fn test_float64_is_cast_to_f32() {
        let body: Vec<u8> = [1.5f64, -2.25].iter().flat_map(|v| v.to_le_bytes()).collect();
        let bytes = npy_bytes(1, "{'descr': '<f8', 'fortran_order': False, 'shape': (2,), }", &body);
        assert_eq!(parse_npy(&bytes).unwrap().data, vec![1.5, -2.25]);
    }

    #[test]
    fn test_uint8_is_cast_to_f32() {
        let bytes = npy_bytes(1, "{'descr': '|u1', 'fortran_order': False, 'shape': (3,), }", &[0, 7, 255]);
        assert_eq!(parse_npy(&bytes).unwrap().data, vec![0.0, 7.0, 255.0]);
    }

    #[test]
    fn test_version_2_and_3_headers() {
        let dict = "{'descr': '<f4', 'fortran_order': False, 'shape': (1, 2), }";
        for major in [2, 3] {
            let arr = parse_npy(&npy_bytes(major, dict, &f32_body(&[4.0, 5.0]))).unwrap();
            assert_eq!(arr.shape, vec![1, 2], "version {major}");
            assert_eq!(arr.data, vec![4.0, 5.0], "version {major}");
        }
    }

    #[test]
    fn test_fortran_order_comes_back_row_major() {
        // logical [[0, 1, 2], [3, 4, 5]] stored column by column
        let body  = f32_body(&[0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        let bytes = npy_bytes(1, "{'descr': '<f4', 'fortran_order': True, 'shape': (2, 3), }", &body);
        let arr   = parse_npy(&bytes).unwrap();
        assert_eq!(arr.shape, vec![2, 3]);
        assert_eq!(arr.data, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        assert!(parse_npy(b"PK\x03\x04junkjunkjunkjunk").is_err());
    }

    #[test]
    fn test_rejects_unsupported_dtype() {
        let bytes = npy_bytes(1, "{'descr': '<c8', 'fortran_order': False, 'shape': (1,), }", &[0; 8]);
        assert!(matches!(parse_npy(&bytes), Err(NpyError::UnsupportedDtype)));
    }

    #[test]
    fn test_rejects_short_body() {
        let bytes = npy_bytes(1, "{'descr': '<f4', 'fortran_order': False, 'shape': (2, 2), }", &[0; 12]);
        assert!(matches!(parse_npy(&bytes), Err(NpyError::Read(_))));
    }

    #[test]
    fn test_overflowing_shape_is_an_error() {
        let bytes = npy_bytes(
            1,
            "{'descr': '<f4', 'fortran_order': False, 'shape': (4611686018427387904, 8), }",
            &[0; 16],
        );
        assert!(matches!(parse_npy(&bytes), Err(NpyError::Read(_))));
    }
}
