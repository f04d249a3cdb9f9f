use crate::error::{KmeansError, Result};
use memmap2::Mmap;
use ndarray::Array2;
use std::fs::{self, File};
use std::mem;
use std::path::Path;
use tracing::debug;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// On-disk layout of a point file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataFormat {
    /// One point per line: an object id followed by the features, separated
    /// by spaces, tabs or commas.
    Ascii,
    /// `i32` point count, `i32` feature count, then the features as `f32`,
    /// all in native byte order.
    Binary,
}

// Header at the start of a binary point file
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, Clone, Copy)]
pub struct BinaryHeader {
    pub npoints: i32,
    pub nfeatures: i32,
} // 8 bytes

/// Load a point matrix of shape `(npoints, nfeatures)`.
pub fn load_points<P: AsRef<Path>>(path: P, format: DataFormat) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let points = match format {
        DataFormat::Ascii => parse_ascii(&fs::read_to_string(path)?)?,
        DataFormat::Binary => load_binary(path)?,
    };
    debug!(
        path = %path.display(),
        npoints = points.nrows(),
        nfeatures = points.ncols(),
        "loaded points"
    );
    Ok(points)
}

/// Parse the ASCII point format. Blank lines are skipped. The first token of
/// every other line is an id and is ignored; it ends at the first space or
/// tab, so a comma does not terminate it. Features may also be separated by
/// commas.
pub fn parse_ascii(text: &str) -> Result<Array2<f32>> {
    let mut values = Vec::new();
    let mut nfeatures = None;
    let mut npoints = 0;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_start_matches([' ', '\t']);
        if line.is_empty() {
            continue;
        }
        let rest = match line.find([' ', '\t']) {
            Some(end) => &line[end..],
            None => "",
        };
        let tokens = rest
            .split(|c: char| c == ' ' || c == '\t' || c == ',')
            .filter(|t| !t.is_empty());

        let before = values.len();
        for token in tokens {
            let value: f32 = token.parse().map_err(|_| {
                KmeansError::malformed(line_no, format!("`{}` is not a number", token))
            })?;
            values.push(value);
        }
        let found = values.len() - before;

        match nfeatures {
            None if found == 0 => {
                return Err(KmeansError::malformed(line_no, "point has no features"));
            }
            None => nfeatures = Some(found),
            Some(expected) if expected != found => {
                return Err(KmeansError::malformed(
                    line_no,
                    format!("expected {} features, found {}", expected, found),
                ));
            }
            Some(_) => {}
        }
        npoints += 1;
    }

    let nfeatures = nfeatures.ok_or_else(|| KmeansError::malformed(0, "no points in input"))?;
    Array2::from_shape_vec((npoints, nfeatures), values)
        .map_err(|e| KmeansError::malformed(0, e.to_string()))
}

fn load_binary(path: &Path) -> Result<Array2<f32>> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    parse_binary(&mmap)
}

/// Parse the binary point format from an in-memory buffer.
pub fn parse_binary(bytes: &[u8]) -> Result<Array2<f32>> {
    let (header, body) = BinaryHeader::read_from_prefix(bytes)
        .map_err(|_| KmeansError::malformed(0, "file is shorter than its header"))?;

    let npoints = usize::try_from(header.npoints)
        .map_err(|_| KmeansError::malformed(0, format!("negative point count {}", header.npoints)))?;
    let nfeatures = usize::try_from(header.nfeatures).map_err(|_| {
        KmeansError::malformed(0, format!("negative feature count {}", header.nfeatures))
    })?;

    let expected = npoints
        .checked_mul(nfeatures)
        .and_then(|n| n.checked_mul(mem::size_of::<f32>()))
        .ok_or_else(|| KmeansError::malformed(0, "header dimensions overflow"))?;
    if body.len() != expected {
        return Err(KmeansError::malformed(
            0,
            format!(
                "header declares {} x {} features ({} bytes) but {} bytes follow",
                npoints,
                nfeatures,
                expected,
                body.len()
            ),
        ));
    }

    // Per-value reads when the body is not f32-aligned
    let values = <[f32]>::ref_from_bytes(&body[..expected])
        .map(|v| v.to_vec())
        .or_else(|_| {
            body[..expected]
                .chunks_exact(mem::size_of::<f32>())
                .map(|b| {
                    f32::read_from_bytes(b)
                        .map_err(|_| KmeansError::malformed(0, "truncated feature value"))
                })
                .collect::<Result<Vec<f32>>>()
        })?;

    Array2::from_shape_vec((npoints, nfeatures), values)
        .map_err(|e| KmeansError::malformed(0, e.to_string()))
}

/// Write points in the binary format read by [`load_points`].
pub fn write_binary<P: AsRef<Path>>(path: P, points: &Array2<f32>) -> Result<()> {
    let header = BinaryHeader {
        npoints: i32::try_from(points.nrows())
            .map_err(|_| KmeansError::invalid("too many points for the binary format"))?,
        nfeatures: i32::try_from(points.ncols())
            .map_err(|_| KmeansError::invalid("too many features for the binary format"))?,
    };
    let mut bytes = Vec::with_capacity(mem::size_of::<BinaryHeader>() + points.len() * 4);
    bytes.extend_from_slice(header.as_bytes());
    for value in points.iter() {
        bytes.extend_from_slice(value.as_bytes());
    }
    fs::write(path, bytes)?;
    Ok(())
}
