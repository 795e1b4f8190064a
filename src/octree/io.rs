use super::node::{OctreeNode, NODE_BYTES};
use super::Octree;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Usage/IO errors at the octree-loading boundary. Per the error handling
/// design, these are the only fallible surface in the crate's hot path;
/// everything downstream of a successfully loaded [`Octree`] is either a
/// control-flow return code or a NaN-safe comparison, never an `Err`.
#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    /// The byte stream length wasn't a multiple of [`NODE_BYTES`].
    TruncatedStream { len: usize },
    /// `resize`/`assign_octrees` was called with a zero-sized input.
    InvalidDimensions,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "io error: {e}"),
            RenderError::TruncatedStream { len } => {
                write!(f, "octree stream length {len} is not a multiple of {NODE_BYTES}")
            }
            RenderError::InvalidDimensions => write!(f, "invalid (zero) dimensions"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

/// Parses a binary stream of `OctreeNode` records: little-endian, no
/// header, no padding, 8 bytes each. Root is expected at index 0.
pub fn parse_bytes(bytes: &[u8]) -> Result<Octree, RenderError> {
    if bytes.len() % NODE_BYTES != 0 {
        return Err(RenderError::TruncatedStream { len: bytes.len() });
    }
    let nodes = bytes
        .chunks_exact(NODE_BYTES)
        .map(|chunk| {
            let mut record = [0u8; NODE_BYTES];
            record.copy_from_slice(chunk);
            OctreeNode::from_le_bytes(record)
        })
        .collect();
    Ok(Octree::new(nodes))
}

/// Reads a whole octree file into memory and parses it. Cold path: logs at
/// the `logging` feature's discretion, never on the render loop.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Octree, RenderError> {
    let path = path.as_ref();
    #[cfg(feature = "logging")]
    log::debug!("loading octree from {}", path.display());
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let octree = parse_bytes(&bytes)?;
    #[cfg(feature = "logging")]
    log::info!("loaded octree with {} nodes from {}", octree.len(), path.display());
    Ok(octree)
}

pub fn load_from_reader<R: Read>(mut reader: R) -> Result<Octree, RenderError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_bytes(&bytes)
}

/// Serializes an octree back to the binary record format. Mainly useful for
/// tests and tooling; the render path never writes octrees.
pub fn write_to_path<P: AsRef<Path>>(octree: &Octree, path: P) -> Result<(), RenderError> {
    let mut file = File::create(path)?;
    for node in octree.as_slice() {
        file.write_all(&node.to_le_bytes())?;
    }
    Ok(())
}
