//! Binary snapshot of the level 2 tally, written once the crawl finishes so
//! scoring can be re-run without re-crawling.

use crate::crawl::tally::CoFollowTally;
use crate::error::CheckpointError;
use std::path::Path;

const MAGIC: &[u8; 8] = b"COFOLLOW";
const VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + std::mem::size_of::<u32>();

pub fn save(path: &Path, tally: &CoFollowTally) -> Result<(), CheckpointError> {
    let encoded = bincode::serde::encode_to_vec(tally, bincode::config::standard())?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + encoded.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&encoded);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CheckpointError::Io(parent.to_path_buf(), e))?;
    }
    std::fs::write(path, bytes).map_err(|e| CheckpointError::Io(path.to_path_buf(), e))?;

    tracing::info!(
        path = %path.display(),
        accounts = tally.len(),
        contributors = tally.contributors(),
        "wrote tally checkpoint"
    );
    Ok(())
}

pub fn load(path: &Path) -> Result<CoFollowTally, CheckpointError> {
    let bytes = std::fs::read(path).map_err(|e| CheckpointError::Io(path.to_path_buf(), e))?;

    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(CheckpointError::BadMagic(path.to_path_buf()));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
    let version = u32::from_le_bytes(version);
    if version != VERSION {
        return Err(CheckpointError::UnsupportedVersion(version));
    }

    let (tally, _): (CoFollowTally, usize) =
        bincode::serde::decode_from_slice(&bytes[HEADER_LEN..], bincode::config::standard())?;

    tracing::info!(
        path = %path.display(),
        accounts = tally.len(),
        contributors = tally.contributors(),
        "loaded tally checkpoint"
    );
    Ok(tally)
}
