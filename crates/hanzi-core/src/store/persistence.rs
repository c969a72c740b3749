use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;

use super::memory::{MemoryStore, StoreData};
use super::StoreError;

const MAGIC: &[u8; 4] = b"HZPS";
const VERSION: u8 = 1;
/// magic(4) + version(1) + crc32 of body(4)
const HEADER_SIZE: usize = 4 + 1 + 4;

impl MemoryStore {
    /// Serialize to bytes (HZPS format).
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let body = bincode::serialize(self.data()).map_err(StoreError::Serialize)?;
        let crc = crc32fast::hash(&body);

        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Deserialize from bytes (HZPS format) and rebuild the indexes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, StoreError> {
        if data.len() < 5 {
            return Err(StoreError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(StoreError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(StoreError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(StoreError::InvalidHeader);
        }

        let expected = u32::from_le_bytes([data[5], data[6], data[7], data[8]]);
        let body = &data[HEADER_SIZE..];
        let actual = crc32fast::hash(body);
        if actual != expected {
            return Err(StoreError::ChecksumMismatch { expected, actual });
        }

        let store_data: StoreData = bincode::deserialize(body).map_err(StoreError::Deserialize)?;
        Self::from_data(store_data)
    }

    /// Open a store file via mmap.
    ///
    /// Rows are deserialized out of the mapped region, then the mapping is
    /// dropped.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // The Mmap is dropped after deserialization completes below.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
