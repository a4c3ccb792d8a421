use super::flow::ForLoop;
use super::{Address, Rng, Var};
use crate::error;
use crate::lang::{Error, Ident};
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, Error>;

/// An INPUT or GET waiting for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Pending {
    pub prompt: String,
    pub count: usize,
    /// Opcode index where assignment continues once values arrive.
    pub resume: usize,
    /// Values are checked against these before anything is stored.
    pub targets: Vec<Ident>,
}

/// ## Machine snapshot
///
/// Everything a run needs to continue exactly where it was, except the
/// program itself. Reload the same program, then restore.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub(crate) pc: Address,
    pub(crate) data_ptr: usize,
    pub(crate) var: Var,
    pub(crate) for_loops: Vec<ForLoop>,
    pub(crate) while_loops: Vec<Address>,
    pub(crate) returns: Vec<Address>,
    pub(crate) column: usize,
    pub(crate) rng: Rng,
    pub(crate) running: bool,
    pub(crate) exited: bool,
    pub(crate) pending: Option<Pending>,
}

impl Snapshot {
    /// JSON followed by a little-endian CRC-32 of the JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self)
            .map_err(|e| error!(InternalError; format!("SNAPSHOT: {}", e)))?;
        let crc = crc::crc32::checksum_ieee(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Snapshot> {
        if bytes.len() < 4 {
            return Err(error!(InternalError; "SNAPSHOT TRUNCATED"));
        }
        let (json, tail) = bytes.split_at(bytes.len() - 4);
        let mut crc = [0u8; 4];
        crc.copy_from_slice(tail);
        if crc::crc32::checksum_ieee(json) != u32::from_le_bytes(crc) {
            return Err(error!(InternalError; "SNAPSHOT CHECKSUM MISMATCH"));
        }
        serde_json::from_slice(json).map_err(|e| error!(InternalError; format!("SNAPSHOT: {}", e)))
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
