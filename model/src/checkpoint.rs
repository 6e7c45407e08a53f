//! On-disk model format.
//!
//! A file is a zstd-compressed bincode blob holding either a full
//! [`Checkpoint`] or bare policy [`Params`]. Bincode is not self-describing,
//! so the reader tries the full form first and requires the whole payload to
//! be consumed before falling back to bare weights.

use crate::{AdamState, CheckpointError, Params, QNetwork};
use candle_core::Device;
use file_io::{
    create_parent_dirs, deserialize_exact, open_file_buf_read, read_decompressed,
    serialize_compressed_into, write_atomically,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub policy_net: Params,
    pub target_net: Params,
    pub optimizer: AdamState,
    pub epsilon: f64,
    pub steps: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SavedModel {
    Full(Checkpoint),
    PolicyOnly(Params),
}

impl SavedModel {
    pub fn policy_params(&self) -> &Params {
        match self {
            SavedModel::Full(checkpoint) => &checkpoint.policy_net,
            SavedModel::PolicyOnly(params) => params,
        }
    }
    pub fn into_policy_params(self) -> Params {
        match self {
            SavedModel::Full(checkpoint) => checkpoint.policy_net,
            SavedModel::PolicyOnly(params) => params,
        }
    }
}

fn save<P, T>(path: P, value: &T) -> Result<(), CheckpointError>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    create_parent_dirs(path)?;
    write_atomically(path, |writer| {
        serialize_compressed_into(&mut *writer, value).map(|_| ())
    })?;
    debug!("wrote {}", path.display());
    Ok(())
}

pub fn save_checkpoint<P: AsRef<Path>>(
    path: P,
    checkpoint: &Checkpoint,
) -> Result<(), CheckpointError> {
    save(path, checkpoint)
}

/// Writes policy weights alone, the format produced by offline pretraining.
pub fn save_params<P: AsRef<Path>>(path: P, params: &Params) -> Result<(), CheckpointError> {
    save(path, params)
}

pub fn read_saved_model<P: AsRef<Path>>(path: P) -> Result<SavedModel, CheckpointError> {
    let path = path.as_ref();
    let reader = match open_file_buf_read(path) {
        Ok(reader) => reader,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CheckpointError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let bytes = read_decompressed(reader).map_err(|e| {
        debug!("{} is not a zstd stream: {e}", path.display());
        CheckpointError::Corrupt(path.to_path_buf())
    })?;
    if let Ok(checkpoint) = deserialize_exact::<Checkpoint>(&bytes) {
        return Ok(SavedModel::Full(checkpoint));
    }
    deserialize_exact::<Params>(&bytes)
        .map(SavedModel::PolicyOnly)
        .map_err(|_| CheckpointError::Corrupt(path.to_path_buf()))
}

/// Loads the policy network held by a model file of either form, on the CPU.
pub fn load_policy<P: AsRef<Path>>(path: P) -> Result<QNetwork, CheckpointError> {
    let saved = read_saved_model(path)?;
    Ok(QNetwork::from_params(&Device::Cpu, saved.policy_params())?)
}
