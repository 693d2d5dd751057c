//! Saving and loading the game snapshot with a checksummed binary format.
//!
//! The snapshot is opaque to the engine: party, inventory, credits, log,
//! and any in-flight encounter, serialized as one blob.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use chrono::Utc;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::constants::SAVE_VERSION_MAGIC;
use crate::core::game_state::GameState;

#[derive(Serialize, Deserialize)]
struct SaveFile {
    saved_at: i64,
    state: GameState,
}

/// Manages saving and loading game state with checksum verification.
pub struct SaveManager {
    save_path: PathBuf,
}

impl SaveManager {
    /// Sets up the save directory at the appropriate location for the
    /// platform using the `directories` crate.
    pub fn new() -> io::Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "inertia").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine config directory")
        })?;

        let config_dir = project_dirs.config_dir();
        fs::create_dir_all(config_dir)?;

        Ok(Self {
            save_path: config_dir.join("save.dat"),
        })
    }

    /// Uses an explicit save path instead of the platform directory.
    pub fn with_path(save_path: PathBuf) -> Self {
        Self { save_path }
    }

    pub fn has_save(&self) -> bool {
        self.save_path.exists()
    }

    /// Saves the game state to disk.
    ///
    /// File format:
    /// - Version magic (8 bytes)
    /// - Data length (4 bytes)
    /// - Serialized save file (variable length)
    /// - SHA256 checksum (32 bytes)
    pub fn save(&self, state: &GameState) -> io::Result<()> {
        let save_file = SaveFile {
            saved_at: Utc::now().timestamp(),
            state: state.clone(),
        };
        let data = bincode::serialize(&save_file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let data_len = data.len() as u32;

        let mut hasher = Sha256::new();
        hasher.update(SAVE_VERSION_MAGIC.to_le_bytes());
        hasher.update(data_len.to_le_bytes());
        hasher.update(&data);
        let checksum = hasher.finalize();

        let mut file = fs::File::create(&self.save_path)?;
        file.write_all(&SAVE_VERSION_MAGIC.to_le_bytes())?;
        file.write_all(&data_len.to_le_bytes())?;
        file.write_all(&data)?;
        file.write_all(&checksum)?;

        Ok(())
    }

    /// Loads the game state from disk.
    ///
    /// Returns an error if the file is missing, the version magic is
    /// wrong, the checksum fails, or the payload won't deserialize.
    pub fn load(&self) -> io::Result<GameState> {
        let mut file = fs::File::open(&self.save_path)?;

        let mut magic_bytes = [0u8; 8];
        file.read_exact(&mut magic_bytes)?;
        if u64::from_le_bytes(magic_bytes) != SAVE_VERSION_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Save file version mismatch",
            ));
        }

        let mut len_bytes = [0u8; 4];
        file.read_exact(&mut len_bytes)?;
        let data_len = u32::from_le_bytes(len_bytes) as usize;

        let mut data = vec![0u8; data_len];
        file.read_exact(&mut data)?;

        let mut checksum = [0u8; 32];
        file.read_exact(&mut checksum)?;

        let mut hasher = Sha256::new();
        hasher.update(magic_bytes);
        hasher.update(len_bytes);
        hasher.update(&data);
        if hasher.finalize().as_slice() != checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Save file checksum mismatch",
            ));
        }

        let save_file: SaveFile = bincode::deserialize(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(save_file.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentDb;

    fn temp_save_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inertia-save-test-{tag}-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let content = ContentDb::builtin();
        let mut state = GameState::new();
        state.register_character("Vessk", "enforcer", &content);
        state.credits = 99;
        state.push_log("a line worth keeping");

        let path = temp_save_path("roundtrip");
        let manager = SaveManager::with_path(path.clone());
        manager.save(&state).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.credits, 99);
        assert_eq!(loaded.party.len(), 1);
        assert_eq!(loaded.party[0].name, "Vessk");
        assert!(loaded.log.iter().any(|l| l == "a line worth keeping"));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_corrupted_save_rejected() {
        let content = ContentDb::builtin();
        let mut state = GameState::new();
        state.register_character("Mira", "medic", &content);

        let path = temp_save_path("corrupt");
        let manager = SaveManager::with_path(path.clone());
        manager.save(&state).unwrap();

        // Flip a payload byte; the checksum must catch it.
        let mut bytes = fs::read(&path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(manager.load().is_err());
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_save_is_an_error() {
        let manager = SaveManager::with_path(temp_save_path("missing"));
        assert!(!manager.has_save());
        assert!(manager.load().is_err());
    }
}
