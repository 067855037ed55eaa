use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use super::errors::KeyError;
use super::pair::KeyPair;

pub const PRIVATE_KEY_FILE: &str = "private.pem";
pub const PUBLIC_KEY_FILE: &str = "public.pem";

/// Outcome of provisioning the signing key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Both key files were already present and left untouched.
    Existing,
    /// A new key pair was generated and written.
    Generated,
}

/// Owns the on-disk location of the signing key pair.
///
/// Keys are generated once and reused for the lifetime of the deployment.
/// Regenerating them invalidates every outstanding token.
#[derive(Debug, Clone)]
pub struct KeyProvider {
    directory: PathBuf,
    bits: usize,
}

impl KeyProvider {
    /// Create a provider for keys stored in `directory`.
    ///
    /// # Arguments
    /// * `directory` - Directory holding `private.pem` and `public.pem`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            bits: KeyPair::DEFAULT_BITS,
        }
    }

    /// Set the modulus size used when a new pair has to be generated.
    pub fn with_bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.directory.join(PRIVATE_KEY_FILE)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.directory.join(PUBLIC_KEY_FILE)
    }

    /// Make sure both key files exist, generating a new pair if either is missing.
    ///
    /// Idempotent: when both files are present nothing is read or written.
    ///
    /// # Returns
    /// Whether the pair already existed or was generated
    ///
    /// # Errors
    /// * `GenerationFailed` - Key generation failed
    /// * `WriteFailed` - Directory or key files could not be written
    pub fn ensure_keypair(&self) -> Result<KeyStatus, KeyError> {
        let private_path = self.private_key_path();
        let public_path = self.public_key_path();

        if private_path.is_file() && public_path.is_file() {
            tracing::debug!(directory = %self.directory.display(), "Signing key pair already exists");
            return Ok(KeyStatus::Existing);
        }

        tracing::info!(
            directory = %self.directory.display(),
            bits = self.bits,
            "Signing key pair missing, generating a new one"
        );

        fs::create_dir_all(&self.directory).map_err(|e| {
            KeyError::WriteFailed(format!("{}: {}", self.directory.display(), e))
        })?;

        let pair = KeyPair::generate(self.bits)?;
        write_key(&private_path, pair.private_pem(), true)?;
        write_key(&public_path, pair.public_pem(), false)?;

        tracing::info!(directory = %self.directory.display(), "Signing key pair generated");

        Ok(KeyStatus::Generated)
    }

    /// Read both key files.
    ///
    /// # Errors
    /// * `Unavailable` - Either file is missing or unreadable
    pub fn load(&self) -> Result<KeyPair, KeyError> {
        let private_pem = read_key(&self.private_key_path())?;
        let public_pem = read_key(&self.public_key_path())?;

        Ok(KeyPair::new(private_pem, public_pem))
    }
}

fn read_key(path: &Path) -> Result<String, KeyError> {
    fs::read_to_string(path)
        .map_err(|e| KeyError::Unavailable(format!("{}: {}", path.display(), e)))
}

fn write_key(path: &Path, contents: &str, private: bool) -> Result<(), KeyError> {
    let write_failed =
        |e: std::io::Error| KeyError::WriteFailed(format!("{}: {}", path.display(), e));

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    if private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(write_failed)?;

    // The open mode only applies to new files; a truncated leftover keeps its old bits.
    #[cfg(unix)]
    if private {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(write_failed)?;
    }
    #[cfg(not(unix))]
    let _ = private;

    file.write_all(contents.as_bytes()).map_err(write_failed)
}
