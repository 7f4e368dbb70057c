use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use docseal_sdk::{LocalSigner, SignError, SignedTransaction, SigningKey, SigningService, Transaction};

/// Read the hex-encoded signing key at `path`, if there is one.
pub fn load_key(path: &Path) -> anyhow::Result<Option<SigningKey>> {
    match std::fs::read_to_string(path) {
        Ok(text) => SigningKey::from_hex(&text)
            .map(Some)
            .with_context(|| format!("malformed signing key in {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
    }
}

pub fn write_key(path: &Path, key: &SigningKey) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, key.to_hex())
        .with_context(|| format!("cannot write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Existing key, or a freshly generated one saved at `path`.
pub fn load_or_create_key(path: &Path) -> anyhow::Result<(SigningKey, bool)> {
    if let Some(key) = load_key(path)? {
        return Ok((key, false));
    }
    let key = SigningKey::generate();
    write_key(path, &key)?;
    Ok((key, true))
}

fn is_approval(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Signs with the local key after the operator approves on the terminal.
pub struct ConsoleSigner {
    inner: LocalSigner,
    auto_approve: bool,
}

impl ConsoleSigner {
    pub fn new(key: SigningKey, auto_approve: bool) -> Self {
        Self {
            inner: LocalSigner::new(key),
            auto_approve,
        }
    }

    async fn approve(&self, transaction: &Transaction) -> Result<bool, SignError> {
        if self.auto_approve {
            return Ok(true);
        }
        eprintln!("Anchoring transaction");
        eprintln!("  account: {}", transaction.sender);
        eprintln!("  note:    {}", String::from_utf8_lossy(&transaction.note));
        eprintln!(
            "  valid:   rounds {}..={} on {}",
            transaction.first_valid, transaction.last_valid, transaction.genesis_id
        );
        eprint!("Sign and submit? [y/N] ");
        io::stderr().flush().map_err(|e| SignError::Failed(e.to_string()))?;

        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| SignError::Failed(e.to_string()))?
        .map_err(|e| SignError::Failed(e.to_string()))?;
        Ok(is_approval(&answer))
    }
}

#[async_trait]
impl SigningService for ConsoleSigner {
    fn address(&self) -> docseal_sdk::AccountAddress {
        self.inner.address()
    }

    async fn sign(&self, transaction: &Transaction) -> Result<SignedTransaction, SignError> {
        if !self.approve(transaction).await? {
            return Err(SignError::Cancelled);
        }
        self.inner.sign_now(transaction)
    }
}
