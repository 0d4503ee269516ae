//! Destructive operations behind an explicit capability.
//!
//! Dropping tables requires an [`AdminToken`], which only [`AdminGate::authenticate`] can hand
//! out. There is no process-wide "admin mode".

use crate::error::{IngestError, IngestResult};
use crate::naming::Identifier;
use crate::store::Store;

/// Proof that the caller passed [`AdminGate::authenticate`].
#[derive(Debug)]
pub struct AdminToken {
    _private: (),
}

/// Checks admin secrets.
#[derive(Clone)]
pub struct AdminGate {
    secret: Option<String>,
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("secret_set", &self.secret.is_some())
            .finish()
    }
}

impl AdminGate {
    /// A gate accepting `secret`. `None` (or an empty secret) refuses everyone.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn authenticate(&self, attempt: &str) -> IngestResult<AdminToken> {
        match &self.secret {
            Some(secret) if secrets_match(secret.as_bytes(), attempt.as_bytes()) => {
                Ok(AdminToken { _private: () })
            }
            _ => {
                log::warn!("admin authentication refused");
                Err(IngestError::Unauthorized)
            }
        }
    }
}

// Compares every byte regardless of where the first difference is.
fn secrets_match(expected: &[u8], attempt: &[u8]) -> bool {
    if expected.len() != attempt.len() {
        return false;
    }
    expected
        .iter()
        .zip(attempt)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Drop one table. The name is normalized like every other table reference.
pub fn drop_table(store: &mut Store, _token: &AdminToken, name: &str) -> IngestResult<String> {
    let table = Identifier::normalize(name);
    store.drop_table(&table)?;
    log::warn!("dropped table '{table}'");
    Ok(table.into_string())
}

/// Drop every table in the catalog, including the embedded-file registry. Returns the dropped
/// names.
pub fn drop_all_tables(store: &mut Store, _token: &AdminToken) -> IngestResult<Vec<String>> {
    let names = store.table_names()?;
    let tx = store.transaction()?;
    for name in &names {
        tx.drop_table(name)?;
    }
    tx.commit()?;
    log::warn!("dropped {} table(s)", names.len());
    Ok(names)
}
