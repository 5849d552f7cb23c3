//! # CustodyDb — Persistent State
//!
//! Persists one custody deployment in sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                  | Value                    |
//! |------------|----------------------|--------------------------|
//! | `wallets`  | `address` (20 bytes) | `bincode(WalletRecord)`  |
//! | `metadata` | key (UTF-8)          | bincode / raw bytes      |
//! | `events`   | `seq` (8B BE)        | `json(CustodyEvent)`     |
//!
//! `metadata` holds the three pools, the tokenomics, the max batch size,
//! the role table, the devnet token ledger and the next event sequence
//! number. Sequence numbers are big-endian so sled's lexicographic order
//! matches numeric order. Events are JSON so the journal reads without the
//! engine's types.
//!
//! Every write goes through one multi-tree transaction: a commit lands in
//! all three trees or in none.

use std::path::Path;

use custody_engine::pools::PoolSet;
use custody_engine::{
    Address, CustodyEvent, CustodyState, MemoryLedger, RoleTable, Tokenomics, WalletRecord,
    WalletRegistry,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use sled::{Batch, Db, Transactional, Tree};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

const META_POOLS: &str = "pools";
const META_TOKENOMICS: &str = "tokenomics";
const META_MAX_BATCH_SIZE: &str = "max_batch_size";
const META_ROLES: &str = "roles";
const META_LEDGER: &str = "ledger";
const META_EVENT_SEQ: &str = "next_event_seq";

// ---------------------------------------------------------------------------
// CustodyDb
// ---------------------------------------------------------------------------

/// Persistent storage for one custody deployment.
#[derive(Debug, Clone)]
pub struct CustodyDb {
    db: Db,
    wallets: Tree,
    metadata: Tree,
    events: Tree,
}

impl CustodyDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let wallets = db.open_tree("wallets")?;
        let metadata = db.open_tree("metadata")?;
        let events = db.open_tree("events")?;
        Ok(Self {
            db,
            wallets,
            metadata,
            events,
        })
    }

    /// `true` once `init` has written a deployment.
    pub fn is_initialized(&self) -> DbResult<bool> {
        Ok(self.metadata.contains_key(META_TOKENOMICS)?)
    }

    // -- State --------------------------------------------------------------

    /// Writes the registry, pools and configuration slots.
    pub fn save_state(&self, state: &CustodyState) -> DbResult<()> {
        let mut staged = Staged::default();
        staged.state(state)?;
        self.apply(&staged)?;
        Ok(())
    }

    /// Rebuilds the state written by [`save_state`](Self::save_state).
    pub fn load_state(&self) -> DbResult<CustodyState> {
        let tokenomics: Tokenomics = self.get_meta(META_TOKENOMICS)?;
        let pools: PoolSet = self.get_meta(META_POOLS)?;
        let max_batch_size = match self.metadata.get(META_MAX_BATCH_SIZE)? {
            Some(bytes) => {
                let raw = u64::from_be_bytes(
                    bytes
                        .as_ref()
                        .try_into()
                        .map_err(|_| DbError::Serialization("invalid batch size bytes".to_string()))?,
                );
                usize::try_from(raw)
                    .map_err(|_| DbError::Serialization("max batch size out of range".to_string()))?
            }
            None => return Err(DbError::NotFound(META_MAX_BATCH_SIZE.to_string())),
        };

        let mut registry = WalletRegistry::new();
        for entry in self.wallets.iter() {
            let (key, value) = entry?;
            let bytes: [u8; 20] = key
                .as_ref()
                .try_into()
                .map_err(|_| DbError::Serialization("invalid address key".to_string()))?;
            let record: WalletRecord = decode(&value)?;
            registry.insert(Address::new(bytes), record);
        }

        Ok(CustodyState {
            registry,
            pools,
            tokenomics,
            max_batch_size,
        })
    }

    /// Number of wallet records stored.
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    // -- Collaborators ------------------------------------------------------

    /// Persists the capability table.
    pub fn save_roles(&self, roles: &RoleTable) -> DbResult<()> {
        let mut staged = Staged::default();
        staged.meta(META_ROLES, roles)?;
        self.apply(&staged)?;
        Ok(())
    }

    /// Loads the capability table.
    pub fn load_roles(&self) -> DbResult<RoleTable> {
        self.get_meta(META_ROLES)
    }

    /// Persists the devnet token ledger.
    pub fn save_ledger(&self, ledger: &MemoryLedger) -> DbResult<()> {
        let mut staged = Staged::default();
        staged.meta(META_LEDGER, ledger)?;
        self.apply(&staged)?;
        Ok(())
    }

    /// Loads the devnet token ledger.
    pub fn load_ledger(&self) -> DbResult<MemoryLedger> {
        self.get_meta(META_LEDGER)
    }

    // -- Events -------------------------------------------------------------

    /// Appends `events` after the last stored one. Returns the sequence
    /// number the next event will get.
    pub fn append_events(&self, events: &[CustodyEvent]) -> DbResult<u64> {
        let mut staged = Staged::default();
        staged.events(events)?;
        self.apply(&staged)
    }

    /// Up to `limit` events starting at sequence number `from`.
    pub fn events(&self, from: u64, limit: usize) -> DbResult<Vec<(u64, CustodyEvent)>> {
        let mut out = Vec::new();
        for entry in self.events.range(from.to_be_bytes()..).take(limit) {
            let (key, value) = entry?;
            let seq = u64::from_be_bytes(
                key.as_ref()
                    .try_into()
                    .map_err(|_| DbError::Serialization("invalid event key".to_string()))?,
            );
            let event: CustodyEvent =
                serde_json::from_slice(&value).map_err(|e| DbError::Serialization(e.to_string()))?;
            out.push((seq, event));
        }
        Ok(out)
    }

    // -- Utility ------------------------------------------------------------

    /// Writes state, collaborators and new events in one transaction, then
    /// flushes.
    pub fn commit(
        &self,
        state: &CustodyState,
        roles: &RoleTable,
        ledger: &MemoryLedger,
        events: &[CustodyEvent],
    ) -> DbResult<()> {
        let mut staged = Staged::default();
        staged.state(state)?;
        staged.meta(META_ROLES, roles)?;
        staged.meta(META_LEDGER, ledger)?;
        staged.events(events)?;
        let next = self.apply(&staged)?;
        self.flush()?;
        tracing::debug!(
            wallets = state.registry.len(),
            next_event = next,
            "custody state committed"
        );
        Ok(())
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Applies `staged` across the three trees atomically. Returns the next
    /// event sequence number.
    fn apply(&self, staged: &Staged) -> DbResult<u64> {
        let trees = (&self.wallets, &self.metadata, &self.events);
        let result: TransactionResult<u64, DbError> =
            trees.transaction(|(wallets, metadata, events)| {
                wallets.apply_batch(&staged.wallets)?;
                for (key, value) in &staged.metadata {
                    metadata.insert(*key, value.clone())?;
                }

                let mut next = match metadata.get(META_EVENT_SEQ)? {
                    Some(bytes) => decode_seq(&bytes).map_err(ConflictableTransactionError::Abort)?,
                    None => 0,
                };
                for json in &staged.events {
                    events.insert(&next.to_be_bytes()[..], json.clone())?;
                    next += 1;
                }
                metadata.insert(META_EVENT_SEQ, &next.to_be_bytes()[..])?;
                Ok(next)
            });

        result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => DbError::Sled(e),
        })
    }

    fn get_meta<T: DeserializeOwned>(&self, key: &str) -> DbResult<T> {
        match self.metadata.get(key)? {
            Some(bytes) => decode(&bytes),
            None => Err(DbError::NotFound(key.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Staged Writes
// ---------------------------------------------------------------------------

/// Encoded writes waiting for [`CustodyDb::apply`]. Encoding happens up
/// front so the transaction body only touches sled.
#[derive(Default)]
struct Staged {
    wallets: Batch,
    metadata: Vec<(&'static str, Vec<u8>)>,
    events: Vec<Vec<u8>>,
}

impl Staged {
    fn state(&mut self, state: &CustodyState) -> DbResult<()> {
        for (address, record) in state.registry.iter() {
            self.wallets
                .insert(address.as_bytes().as_slice(), encode(record)?);
        }
        self.meta(META_POOLS, &state.pools)?;
        self.meta(META_TOKENOMICS, &state.tokenomics)?;
        let max = u64::try_from(state.max_batch_size)
            .map_err(|_| DbError::Serialization("max batch size out of range".to_string()))?;
        self.metadata
            .push((META_MAX_BATCH_SIZE, max.to_be_bytes().to_vec()));
        Ok(())
    }

    fn meta<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> DbResult<()> {
        self.metadata.push((key, encode(value)?));
        Ok(())
    }

    fn events(&mut self, events: &[CustodyEvent]) -> DbResult<()> {
        for event in events {
            let json =
                serde_json::to_vec(event).map_err(|e| DbError::Serialization(e.to_string()))?;
            self.events.push(json);
        }
        Ok(())
    }
}

fn decode_seq(bytes: &[u8]) -> DbResult<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DbError::Serialization("invalid sequence bytes".to_string()))?;
    Ok(u64::from_be_bytes(raw))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
