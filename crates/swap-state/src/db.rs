use std::path::Path;

use swap_core::error::SwapError;
use swap_core::escrow::Escrow;
use swap_core::journal::{JournalEntry, LogRecord};
use swap_core::order::Order;
use swap_core::resolver::Resolver;
use swap_core::types::{Address, EscrowId, OrderHash, Role};

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   orders             — OrderHash bytes     → bincode(Order)
///   escrows             — EscrowId bytes       → bincode(Escrow)
///   resolvers           — Address bytes        → bincode(Resolver)
///   used_preimages_src  — preimage bytes       → [] (membership set, source chain)
///   used_preimages_dst  — preimage bytes       → [] (membership set, destination chain)
///   journal             — OrderHash bytes      → bincode(JournalEntry)
///   log                 — u64 be bytes (seq)   → bincode(LogRecord)   (append-only, §4.9)
///   meta                — utf8 key bytes       → raw bytes (sequence counters)
pub struct StateDb {
    _db: sled::Db,
    orders: sled::Tree,
    escrows: sled::Tree,
    resolvers: sled::Tree,
    used_preimages_src: sled::Tree,
    used_preimages_dst: sled::Tree,
    journal: sled::Tree,
    log: sled::Tree,
    meta: sled::Tree,
}

fn storage_err(e: impl std::fmt::Display) -> SwapError {
    SwapError::Storage(e.to_string())
}

fn ser_err(e: impl std::fmt::Display) -> SwapError {
    SwapError::Serialization(e.to_string())
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SwapError> {
        let db = sled::open(path).map_err(storage_err)?;
        let orders = db.open_tree("orders").map_err(storage_err)?;
        let escrows = db.open_tree("escrows").map_err(storage_err)?;
        let resolvers = db.open_tree("resolvers").map_err(storage_err)?;
        let used_preimages_src = db.open_tree("used_preimages_src").map_err(storage_err)?;
        let used_preimages_dst = db.open_tree("used_preimages_dst").map_err(storage_err)?;
        let journal = db.open_tree("journal").map_err(storage_err)?;
        let log = db.open_tree("log").map_err(storage_err)?;
        let meta = db.open_tree("meta").map_err(storage_err)?;
        Ok(Self {
            _db: db,
            orders,
            escrows,
            resolvers,
            used_preimages_src,
            used_preimages_dst,
            journal,
            log,
            meta,
        })
    }

    pub fn flush(&self) -> Result<(), SwapError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }

    // ── Orders ───────────────────────────────────────────────────────────────

    pub fn get_order(&self, order_hash: &OrderHash) -> Result<Option<Order>, SwapError> {
        match self.orders.get(order_hash.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_order(&self, order: &Order) -> Result<(), SwapError> {
        let bytes = bincode::serialize(order).map_err(ser_err)?;
        self.orders
            .insert(order.order_hash.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_orders(&self) -> Result<Vec<Order>, SwapError> {
        let mut out = Vec::new();
        for item in self.orders.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(ser_err)?);
        }
        Ok(out)
    }

    // ── Escrows ──────────────────────────────────────────────────────────────

    pub fn get_escrow(&self, id: &EscrowId) -> Result<Option<Escrow>, SwapError> {
        match self.escrows.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_escrow(&self, escrow: &Escrow) -> Result<(), SwapError> {
        let bytes = bincode::serialize(escrow).map_err(ser_err)?;
        self.escrows
            .insert(escrow.id.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_escrows_for_order(&self, order_hash: &OrderHash) -> Result<Vec<Escrow>, SwapError> {
        let mut out = Vec::new();
        for item in self.escrows.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            let escrow: Escrow = bincode::deserialize(&bytes).map_err(ser_err)?;
            if escrow.order_hash == *order_hash {
                out.push(escrow);
            }
        }
        Ok(out)
    }

    // ── Resolvers ────────────────────────────────────────────────────────────

    pub fn get_resolver(&self, address: &Address) -> Result<Option<Resolver>, SwapError> {
        match self.resolvers.get(&address.0).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_resolver(&self, resolver: &Resolver) -> Result<(), SwapError> {
        let bytes = bincode::serialize(resolver).map_err(ser_err)?;
        self.resolvers
            .insert(&resolver.address.0, bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_resolvers(&self) -> Result<Vec<Resolver>, SwapError> {
        let mut out = Vec::new();
        for item in self.resolvers.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(ser_err)?);
        }
        Ok(out)
    }

    // ── Used preimages (per chain, §3) ──────────────────────────────────────

    fn preimage_tree(&self, role: Role) -> &sled::Tree {
        match role {
            Role::Source => &self.used_preimages_src,
            Role::Destination => &self.used_preimages_dst,
        }
    }

    pub fn preimage_used(&self, role: Role, preimage: &[u8; 32]) -> Result<bool, SwapError> {
        Ok(self
            .preimage_tree(role)
            .contains_key(preimage)
            .map_err(storage_err)?)
    }

    pub fn mark_preimage_used(&self, role: Role, preimage: &[u8; 32]) -> Result<(), SwapError> {
        self.preimage_tree(role)
            .insert(preimage, b"".as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Journal (§3, §4.8(b), §4.9) ──────────────────────────────────────────

    pub fn get_journal(&self, order_hash: &OrderHash) -> Result<Option<JournalEntry>, SwapError> {
        match self.journal.get(order_hash.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_journal(&self, entry: &JournalEntry) -> Result<(), SwapError> {
        let bytes = bincode::serialize(entry).map_err(ser_err)?;
        self.journal
            .insert(entry.order_hash.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_journal(&self) -> Result<Vec<JournalEntry>, SwapError> {
        let mut out = Vec::new();
        for item in self.journal.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(ser_err)?);
        }
        Ok(out)
    }

    pub fn iter_non_terminal_journal(&self) -> Result<Vec<JournalEntry>, SwapError> {
        Ok(self
            .iter_journal()?
            .into_iter()
            .filter(|e| !e.state.is_terminal())
            .collect())
    }

    // ── Append-only log (§4.9) ──────────────────────────────────────────────

    /// Append one log record with `fsync`-level durability (`flush()`) before
    /// returning, so the coordinator never acts on an event it hasn't durably
    /// recorded first.
    pub fn append_log(&self, record: &LogRecord) -> Result<(), SwapError> {
        let bytes = bincode::serialize(record).map_err(ser_err)?;
        self.log
            .insert(record.seq.to_be_bytes(), bytes)
            .map_err(storage_err)?;
        self.flush()?;
        Ok(())
    }

    pub fn iter_log_from(&self, seq: u64) -> Result<Vec<LogRecord>, SwapError> {
        let mut out = Vec::new();
        for item in self.log.scan_prefix([]).filter_map(|r| r.ok()) {
            let (key, bytes) = item;
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&key);
            if u64::from_be_bytes(arr) >= seq {
                out.push(bincode::deserialize(&bytes).map_err(ser_err)?);
            }
        }
        out.sort_by_key(|r: &LogRecord| r.seq);
        Ok(out)
    }

    // ── Meta / sequence allocators ───────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), SwapError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, SwapError> {
        Ok(self
            .meta
            .get(key.as_bytes())
            .map_err(storage_err)?
            .map(|iv| iv.to_vec()))
    }

    fn next_u64(&self, key: &str) -> Result<u64, SwapError> {
        let current = self
            .get_meta(key)?
            .map(|b| {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b[..8]);
                u64::from_be_bytes(arr)
            })
            .unwrap_or(0);
        self.put_meta(key, &(current + 1).to_be_bytes())?;
        Ok(current)
    }

    /// Allocate the next monotonic order nonce (per-maker uniqueness input
    /// to `OrderHash`, §3).
    pub fn next_order_nonce(&self) -> Result<u64, SwapError> {
        self.next_u64("next_order_nonce")
    }

    /// Allocate the next monotonic append-only log sequence number (§4.9).
    pub fn next_log_seq(&self) -> Result<u64, SwapError> {
        self.next_u64("next_log_seq")
    }
}
