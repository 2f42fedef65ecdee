//! NPN4 class database lookup synthesis.

use crate::isop_synth::MmSynthesizer;
use crate::zhegalkin::ZhegalkinSynthesizer;
use crate::Synthesizer;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use veles_subnet::{Subnet, SubnetBuilder};
use veles_tt::{canonicalize, TruthTable};

/// A database of pre-optimized realizations, one per NPN class of
/// functions with at most four variables.
///
/// Classes are materialized lazily: the first lookup of a class
/// synthesizes its representative (keeping the smaller of the ISOP and
/// ESOP realizations) and caches it. The whole table round-trips through
/// bincode, so a warmed cache persists across runs.
#[derive(Default, Serialize, Deserialize)]
pub struct Npn4Database {
    classes: HashMap<(u8, u64), Subnet>,
}

/// Errors loading or saving the persisted database.
#[derive(Debug, thiserror::Error)]
pub enum Npn4StoreError {
    /// The cache file could not be read or written.
    #[error("npn4 database i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The cache file is not a valid database encoding.
    #[error("npn4 database is corrupt: {0}")]
    Corrupt(String),
}

impl Npn4Database {
    /// An empty database; classes fill in on demand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a persisted database, or starts empty when the file is
    /// missing.
    pub fn load_or_default(path: &Path) -> Result<Self, Npn4StoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)?;
        let (db, _) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| Npn4StoreError::Corrupt(e.to_string()))?;
        Ok(db)
    }

    /// Persists the database.
    pub fn save(&self, path: &Path) -> Result<(), Npn4StoreError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Npn4StoreError::Corrupt(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Number of materialized classes.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// The realization of the canonical representative `canon`.
    fn class_subnet(&mut self, canon: &TruthTable) -> &Subnet {
        let bits = match canon {
            TruthTable::Word { bits, .. } => *bits,
            TruthTable::Bits { .. } => unreachable!("npn4 covers at most 4 variables"),
        };
        let key = (canon.num_vars() as u8, bits);
        self.classes.entry(key).or_insert_with(|| {
            let care = TruthTable::ones(canon.num_vars());
            let isop = MmSynthesizer
                .synthesize(canon, &care, 2)
                .expect("ISOP synthesis is total");
            let esop = ZhegalkinSynthesizer
                .synthesize(canon, &care, 2)
                .expect("ESOP synthesis is total");
            if esop.internal_count() < isop.internal_count() {
                esop
            } else {
                isop
            }
        })
    }

    /// Builds a subnet realizing `func` by canonicalizing it, fetching the
    /// class realization, and re-applying the permutation and negations at
    /// the boundary.
    pub fn lookup(&mut self, func: &TruthTable) -> Subnet {
        assert!(func.num_vars() <= 4, "npn4 covers at most 4 variables");
        let (canon, transform) = canonicalize(func);
        let inverse = transform.inverse();
        let class = self.class_subnet(&canon).clone();

        let mut builder = SubnetBuilder::new();
        let inputs = builder.add_inputs(func.num_vars() as usize);
        // f(x) = out' ^ c(z) with z[i] = x[perm'[i]] ^ neg'[i].
        let class_inputs: Vec<_> = (0..func.num_vars() as usize)
            .map(|i| {
                inputs[inverse.perm[i] as usize].with_inv(inverse.input_neg >> i & 1 == 1)
            })
            .collect();
        let out = builder.add_subnet(&class, &class_inputs)[0];
        builder.add_output(out.with_inv(out.is_inv() ^ inverse.output_neg));
        builder.make(true)
    }
}

/// The rewriter's synthesizer: NPN4 database lookup.
pub struct Npn4Synthesizer {
    db: RefCell<Npn4Database>,
}

impl Npn4Synthesizer {
    /// Wraps a database for use as a [`Synthesizer`].
    pub fn new(db: Npn4Database) -> Self {
        Self {
            db: RefCell::new(db),
        }
    }

    /// Unwraps the database (for persisting a warmed cache).
    pub fn into_database(self) -> Npn4Database {
        self.db.into_inner()
    }
}

impl Default for Npn4Synthesizer {
    fn default() -> Self {
        Self::new(Npn4Database::new())
    }
}

impl Synthesizer for Npn4Synthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        _care: &TruthTable,
        _max_arity: usize,
    ) -> Option<Subnet> {
        if func.num_vars() > 4 {
            return None;
        }
        Some(self.db.borrow_mut().lookup(func))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::zoo;
    use veles_subnet::eval::evaluate_single_out;

    #[test]
    fn lookup_reproduces_the_function() {
        let mut db = Npn4Database::new();
        for f in zoo() {
            if f.num_vars() > 4 {
                continue;
            }
            let subnet = db.lookup(&f);
            assert_eq!(evaluate_single_out(&subnet), f, "lookup of {f:?}");
        }
    }

    #[test]
    fn equivalent_functions_share_a_class() {
        let mut db = Npn4Database::new();
        let and = TruthTable::from_binary_str("1000").unwrap();
        let nor = TruthTable::from_binary_str("0001").unwrap(); // ~a & ~b
        db.lookup(&and);
        db.lookup(&nor);
        assert_eq!(db.class_count(), 1, "AND and ~a&~b are NPN-equivalent");
    }

    #[test]
    fn all_two_variable_functions() {
        let mut db = Npn4Database::new();
        for bits in 0u64..16 {
            let f = TruthTable::from_bits(2, bits);
            let subnet = db.lookup(&f);
            assert_eq!(evaluate_single_out(&subnet), f, "bits {bits:#x}");
        }
        assert_eq!(db.class_count(), 4);
    }

    #[test]
    fn exhaustive_three_variable_lookup() {
        let mut db = Npn4Database::new();
        for bits in 0u64..256 {
            let f = TruthTable::from_bits(3, bits);
            let subnet = db.lookup(&f);
            assert_eq!(evaluate_single_out(&subnet), f, "bits {bits:#x}");
        }
        // The 256 three-variable functions fall into 14 NPN classes.
        assert_eq!(db.class_count(), 14);
    }

    #[test]
    fn persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("npn4.bin");
        let mut db = Npn4Database::new();
        db.lookup(&TruthTable::from_hex_str("e8").unwrap());
        let classes = db.class_count();
        db.save(&path).unwrap();

        let restored = Npn4Database::load_or_default(&path).unwrap();
        assert_eq!(restored.class_count(), classes);

        let missing = Npn4Database::load_or_default(&dir.path().join("none.bin")).unwrap();
        assert_eq!(missing.class_count(), 0);
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("npn4.bin");
        std::fs::write(&path, b"not a database").unwrap();
        assert!(Npn4Database::load_or_default(&path).is_err());
    }
}
