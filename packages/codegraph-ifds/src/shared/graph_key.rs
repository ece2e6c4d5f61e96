//! Bounds shared by statement and method handles

use std::fmt::Debug;
use std::hash::Hash;

/// Requirements on node (`N`) and method (`M`) handles of the analyzed program
///
/// Handles are cloned freely and used as map keys from many worker threads,
/// so they should be cheap to clone (interned ids, `Arc<str>`, small structs).
pub trait GraphKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> GraphKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
