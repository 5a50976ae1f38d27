//! Path-scoped extraction.
//!
//! A restricted, XPath-flavored selector used to narrow record extraction
//! to matching subtrees: element-name steps, the current-node step, and
//! attribute / child-text predicates. Anything outside that grammar is an
//! [`InvalidPathExpression`](crate::Error::InvalidPathExpression): there is
//! deliberately no descendant axis, no functions, no arithmetic.
//!
//! Compiled expressions are cached process-wide in an LRU keyed by the
//! expression string; compilation is cheap but query front ends tend to
//! re-issue the same handful of paths per workload.

pub mod eval;
pub mod parser;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock};

use lru::LruCache;

use crate::error::Result;

pub use eval::select;
pub use parser::{PathExpr, Predicate, Step, StepTest};

const CACHE_CAPACITY: usize = 64;

static COMPILED: OnceLock<Mutex<LruCache<String, Arc<PathExpr>>>> = OnceLock::new();

/// Compile an expression, consulting the process-wide cache first.
pub fn compile(expression: &str) -> Result<Arc<PathExpr>> {
    let cache = COMPILED.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(CACHE_CAPACITY).unwrap(),
        ))
    });
    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(hit) = cache.get(expression) {
        return Ok(Arc::clone(hit));
    }
    let compiled = Arc::new(parser::parse(expression)?);
    cache.put(expression.to_string(), Arc::clone(&compiled));
    Ok(compiled)
}
