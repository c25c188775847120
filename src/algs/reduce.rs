//! Fork/join reductions over index ranges.
//!
//! [`ParallelReducer`] splits `[0, n)` into chunks, accumulates each chunk
//! into worker-local state and merges the worker-local states at the end.
//! Every worker owns one accumulator slot, initialized lazily the first time
//! that worker picks up a chunk. Merging happens in an unspecified order, so
//! the merge function must be associative and commutative.
//!
//! The calling thread blocks until the whole reduction completes; there is no
//! cancellation and no partial result.

use crate::mesh_error::MeshDatasetError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tuning knobs for [`ParallelReducer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducerConfig {
    /// Dedicated worker count. `None` uses the global rayon pool,
    /// `Some(1)` runs every reduction serially on the calling thread.
    pub num_threads: Option<usize>,
    /// Smallest chunk handed to a worker.
    pub min_chunk_len: usize,
    /// Target number of chunks per worker, for load balance.
    pub chunks_per_worker: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_chunk_len: 1024,
            chunks_per_worker: 4,
        }
    }
}

#[derive(Clone)]
enum Execution {
    Serial,
    Global,
    Pool(Arc<rayon::ThreadPool>),
}

/// Fork/join executor shared by the geometry, scalar-range and ghost scans.
#[derive(Clone)]
pub struct ParallelReducer {
    config: ReducerConfig,
    exec: Execution,
}

static SHARED: Lazy<ParallelReducer> = Lazy::new(|| ParallelReducer {
    config: ReducerConfig::default(),
    exec: Execution::Global,
});

impl ParallelReducer {
    /// Build a reducer, starting a dedicated pool if `num_threads > 1`.
    pub fn new(config: ReducerConfig) -> Result<Self, MeshDatasetError> {
        let exec = match config.num_threads {
            None => Execution::Global,
            Some(0 | 1) => Execution::Serial,
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("mesh-dataset-{i}"))
                    .build()?;
                Execution::Pool(Arc::new(pool))
            }
        };
        log::debug!("parallel reducer configured: {config:?}");
        Ok(Self { config, exec })
    }

    /// A reducer that always runs on the calling thread.
    pub fn serial() -> Self {
        Self {
            config: ReducerConfig {
                num_threads: Some(1),
                ..ReducerConfig::default()
            },
            exec: Execution::Serial,
        }
    }

    /// The process-wide reducer backed by the global rayon pool.
    pub fn shared() -> &'static ParallelReducer {
        &SHARED
    }

    /// Active configuration.
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Number of workers reductions are spread over.
    pub fn workers(&self) -> usize {
        match &self.exec {
            Execution::Serial => 1,
            Execution::Global => rayon::current_num_threads(),
            Execution::Pool(pool) => pool.current_num_threads(),
        }
    }

    fn chunk_len(&self, n: usize) -> usize {
        let target = (self.workers() * self.config.chunks_per_worker.max(1)).max(1);
        n.div_ceil(target).max(self.config.min_chunk_len.max(1))
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.exec {
            Execution::Pool(pool) => pool.install(op),
            _ => op(),
        }
    }

    /// Reduce `[0, n)` chunk by chunk.
    ///
    /// `init` builds an empty worker-local state, `accumulate` folds one
    /// contiguous index range into it and `merge` combines two states. With
    /// `n == 0` the result is `init()`.
    pub fn reduce_ranges<L, I, A, M>(&self, n: usize, init: I, accumulate: A, merge: M) -> L
    where
        L: Send,
        I: Fn() -> L + Sync,
        A: Fn(&mut L, Range<usize>) + Sync,
        M: Fn(L, L) -> L,
    {
        if n == 0 {
            return init();
        }
        let chunk = self.chunk_len(n);
        if matches!(self.exec, Execution::Serial) || n <= chunk {
            let mut local = init();
            accumulate(&mut local, 0..n);
            return local;
        }

        let workers = self.workers();
        let slots: Vec<Mutex<Option<L>>> = (0..workers).map(|_| Mutex::new(None)).collect();
        // states for chunks that could not claim their worker's slot
        let spill: Mutex<Vec<L>> = Mutex::new(Vec::new());
        let n_chunks = n.div_ceil(chunk);
        log::trace!("reduce over {n} indices: {n_chunks} chunks of {chunk} on {workers} workers");

        self.install(|| {
            (0..n_chunks).into_par_iter().for_each(|c| {
                let range = c * chunk..((c + 1) * chunk).min(n);
                let slot = rayon::current_thread_index().and_then(|t| slots.get(t));
                match slot.and_then(|s| s.try_lock()) {
                    Some(mut guard) => {
                        let local = guard.get_or_insert_with(&init);
                        accumulate(local, range);
                    }
                    None => {
                        let mut local = init();
                        accumulate(&mut local, range);
                        spill.lock().push(local);
                    }
                }
            });
        });

        slots
            .into_iter()
            .filter_map(Mutex::into_inner)
            .chain(spill.into_inner())
            .reduce(merge)
            .unwrap_or_else(init)
    }

    /// Reduce `[0, n)` one index at a time.
    pub fn reduce<L, I, A, M>(&self, n: usize, init: I, accumulate: A, merge: M) -> L
    where
        L: Send,
        I: Fn() -> L + Sync,
        A: Fn(&mut L, usize) + Sync,
        M: Fn(L, L) -> L,
    {
        self.reduce_ranges(
            n,
            init,
            |local, range| {
                for i in range {
                    accumulate(local, i);
                }
            },
            merge,
        )
    }

    /// Short-circuiting OR over `pred(i)` for `i` in `[0, n)`.
    ///
    /// Once any worker finds a match, remaining chunks are skipped.
    pub fn any<P>(&self, n: usize, pred: P) -> bool
    where
        P: Fn(usize) -> bool + Sync,
    {
        let found = AtomicBool::new(false);
        self.reduce_ranges(
            n,
            || false,
            |hit, range| {
                if *hit || found.load(Ordering::Relaxed) {
                    return;
                }
                for i in range {
                    if pred(i) {
                        *hit = true;
                        found.store(true, Ordering::Relaxed);
                        return;
                    }
                }
            },
            |a, b| a || b,
        )
    }

    /// Run `f(tile_index, tile)` over consecutive `tile_len`-sized tiles of
    /// `data`, in parallel unless the reducer is serial.
    pub fn for_each_tile_mut<T, F>(&self, data: &mut [T], tile_len: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        let tile_len = tile_len.max(1);
        match &self.exec {
            Execution::Serial => {
                for (i, tile) in data.chunks_mut(tile_len).enumerate() {
                    f(i, tile);
                }
            }
            _ => self.install(|| {
                data.par_chunks_mut(tile_len)
                    .enumerate()
                    .for_each(|(i, tile)| f(i, tile));
            }),
        }
    }
}

impl std::fmt::Debug for ParallelReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.exec {
            Execution::Serial => "serial",
            Execution::Global => "global",
            Execution::Pool(_) => "pool",
        };
        f.debug_struct("ParallelReducer")
            .field("mode", &mode)
            .field("workers", &self.workers())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for ParallelReducer {
    fn default() -> Self {
        ParallelReducer::shared().clone()
    }
}
