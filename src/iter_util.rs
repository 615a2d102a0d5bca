use rayon::prelude::*;

/// Wrapper around either a serial or parallel iterator, returned by
/// [`MaybeParIter::maybe_par_iter`].
pub enum MaybeParallel<PI: ParallelIterator, SI: Iterator<Item = PI::Item>> {
    Serial(SI),
    Parallel(PI),
}

impl<PI: IndexedParallelIterator, SI: Iterator<Item = PI::Item>> MaybeParallel<PI, SI> {
    /// Apply `f` to each item and collect the results in iteration order.
    pub fn map_collect<R: Send, F: Fn(PI::Item) -> R + Send + Sync>(self, f: F) -> Vec<R> {
        match self {
            MaybeParallel::Serial(iter) => iter.map(f).collect(),
            MaybeParallel::Parallel(iter) => iter.map(f).collect(),
        }
    }
}

/// Trait which allows use of Rayon parallelism to be conditionally enabled.
pub trait MaybeParIter {
    type Item;
    type ParIter: ParallelIterator<Item = Self::Item>;
    type Iter: Iterator<Item = Self::Item>;

    /// Return an iterator which executes either in serial on the current
    /// thread, or in parallel in a Rayon thread pool if `parallel` is true.
    fn maybe_par_iter(self, parallel: bool) -> MaybeParallel<Self::ParIter, Self::Iter>;
}

impl<Item, I: rayon::iter::IntoParallelIterator<Item = Item> + IntoIterator<Item = Item>>
    MaybeParIter for I
{
    type Item = Item;
    type ParIter = I::Iter;
    type Iter = I::IntoIter;

    fn maybe_par_iter(self, parallel: bool) -> MaybeParallel<Self::ParIter, Self::Iter> {
        if parallel {
            MaybeParallel::Parallel(self.into_par_iter())
        } else {
            MaybeParallel::Serial(self.into_iter())
        }
    }
}
