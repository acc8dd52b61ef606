//! Fan-out over initial ratings.
//!
//! Every initial rating is an independent task owning its density buffers.
//! With the `parallel` feature the tasks run on the rayon pool; otherwise
//! they run in rating order. Results always come back indexed by rating.

use pa_core::Size;

/// Map `f` over `0..ratings`, returning results in rating order.
pub(crate) fn map_ratings<U, F>(ratings: Size, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(Size) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if ratings > 1 {
            return (0..ratings).into_par_iter().map(f).collect();
        }
    }

    (0..ratings).map(f).collect()
}
