//! Reading plans: split a document's pages into fixed-size batches, one
//! batch per delivery.

use anyhow::{bail, Result};

/// Groups `pages` into consecutive batches of `per_batch` pages.
///
/// The last batch holds the remainder, so there are `ceil(n / per_batch)`
/// batches and page order is preserved.
pub fn batch_pages(pages: &[String], per_batch: usize) -> Result<Vec<Vec<String>>> {
    if per_batch == 0 {
        bail!("pages per batch must be > 0");
    }
    Ok(pages.chunks(per_batch).map(|c| c.to_vec()).collect())
}
