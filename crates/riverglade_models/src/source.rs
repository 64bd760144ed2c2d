use std::future::Future;

use crate::catalog::ModelEntry;
use crate::error::LoadError;
use crate::template::ModelTemplate;

/// Where model templates come from
///
/// Loads are driven on the caller's thread; implementations may suspend
/// while waiting on I/O.
pub trait ModelSource {
    fn load(&self, entry: &ModelEntry) -> impl Future<Output = Result<ModelTemplate, LoadError>>;
}
