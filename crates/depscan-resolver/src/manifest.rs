//! The manifest source consumed by the tree builder.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use depscan_core::coordinate::Coordinate;
use depscan_core::manifest::ResolvedManifest;

/// Fetches and parses the manifest for a coordinate.
///
/// Errors are opaque to the builder: any error prunes the branch that
/// asked for the manifest. Implementations should stop promptly once
/// `cancel` fires.
///
/// # Example (in-memory, for tests)
///
/// ```ignore
/// struct Fixed(HashMap<Coordinate, ResolvedManifest>);
///
/// impl ManifestResolver for Fixed {
///     async fn resolve(
///         &self,
///         _cancel: &CancellationToken,
///         coordinate: &Coordinate,
///     ) -> miette::Result<ResolvedManifest> {
///         self.0.get(coordinate).cloned().ok_or_else(|| miette::miette!("missing {coordinate}"))
///     }
/// }
/// ```
pub trait ManifestResolver {
    fn resolve(
        &self,
        cancel: &CancellationToken,
        coordinate: &Coordinate,
    ) -> impl Future<Output = miette::Result<ResolvedManifest>> + Send;
}
