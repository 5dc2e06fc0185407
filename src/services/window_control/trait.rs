use crate::error::Result;
use crate::events::{WindowId, WindowSnapshot, WindowUpdate};

/// Window-control boundary: read and change geometry/state of one window by id.
/// Purely request driven, there is no enumeration or polling.
#[async_trait::async_trait]
pub trait WindowControl: Send + Sync {
    async fn get(&self, window_id: WindowId) -> Result<WindowSnapshot>;

    /// Applies the set fields of `update` and returns the resulting snapshot.
    async fn update(&self, window_id: WindowId, update: WindowUpdate) -> Result<WindowSnapshot>;
}
