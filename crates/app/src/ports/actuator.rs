//! Actuator port: the hardware side of a command reconciler.

use std::future::Future;

use hap_domain::command::Action;
use hap_domain::device::Device;
use hap_domain::error::HapError;

/// Carries out device actions on real hardware.
pub trait Actuator: Send + Sync {
    /// Perform `action` on `device`.
    fn dispatch(
        &self,
        device: &Device,
        action: Action,
    ) -> impl Future<Output = Result<(), HapError>> + Send;

    /// Flush any pending hardware I/O before shutdown.
    ///
    /// The default implementation has nothing to flush.
    fn flush(&self) -> impl Future<Output = Result<(), HapError>> + Send {
        async { Ok(()) }
    }
}
