//! TCP actuator for LC-Technology relay boards.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use hap_app::ports::Actuator;
use hap_domain::command::Action;
use hap_domain::device::Device;
use hap_domain::error::HapError;

use crate::error::RelayError;

/// Frame switching relay 1 on.
pub const ON_FRAME: [u8; 4] = [0xA0, 0x01, 0x01, 0xA2];
/// Frame switching relay 1 off.
pub const OFF_FRAME: [u8; 4] = [0xA0, 0x01, 0x00, 0xA1];

/// Frame for `action`. Any non-zero level switches the relay on.
#[must_use]
pub fn frame(action: Action) -> [u8; 4] {
    match action {
        Action::On => ON_FRAME,
        Action::Off => OFF_FRAME,
        Action::Dim(level) if level.is_off() => OFF_FRAME,
        Action::Dim(_) => ON_FRAME,
    }
}

/// Sends one frame per command over a short-lived TCP connection.
///
/// The connection is closed before dispatch returns, so a flush has nothing
/// left to send.
#[derive(Debug, Clone)]
pub struct RelayActuator {
    port: u16,
}

impl RelayActuator {
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Actuator for RelayActuator {
    async fn dispatch(&self, device: &Device, action: Action) -> Result<(), HapError> {
        let host = device.hardware_id.as_str();
        let port = self.port;
        let bytes = frame(action);

        let mut stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| RelayError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        tracing::debug!(host, port, frame = ?bytes, "sending relay frame");

        let write = async {
            stream.write_all(&bytes).await?;
            stream.shutdown().await
        };
        write.await.map_err(|source| RelayError::Write {
            host: host.to_string(),
            port,
            source,
        })?;

        tracing::info!(device = %device.logical_name, host, "completed sending command to relay");
        Ok(())
    }
}
