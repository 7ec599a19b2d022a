//! End-to-end tests for full driver runtimes.
//!
//! Each test wires a real driver to a real [`BusSession`] over the in-memory
//! transport and runs it through `hap_app::driver::run`, exactly as `hapd`
//! does with the MQTT transport. No broker is needed.

use hap_adapter_caplog::CaplogDriver;
use hap_adapter_relay::{RelayConfig, RelayDriver, RelaySpec};
use hap_adapter_rf::{LightingConfig, LightingDriver, SensorConfig, SensorDriver};
use hap_adapter_salvo::{Salvo, SalvoAction, SalvoConfig, SalvoDriver, Trigger};
use hap_app::driver::{self, Driver, Signal};
use hap_app::session::{BusSession, SessionConfig};
use hap_app::testing::{MemoryConnector, MemoryHandle, MemoryTransport};
use hap_domain::error::HapError;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Running {
    handle: MemoryHandle,
    signals: mpsc::Sender<Signal>,
    task: JoinHandle<Result<(), HapError>>,
}

fn json(payload: &[u8]) -> serde_json::Value {
    serde_json::from_slice(payload).expect("payload should be JSON")
}

/// Start `driver` under `driver_id` with house id `home`.
fn spawn<D>(driver: D, driver_id: &str) -> Running
where
    D: Driver<MemoryTransport> + 'static,
{
    let (connector, handle) = MemoryConnector::new();
    let (session, events) = BusSession::connect(connector, SessionConfig::new(driver_id, "home"))
        .expect("memory connector should accept any options");
    let (signals, rx) = mpsc::channel(4);
    let task = tokio::spawn(driver::run(driver, session, events, rx));
    Running {
        handle,
        signals,
        task,
    }
}

impl Running {
    async fn stop(self) -> MemoryHandle {
        self.signals
            .send(Signal::Interrupt)
            .await
            .expect("driver should still be running");
        self.task
            .await
            .expect("driver task should not panic")
            .expect("driver should stop cleanly");
        self.handle
    }
}

// ---------------------------------------------------------------------------
// Lighting
// ---------------------------------------------------------------------------

fn lighting() -> LightingConfig {
    let toml = r#"
        [[switches]]
        id = "0x00F0A1-1"
        name = "hall_light"
        group = "downstairs"
        dimming = true

        [[switches]]
        id = "0x00F0A1-2"
        name = "lounge_lamp"
        group = "downstairs"
    "#;
    toml::from_str(toml).expect("lighting config should parse")
}

#[tokio::test]
async fn should_report_up_then_confirm_commands_then_disconnect() {
    let running = spawn(LightingDriver::new(lighting()), "home-lighting");
    running.handle.connected(false);
    running
        .handle
        .message("home/events/switch/hall_light/set", b"7", false);
    running
        .handle
        .message("home/events/switch/hall_light/set", b"off", false);
    let handle = running.stop().await;

    let published = handle.published();
    let topics: Vec<_> = published.iter().map(|m| m.topic.as_str()).collect();
    assert_eq!(
        topics,
        [
            "home/system/status/home-lighting",
            "home/events/rfxcom/lighting1/transmit",
            "home/events/lighting/hall_light",
            "home/events/rfxcom/lighting1/transmit",
            "home/events/lighting/hall_light",
        ]
    );
    assert_eq!(json(&published[0].payload)["status"], "up");
    assert_eq!(json(&published[2].payload)["level"], 7);
    assert_eq!(json(&published[4].payload)["status"], "off");
    assert_eq!(json(&published[4].payload)["level"], 0);
    assert_eq!(
        handle.subscribed(),
        ["home/devices/rfxcom/events", "home/events/switch/+/set"]
    );
    assert!(handle.is_disconnected());
}

#[tokio::test]
async fn should_register_down_status_as_last_will() {
    let running = spawn(LightingDriver::new(lighting()), "home-lighting");
    let options = running
        .handle
        .connect_options()
        .expect("connector should have been used");
    assert_eq!(options.client_id, "home-lighting");
    assert_eq!(options.last_will.topic, "home/system/status/home-lighting");
    assert!(options.last_will.retain);
    assert_eq!(json(&options.last_will.payload)["status"], "down");
    running.stop().await;
}

#[tokio::test]
async fn should_clear_retained_echo_on_startup() {
    let running = spawn(LightingDriver::new(lighting()), "home-lighting");
    running.handle.connected(false);
    running
        .handle
        .message("home/events/switch/hall_light/set", b"on", true);
    let handle = running.stop().await;

    let cleared = handle.published_on("home/events/switch/hall_light/set");
    assert_eq!(cleared.len(), 1);
    assert!(cleared[0].payload.is_empty());
    assert!(cleared[0].retain);
    assert!(handle.published_on("home/events/lighting/hall_light").is_empty());
}

#[tokio::test]
async fn should_fan_out_remote_group_press() {
    let running = spawn(LightingDriver::new(lighting()), "home-lighting");
    running.handle.connected(false);
    running.handle.message(
        "home/devices/rfxcom/events",
        br#"{"type":"lighting2","id":"0x00F0A1","unitcode":1,"command":"Group Off"}"#,
        false,
    );
    let handle = running.stop().await;

    for name in ["hall_light", "lounge_lamp"] {
        let published = handle.published_on(&format!("home/events/lighting/{name}"));
        assert_eq!(published.len(), 1, "{name} should be confirmed once");
        assert_eq!(json(&published[0].payload)["status"], "off");
        assert_eq!(json(&published[0].payload)["level"], 0);
    }
}

#[tokio::test]
async fn should_not_start_before_first_handshake() {
    let running = spawn(LightingDriver::new(lighting()), "home-lighting");
    let handle = running.stop().await;
    assert!(handle.subscribed().is_empty());
    assert!(handle.published().is_empty());
    assert!(handle.is_disconnected());
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_publish_sensor_reading() {
    let config: SensorConfig = toml::from_str(
        r#"
        [[devices]]
        id = "0xA201"
        name = "lounge"
        "#,
    )
    .expect("sensor config should parse");
    let running = spawn(SensorDriver::new(config), "home-sensors");
    running.handle.connected(false);
    running.handle.message(
        "home/devices/rfxcom/events",
        br#"{"type":"th1","id":"0xA201","temperature":20.5,"humidity":40}"#,
        false,
    );
    let handle = running.stop().await;

    let published = handle.published_on("home/events/temperature_sensor/lounge");
    assert_eq!(published.len(), 1);
    let reading = json(&published[0].payload);
    assert_eq!(reading["temperature"], "20.5");
    assert_eq!(reading["humidity"], "40");
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_drive_relay_board_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let port = listener.local_addr().expect("listener has an address").port();
    let board = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("driver should connect");
        let mut frame = Vec::new();
        socket
            .read_to_end(&mut frame)
            .await
            .expect("frame should be readable");
        frame
    });

    let config = RelayConfig {
        port,
        relays: vec![RelaySpec {
            name: "garden_pump".to_string(),
            host: "127.0.0.1".to_string(),
        }],
        ..RelayConfig::default()
    };
    let running = spawn(RelayDriver::new(config), "home-relay");
    running.handle.connected(false);
    running
        .handle
        .message("home/devices/relay/garden_pump/set", b"off", false);
    let handle = running.stop().await;

    assert_eq!(board.await.expect("board task"), [0xA0, 0x01, 0x00, 0xA1]);
    let published = handle.published_on("home/devices/relay/garden_pump");
    assert_eq!(json(&published[0].payload)["status"], "off");
}

// ---------------------------------------------------------------------------
// Salvo
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_fire_salvo_on_trigger() {
    let config = SalvoConfig {
        salvos: vec![Salvo {
            topic: "events/scene/night/set".to_string(),
            triggers: vec![Trigger {
                value: "on".to_string(),
                revertive: "events/scene/night".to_string(),
                actions: vec![SalvoAction {
                    topic: "events/switch/hall_light/set".to_string(),
                    value: "off".to_string(),
                }],
            }],
        }],
    };
    let running = spawn(SalvoDriver::new(config), "home-salvo");
    running.handle.connected(false);
    running
        .handle
        .message("home/events/scene/night/set", b"on", false);
    let handle = running.stop().await;

    let action = handle.published_on("home/events/switch/hall_light/set");
    assert_eq!(action[0].payload, b"off");
    let revertive = handle.published_on("home/events/scene/night");
    assert_eq!(json(&revertive[0].payload)["status"], "on");
}

// ---------------------------------------------------------------------------
// Caplog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_stop_when_transport_closes() {
    let running = spawn(CaplogDriver::new(), "home-caplog");
    running.handle.connected(false);
    running.handle.message("home/anything/at/all", b"hello", false);
    let Running {
        handle,
        signals,
        task,
    } = running;
    drop(handle);

    task.await
        .expect("driver task should not panic")
        .expect("closed transport is a clean stop");
    assert!(!signals.is_closed());
}
