// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone};
use serde_json::{Value, json};

use super::*;
use crate::command::CommandValue;
use crate::protocol::scripted::ScriptedTransport;
use crate::protocol::{Method, Params};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

struct Harness {
    coordinator: Coordinator<ScriptedTransport>,
    transport: ScriptedTransport,
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl Harness {
    fn new(config: CoordinatorConfig) -> Self {
        let transport = ScriptedTransport::new();
        let client = DeviceClient::with_transport("192.168.1.42", transport.clone()).unwrap();
        let now = Arc::new(Mutex::new(at(0)));
        let clock = Arc::clone(&now);
        let coordinator = Coordinator::builder(client)
            .config(config)
            .clock(move || *clock.lock())
            .build()
            .unwrap();
        Self {
            coordinator,
            transport,
            now,
        }
    }

    fn with_defaults() -> Self {
        Self::new(CoordinatorConfig::default())
    }

    fn descriptor(&self, value: &Value) {
        self.transport.reply_json("system_info", value);
    }

    fn state(&self, value: &Value) {
        self.transport.reply_json("state", value);
    }

    fn advance_clock(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += TimeDelta::seconds(secs);
    }

    fn gets(&self, endpoint: &str) -> usize {
        self.transport.count(Method::Get, endpoint)
    }

    fn posts(&self) -> Vec<(String, String)> {
        self.transport
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Post)
            .map(|r| (r.endpoint, r.params.encode()))
            .collect()
    }
}

fn relay_descriptor() -> Value {
    json!({"relay": 2, "device_index": "7", "version": 3})
}

fn drain(rx: &mut broadcast::Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ========== Cycle ==========

#[tokio::test]
async fn first_cycle_loads_descriptor_and_state() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0], "up": 500}));
    let mut rx = h.coordinator.subscribe();

    let data = h.coordinator.first_refresh().await.unwrap();

    assert_eq!(data.descriptor().count(ChannelKind::Relay), 2);
    assert_eq!(
        data.state().switch_state(ChannelKind::Relay, ChannelIndex::first()),
        Some(SwitchState::On)
    );
    assert_eq!(data.works_since(), Some(at(-500)));
    assert_eq!(data.updated_at(), at(0));
    assert!(h.coordinator.is_available());
    assert_eq!(h.coordinator.device_info().sw_version(), Some(3));
    assert_eq!(h.coordinator.device_info().name(), "Controller_1_42");

    let events = drain(&mut rx);
    assert!(matches!(
        events[0],
        CoordinatorEvent::AvailabilityChanged { available: true }
    ));
    assert!(matches!(events[1], CoordinatorEvent::Updated(_)));
}

#[tokio::test]
async fn descriptor_is_fetched_once() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));

    h.coordinator.refresh().await.unwrap();
    h.coordinator.refresh().await.unwrap();
    h.coordinator.refresh().await.unwrap();

    assert_eq!(h.gets("system_info"), 1);
    assert_eq!(h.gets("state"), 3);
}

#[tokio::test]
async fn descriptor_failure_skips_state_fetch() {
    let h = Harness::with_defaults();
    h.transport.fail("system_info", "connection refused");
    h.state(&json!({"relay": [1]}));

    let err = h.coordinator.refresh().await.unwrap_err();

    assert!(matches!(
        err.cause(),
        Error::Protocol(ProtocolError::Connection { .. })
    ));
    assert_eq!(h.gets("state"), 0);
    assert!(h.coordinator.data().is_none());
    assert!(h.coordinator.descriptor().is_none());
}

#[tokio::test]
async fn descriptor_is_kept_when_state_fails() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.transport.reply("state", 503, "");
    h.state(&json!({"relay": [0, 0]}));

    let err = h.coordinator.refresh().await.unwrap_err();
    assert!(matches!(
        err.cause(),
        Error::Protocol(ProtocolError::Api { status: 503, .. })
    ));
    assert!(h.coordinator.descriptor().is_some());

    h.coordinator.refresh().await.unwrap();
    assert_eq!(h.gets("system_info"), 1);
}

#[tokio::test]
async fn failed_cycle_keeps_previous_snapshot() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 1]}));
    h.transport.reply("state", 500, "");

    let first = h.coordinator.refresh().await.unwrap();
    let err = h.coordinator.refresh().await.unwrap_err();

    let current = h.coordinator.data().unwrap();
    assert!(Arc::ptr_eq(&first, &current));
    assert_eq!(h.coordinator.consecutive_failures(), 1);
    assert!(h.coordinator.last_error().is_some());
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn malformed_state_fails_cycle() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1], "up": "soon"}));

    let err = h.coordinator.refresh().await.unwrap_err();
    assert!(matches!(err.cause(), Error::Parse(_)));
}

// ========== Uptime ==========

#[tokio::test]
async fn growing_uptime_keeps_works_since() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0], "up": 500}));
    h.state(&json!({"relay": [1, 0], "up": 520}));

    h.coordinator.refresh().await.unwrap();
    h.advance_clock(20);
    let data = h.coordinator.refresh().await.unwrap();

    assert_eq!(data.works_since(), Some(at(-500)));
    assert_eq!(h.coordinator.reboot_count(), 0);
    assert!(h.posts().is_empty());
}

#[tokio::test]
async fn missing_uptime_skips_reboot_detection() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));

    let data = h.coordinator.refresh().await.unwrap();
    assert_eq!(data.works_since(), None);
    assert!(h.coordinator.works_since().is_none());
}

#[tokio::test]
async fn reboot_replays_previous_values() {
    let h = Harness::with_defaults();
    h.descriptor(&json!({"relay": 2, "v_switch": 1, "v_numeric": 1, "device_index": "7"}));
    h.state(&json!({
        "relay": [1, 0],
        "v_switch": [1],
        "v_numeric": [42],
        "binary_sensor": [1],
        "up": 500,
    }));
    h.state(&json!({"relay": [0, 0], "v_switch": [0], "v_numeric": [0], "up": 10}));
    for kind in ["relay", "v_switch", "v_numeric"] {
        h.transport.reply_json(kind, &json!({}));
    }
    let mut rx = h.coordinator.subscribe();

    h.coordinator.refresh().await.unwrap();
    h.advance_clock(30);
    let data = h.coordinator.refresh().await.unwrap();

    assert_eq!(data.works_since(), Some(at(20)));
    assert_eq!(h.coordinator.reboot_count(), 1);
    assert_eq!(
        h.posts(),
        vec![
            ("v_numeric".to_string(), "1=42".to_string()),
            ("v_switch".to_string(), "1=1".to_string()),
            ("relay".to_string(), "1=1&2=0".to_string()),
        ]
    );
    // Snapshot reflects the device, not the replayed values
    assert_eq!(
        data.state().switch_state(ChannelKind::Relay, ChannelIndex::first()),
        Some(SwitchState::Off)
    );

    let reboot = drain(&mut rx).into_iter().find_map(|e| match e {
        CoordinatorEvent::RebootDetected(reboot) => Some(reboot),
        _ => None,
    });
    assert_eq!(
        reboot,
        Some(Reboot {
            previous_uptime: 500,
            uptime: 10,
            works_since: at(20),
        })
    );
}

#[tokio::test]
async fn reconcile_failure_does_not_fail_cycle() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 1], "up": 500}));
    h.state(&json!({"relay": [0, 0], "up": 3}));
    h.transport.reply("relay", 500, "");
    let mut rx = h.coordinator.subscribe();

    h.coordinator.refresh().await.unwrap();
    h.coordinator.refresh().await.unwrap();

    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        CoordinatorEvent::ReconcileFailed {
            kind: ChannelKind::Relay,
            ..
        }
    )));
    assert!(h.coordinator.is_available());
}

#[tokio::test(start_paused = true)]
async fn interrupted_replay_resumes_on_next_cycle() {
    let h = Harness::with_defaults();
    h.descriptor(&json!({"relay": 2, "v_numeric": 1}));
    h.state(&json!({"relay": [1, 0], "v_numeric": [42], "up": 500}));
    h.state(&json!({"relay": [0, 0], "v_numeric": [0], "up": 10}));
    h.state(&json!({"relay": [0, 0], "v_numeric": [0], "up": 15}));
    h.transport.reply_json("v_numeric", &json!({}));
    h.transport.reply_json("relay", &json!({}));

    let before = h.coordinator.refresh().await.unwrap();

    h.transport.delay("v_numeric", Duration::from_secs(5));
    let cancelled =
        tokio::time::timeout(Duration::from_secs(1), h.coordinator.refresh()).await;
    assert!(cancelled.is_err());
    assert!(Arc::ptr_eq(&before, &h.coordinator.data().unwrap()));
    assert_eq!(h.posts(), vec![("v_numeric".to_string(), "1=42".to_string())]);

    h.transport.delay("v_numeric", Duration::ZERO);
    let data = h.coordinator.refresh().await.unwrap();
    assert_eq!(data.state().uptime_seconds(), Some(15));
    assert_eq!(h.coordinator.reboot_count(), 1);
    assert_eq!(
        h.posts(),
        vec![
            ("v_numeric".to_string(), "1=42".to_string()),
            ("v_numeric".to_string(), "1=42".to_string()),
            ("relay".to_string(), "1=1&2=0".to_string()),
        ]
    );

    h.coordinator.refresh().await.unwrap();
    assert_eq!(h.posts().len(), 3);
}

// ========== Timeout and coalescing ==========

#[tokio::test(start_paused = true)]
async fn timed_out_cycle_keeps_state() {
    let h = Harness::new(CoordinatorConfig::default().with_cycle_timeout(Duration::from_secs(10)));
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0], "up": 100}));
    h.state(&json!({"relay": [0, 0], "up": 200}));

    let before = h.coordinator.refresh().await.unwrap();

    h.transport.delay("state", Duration::from_secs(11));
    let err = h.coordinator.refresh().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(Arc::ptr_eq(&before, &h.coordinator.data().unwrap()));

    h.transport.delay("state", Duration::ZERO);
    let after = h.coordinator.refresh().await.unwrap();
    assert_eq!(after.state().uptime_seconds(), Some(200));
}

#[tokio::test(start_paused = true)]
async fn overlapping_refreshes_share_one_fetch() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));
    h.transport.delay("state", Duration::from_secs(1));

    let (a, b, c) = tokio::join!(
        h.coordinator.refresh(),
        h.coordinator.refresh(),
        h.coordinator.refresh()
    );

    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(h.gets("system_info"), 1);
    assert_eq!(h.gets("state"), 1);
}

#[tokio::test(start_paused = true)]
async fn joined_refresh_shares_failure() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.transport.reply("state", 500, "");
    h.transport.delay("state", Duration::from_secs(1));

    let (a, b) = tokio::join!(h.coordinator.refresh(), h.coordinator.refresh());

    assert!(a.is_err());
    assert!(b.is_err());
    assert_eq!(h.gets("state"), 1);
    assert_eq!(h.coordinator.consecutive_failures(), 1);
}

// ========== Availability ==========

#[tokio::test]
async fn availability_follows_threshold() {
    let h = Harness::new(CoordinatorConfig::default().with_unavailable_after(2));
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));
    h.transport.reply("state", 500, "");
    h.transport.reply("state", 500, "");
    h.state(&json!({"relay": [1, 0]}));
    let mut rx = h.coordinator.subscribe();

    assert!(!h.coordinator.is_available());
    h.coordinator.refresh().await.unwrap();
    assert!(h.coordinator.is_available());

    h.coordinator.refresh().await.unwrap_err();
    assert!(h.coordinator.is_available());

    h.coordinator.refresh().await.unwrap_err();
    assert!(!h.coordinator.is_available());
    assert_eq!(h.coordinator.consecutive_failures(), 2);

    h.coordinator.refresh().await.unwrap();
    assert!(h.coordinator.is_available());
    assert_eq!(h.coordinator.consecutive_failures(), 0);
    assert!(h.coordinator.last_error().is_none());

    let changes: Vec<bool> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            CoordinatorEvent::AvailabilityChanged { available } => Some(available),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![true, false, true]);
}

// ========== Listeners ==========

#[tokio::test]
async fn listeners_run_before_refresh_returns() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));

    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let id = h.coordinator.add_listener(move |data| {
        assert!(data.descriptor().count(ChannelKind::Relay) == 2);
        c.fetch_add(1, Ordering::SeqCst);
    });

    h.coordinator.refresh().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(h.coordinator.remove_listener(id));
    h.coordinator.refresh().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn watch_sees_published_snapshot() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [0, 1]}));
    let mut rx = h.coordinator.watch();
    assert!(rx.borrow().is_none());

    h.coordinator.refresh().await.unwrap();

    assert!(rx.has_changed().unwrap());
    let data = rx.borrow_and_update().clone().unwrap();
    assert_eq!(
        data.state()
            .switch_state(ChannelKind::Relay, ChannelIndex::new(2).unwrap()),
        Some(SwitchState::On)
    );
}

// ========== Commands ==========

#[tokio::test]
async fn set_switch_sends_then_refreshes() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));
    h.state(&json!({"relay": [0, 0]}));
    h.transport.reply_json("relay", &json!({}));

    h.coordinator.first_refresh().await.unwrap();
    h.coordinator
        .set_switch(ChannelKind::Relay, ChannelIndex::first(), false)
        .await
        .unwrap();

    let requests = h.transport.requests();
    let post = requests.iter().position(|r| r.method == Method::Post).unwrap();
    assert_eq!(requests[post].endpoint, "relay");
    assert_eq!(requests[post].params, Params::from([("1", "0")]));
    assert_eq!(requests[post + 1].endpoint, "state");

    let data = h.coordinator.data().unwrap();
    assert_eq!(
        data.state().switch_state(ChannelKind::Relay, ChannelIndex::first()),
        Some(SwitchState::Off)
    );
}

#[tokio::test]
async fn command_to_missing_channel_is_rejected() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));
    h.coordinator.first_refresh().await.unwrap();

    let err = h
        .coordinator
        .pulse_relay(ChannelIndex::new(3).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Device(DeviceError::UnsupportedChannel {
            kind: ChannelKind::Relay,
            index: 3,
        })
    ));

    let err = h
        .coordinator
        .press_virtual_button(ChannelIndex::first())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Device(_)));
    assert!(h.posts().is_empty());
}

#[tokio::test]
async fn command_before_descriptor_is_rejected() {
    let h = Harness::with_defaults();
    let err = h.coordinator.pulse_relay(ChannelIndex::first()).await.unwrap_err();
    assert!(matches!(err, Error::Device(DeviceError::DescriptorNotLoaded)));
}

#[tokio::test]
async fn set_switch_rejects_sensor_kind() {
    let h = Harness::with_defaults();
    let err = h
        .coordinator
        .set_switch(ChannelKind::AnalogIn, ChannelIndex::first(), true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::UnsupportedCommand { .. })
    ));
}

#[tokio::test]
async fn send_command_rejects_read_only_and_empty_commands() {
    let h = Harness::with_defaults();
    h.descriptor(&json!({"relay": 2, "button": 1}));
    h.state(&json!({"relay": [1, 0], "button": [0]}));
    h.coordinator.first_refresh().await.unwrap();

    let mut press = ChannelCommand::new(ChannelKind::Button);
    press.push(ChannelIndex::first(), CommandValue::Press);
    let err = h.coordinator.send_command(&press).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::UnsupportedCommand {
            kind: ChannelKind::Button,
            ..
        })
    ));

    let empty = ChannelCommand::new(ChannelKind::Relay);
    let err = h.coordinator.send_command(&empty).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::UnsupportedCommand {
            kind: ChannelKind::Relay,
            command: "empty",
        })
    ));

    assert!(h.posts().is_empty());
}

#[tokio::test]
async fn set_number_checks_bounds() {
    let h = Harness::with_defaults();
    h.descriptor(&json!({
        "v_numeric": 1,
        "v_numeric_min": [0],
        "v_numeric_max": [100],
    }));
    h.state(&json!({"v_numeric": [5]}));
    h.transport.reply_json("v_numeric", &json!({}));
    h.coordinator.first_refresh().await.unwrap();

    let err = h
        .coordinator
        .set_number(ChannelIndex::first(), 101)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Value(ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 101,
        })
    ));

    h.coordinator
        .set_number(ChannelIndex::first(), 55)
        .await
        .unwrap();
    assert_eq!(
        h.posts(),
        vec![("v_numeric".to_string(), "1=55".to_string())]
    );
}

#[tokio::test]
async fn failed_refresh_after_command_is_not_returned() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));
    h.transport.reply("state", 500, "");
    h.transport.reply_json("relay", &json!({}));
    h.coordinator.first_refresh().await.unwrap();

    h.coordinator
        .pulse_relay(ChannelIndex::first())
        .await
        .unwrap();

    assert_eq!(h.posts(), vec![("relay".to_string(), "1=i".to_string())]);
    assert_eq!(h.coordinator.consecutive_failures(), 1);
}

// ========== Poller ==========

#[tokio::test(start_paused = true)]
async fn poller_refreshes_on_interval_until_shutdown() {
    let h = Harness::new(
        CoordinatorConfig::default().with_update_interval(Duration::from_secs(5)),
    );
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));

    let poller = h.coordinator.start();
    assert!(poller.is_running());

    tokio::time::sleep(Duration::from_millis(11_000)).await;
    let polled = h.gets("state");
    assert!(polled >= 2, "polled {polled} times");

    poller.shutdown().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.gets("state"), polled);
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_stops_polling() {
    let h = Harness::with_defaults();
    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));

    let poller = h.coordinator.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(poller);
    tokio::task::yield_now().await;

    let polled = h.gets("state");
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.gets("state"), polled);
}

#[test]
fn builder_rejects_invalid_config() {
    let client = DeviceClient::with_transport("10.0.0.1", ScriptedTransport::new()).unwrap();
    let err = Coordinator::new(
        client,
        CoordinatorConfig::default().with_update_interval(Duration::ZERO),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn entities_available_after_descriptor_load() {
    let h = Harness::with_defaults();
    assert!(h.coordinator.entities().is_none());

    h.descriptor(&relay_descriptor());
    h.state(&json!({"relay": [1, 0]}));
    h.coordinator.first_refresh().await.unwrap();

    let entities = h.coordinator.entities().unwrap();
    assert_eq!(entities[0].unique_id(), "7_relay_1");
}
