// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item state and event flows over the in-memory transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use openhab_items::event::RawItemEvent;
use openhab_items::protocol::{MemoryTransport, RawItem, Request};
use openhab_items::{
    Directory, Error, EventKind, EventOrigin, Item, ItemEvent, ListenerOptions, RawState,
    StateValue, Subscribable, ValueError,
};
use parking_lot::Mutex;

fn directory(items: &[(&str, &str, &str)]) -> Directory<MemoryTransport> {
    let transport = MemoryTransport::new();
    for (name, item_type, state) in items {
        transport.insert(RawItem::new(*name, *item_type, *state));
    }
    Directory::new(transport)
}

fn counter(item: &Item<MemoryTransport>, options: &ListenerOptions) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let clone = Arc::clone(&count);
    item.add_listener(options, move |_| {
        clone.fetch_add(1, Ordering::SeqCst);
    });
    count
}

fn recorder(item: &Item<MemoryTransport>, options: &ListenerOptions) -> Arc<Mutex<Vec<ItemEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let clone = Arc::clone(&events);
    item.add_listener(options, move |event| clone.lock().push(event.clone()));
    events
}

// ============================================================================
// Echo suppression
// ============================================================================

mod echo {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn echo_within_window_is_suppressed() {
        let directory = directory(&[("Lamp", "Switch", "OFF")]);
        let lamp = directory.get_item("Lamp").await.unwrap();
        let plain = counter(&lamp, &ListenerOptions::new());
        let echoes = counter(&lamp, &ListenerOptions::new().with_echoes(true));
        let mut bus = directory.subscribe();

        lamp.update("ON").await.unwrap();
        // The local Changed event is internal, neither remote-only listener sees it
        assert_eq!(bus.try_recv().unwrap().origin(), EventOrigin::Internal);

        tokio::time::advance(Duration::from_millis(200)).await;
        let delivery = directory
            .handle_event(&RawItemEvent::remote_changed("Lamp", "ON", "OFF"))
            .unwrap()
            .unwrap();

        assert!(delivery.echo);
        assert_eq!(delivery.outcome.delivered, 1);
        assert_eq!(plain.load(Ordering::SeqCst), 0);
        assert_eq!(echoes.load(Ordering::SeqCst), 1);
        assert!(bus.try_recv().is_err());
        assert_eq!(lamp.current_state(), Some(StateValue::from("ON")));
    }

    #[tokio::test(start_paused = true)]
    async fn same_event_after_window_is_applied() {
        let directory = directory(&[("Lamp", "Switch", "OFF")]);
        let lamp = directory.get_item("Lamp").await.unwrap();
        let plain = counter(&lamp, &ListenerOptions::new());
        let echoes = counter(&lamp, &ListenerOptions::new().with_echoes(true));

        lamp.command("ON").await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;

        let delivery = directory
            .handle_event(&RawItemEvent::remote("Lamp", EventKind::Command, "ON"))
            .unwrap()
            .unwrap();

        assert!(!delivery.echo);
        assert_eq!(plain.load(Ordering::SeqCst), 1);
        assert_eq!(echoes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn different_value_within_window_is_applied() {
        let directory = directory(&[("Dim", "Dimmer", "0")]);
        let dimmer = directory.get_item("Dim").await.unwrap();
        let plain = counter(&dimmer, &ListenerOptions::new());

        dimmer.command(60).await.unwrap();
        let delivery = directory
            .handle_event(&RawItemEvent::remote("Dim", EventKind::Update, "45"))
            .unwrap()
            .unwrap();

        assert!(!delivery.echo);
        assert_eq!(dimmer.current_state(), Some(StateValue::Integer(45)));
        assert_eq!(plain.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_echo_window() {
        let transport = MemoryTransport::new().with_item(RawItem::new("Lamp", "Switch", "OFF"));
        let defaults = openhab_items::ItemDefaults::new().with_echo_window(Duration::from_millis(100));
        let directory = Directory::with_defaults(transport, defaults);
        let lamp = directory.get_item("Lamp").await.unwrap();

        lamp.update("ON").await.unwrap();
        tokio::time::advance(Duration::from_millis(150)).await;

        let delivery = lamp
            .on_external_event(&RawItemEvent::remote("Lamp", EventKind::Update, "ON"))
            .unwrap()
            .unwrap();
        assert!(!delivery.echo);
    }
}

// ============================================================================
// Local changes
// ============================================================================

mod local {
    use super::*;

    #[tokio::test]
    async fn number_command_is_normalized() {
        let directory = directory(&[("Level", "Number", "52 %")]);
        let level = directory.get_item("Level").await.unwrap();
        assert_eq!(level.current_state(), Some(StateValue::Decimal(52.0)));
        assert_eq!(level.unit(), "%");

        let events = recorder(&level, &ListenerOptions::new().with_remote_only(false));
        let delivery = level.command(60).await.unwrap();

        assert_eq!(
            directory.transport().requests().last(),
            Some(&Request::Command {
                item: "Level".to_string(),
                command: "60".to_string()
            })
        );
        assert_eq!(level.current_state(), Some(StateValue::Decimal(60.0)));
        assert_eq!(delivery.event.kind(), EventKind::Command);
        assert_eq!(delivery.event.new_value(), Some(&StateValue::Decimal(60.0)));
        assert_eq!(events.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timestamps_follow_calls() {
        let directory = directory(&[("Lamp", "Switch", "OFF")]);
        let lamp = directory.get_item("Lamp").await.unwrap();

        let start = tokio::time::Instant::now();
        lamp.update("ON").await.unwrap();
        assert!(lamp.last_update_sent().is_some_and(|t| t >= start));
        assert!(lamp.last_command_sent().is_none());

        tokio::time::advance(Duration::from_millis(10)).await;
        let later = tokio::time::Instant::now();
        lamp.command("OFF").await.unwrap();
        assert!(lamp.last_command_sent().is_some_and(|t| t >= later));
    }

    #[tokio::test]
    async fn contact_rejects_commands() {
        let directory = directory(&[("Door", "Contact", "CLOSED")]);
        let door = directory.get_item("Door").await.unwrap();

        for value in ["OPEN", "CLOSED"] {
            let err = door.command(value).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Value(ValueError::CommandsNotSupported { .. })
            ));
        }
        door.update("OPEN").await.unwrap();
        assert_eq!(door.current_state(), Some(StateValue::from("OPEN")));
    }

    #[tokio::test]
    async fn rejected_values_leave_state_alone() {
        let directory = directory(&[("Dim", "Dimmer", "10"), ("Color", "Color", "0,0,0")]);
        let dimmer = directory.get_item("Dim").await.unwrap();
        let color = directory.get_item("Color").await.unwrap();

        assert!(dimmer.command(150).await.is_err());
        assert!(color.command("400,0,0").await.is_err());
        assert!(dimmer.command("INCREASE").await.is_ok());
        assert!(color.command("120,100,50").await.is_ok());
        assert_eq!(color.current_state(), Some(StateValue::from("120,100,50")));
    }

    #[tokio::test]
    async fn string_items_accept_anything() {
        let directory = directory(&[("Note", "String", "")]);
        let note = directory.get_item("Note").await.unwrap();
        note.update("anything, even ON").await.unwrap();
        assert_eq!(
            directory.transport().item_state("Note").as_deref(),
            Some("anything, even ON")
        );
    }
}

// ============================================================================
// Listeners
// ============================================================================

mod listeners {
    use super::*;

    #[tokio::test]
    async fn failing_listener_is_isolated() {
        let directory = directory(&[("Lamp", "Switch", "OFF")]);
        let lamp = directory.get_item("Lamp").await.unwrap();

        let before = counter(&lamp, &ListenerOptions::new());
        lamp.add_listener(&ListenerOptions::new(), |_| panic!("listener failure"));
        let after = counter(&lamp, &ListenerOptions::new());

        let delivery = lamp
            .on_external_event(&RawItemEvent::remote("Lamp", EventKind::Update, "ON"))
            .unwrap()
            .unwrap();

        assert_eq!(delivery.outcome.delivered, 2);
        assert_eq!(delivery.outcome.failed, 1);
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert_eq!(lamp.current_state(), Some(StateValue::from("ON")));
    }

    #[tokio::test]
    async fn kind_filters_and_extension() {
        let directory = directory(&[("Temp", "Number", "20")]);
        let temp = directory.get_item("Temp").await.unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let clone = Arc::clone(&events);
        let id = temp.add_listener(
            &ListenerOptions::new().with_kind(EventKind::Changed),
            move |event: &ItemEvent| clone.lock().push(event.kind()),
        );

        temp.on_external_event(&RawItemEvent::remote("Temp", EventKind::Update, "21"))
            .unwrap();
        temp.on_external_event(&RawItemEvent::remote_changed("Temp", "22", "21"))
            .unwrap();
        assert_eq!(*events.lock(), [EventKind::Changed]);

        assert!(temp.extend_listener(id, &ListenerOptions::new().with_kind(EventKind::Update)));
        temp.on_external_event(&RawItemEvent::remote("Temp", EventKind::Update, "23"))
            .unwrap();
        assert_eq!(*events.lock(), [EventKind::Changed, EventKind::Update]);

        assert!(temp.remove_listener(id, &[EventKind::Changed, EventKind::Update]));
        assert_eq!(temp.listener_count(), 0);
        assert!(!temp.unsubscribe(id));
    }

    #[tokio::test]
    async fn remote_only_skips_local_events() {
        let directory = directory(&[("Lamp", "Switch", "OFF")]);
        let lamp = directory.get_item("Lamp").await.unwrap();
        let remote = counter(&lamp, &ListenerOptions::new());
        let all = counter(&lamp, &ListenerOptions::new().with_remote_only(false));

        lamp.on().await.unwrap();

        assert_eq!(remote.load(Ordering::SeqCst), 0);
        assert_eq!(all.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changed_event_carries_previous_state() {
        let directory = directory(&[("Temp", "Number:Temperature", "20 °C")]);
        let temp = directory.get_item("Temp").await.unwrap();
        let events = recorder(&temp, &ListenerOptions::new());

        temp.on_external_event(&RawItemEvent::remote_changed("Temp", "21.5 °C", "20 °C"))
            .unwrap();

        let events = events.lock();
        let previous = events[0].previous().unwrap();
        assert_eq!(previous.value(), Some(&StateValue::Decimal(20.0)));
        assert_eq!(previous.unit(), "°C");
        assert_eq!(events[0].new_value(), Some(&StateValue::Decimal(21.5)));
    }
}

// ============================================================================
// Sentinels and groups
// ============================================================================

mod sentinels {
    use super::*;

    #[tokio::test]
    async fn remote_undef_clears_value() {
        let directory = directory(&[("Temp", "Number", "20")]);
        let temp = directory.get_item("Temp").await.unwrap();

        temp.on_external_event(&RawItemEvent::remote("Temp", EventKind::Update, "UNDEF"))
            .unwrap();

        assert!(temp.current_state().is_none());
        assert!(temp.is_undef().await.unwrap());
        assert!(!temp.is_null().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_undef_after_local_null_is_applied() {
        let directory = directory(&[("Temp", "Number", "20")]);
        let temp = directory.get_item("Temp").await.unwrap();
        let plain = counter(&temp, &ListenerOptions::new());

        temp.update_to_null().await.unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;

        let delivery = directory
            .handle_event(&RawItemEvent::remote("Temp", EventKind::Update, "UNDEF"))
            .unwrap()
            .unwrap();

        assert!(!delivery.echo);
        assert_eq!(temp.raw_state(), Some(RawState::Undef));
        assert!(temp.is_undef().await.unwrap());
        assert_eq!(plain.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_null_after_local_undef_is_applied() {
        let directory = directory(&[("Temp", "Number", "20")]);
        let temp = directory.get_item("Temp").await.unwrap();

        temp.update_to_undef().await.unwrap();
        let delivery = directory
            .handle_event(&RawItemEvent::remote("Temp", EventKind::Update, "NULL"))
            .unwrap()
            .unwrap();

        assert!(!delivery.echo);
        assert!(temp.is_null().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn matching_sentinel_within_window_is_an_echo() {
        let directory = directory(&[("Temp", "Number", "20")]);
        let temp = directory.get_item("Temp").await.unwrap();
        let plain = counter(&temp, &ListenerOptions::new());

        temp.update_to_null().await.unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;

        let delivery = directory
            .handle_event(&RawItemEvent::remote("Temp", EventKind::Update, "NULL"))
            .unwrap()
            .unwrap();

        assert!(delivery.echo);
        assert_eq!(plain.load(Ordering::SeqCst), 0);
        assert!(temp.is_null().await.unwrap());
    }

    #[tokio::test]
    async fn group_members_share_directory_instances() {
        let transport = MemoryTransport::new().with_item(
            RawItem::new("Lights", "Group", "OFF")
                .with_group_type("Switch")
                .with_member(RawItem::new("Lamp_1", "Switch", "OFF"))
                .with_member(RawItem::new("Lamp_2", "Switch", "ON")),
        );
        let directory = Directory::new(transport);

        let group = directory.get_item("Lights").await.unwrap();
        let lamp = directory.get_item("Lamp_1").await.unwrap();

        assert!(Arc::ptr_eq(&group.member("Lamp_1").unwrap(), &lamp));
        assert_eq!(group.members().len(), 2);
        assert_eq!(directory.transport().requests().len(), 1);
    }
}
