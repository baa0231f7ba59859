//! Gamepads through gilrs.
//!
//! Pads are assigned to the lowest free slot when they appear and keep it
//! until they disconnect. Face buttons follow the Xbox layout: South = A,
//! East = B, West = X, North = Y. The right trigger is the throttle.

use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use rover_traits::{ConnectionEvent, ConnectionListener, DynError, InputHub, InputSource};

use crate::error::{HwError, Result};

const AXIS_SCALE: f32 = 512.0;
const TRIGGER_SCALE: f32 = 1023.0;

/// Cached state of one slot, refreshed on every poll.
#[derive(Debug, Clone, Copy, Default)]
struct PadSlot {
    id: Option<GamepadId>,
    axis_x: i32,
    axis_y: i32,
    throttle: i32,
    a: bool,
    b: bool,
    x: bool,
    y: bool,
}

impl PadSlot {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl InputSource for PadSlot {
    fn is_connected(&self) -> bool {
        self.id.is_some()
    }
    fn axis_x(&self) -> i32 {
        self.axis_x
    }
    fn axis_y(&self) -> i32 {
        self.axis_y
    }
    fn throttle(&self) -> i32 {
        self.throttle
    }
    fn button_a(&self) -> bool {
        self.a
    }
    fn button_b(&self) -> bool {
        self.b
    }
    fn button_x(&self) -> bool {
        self.x
    }
    fn button_y(&self) -> bool {
        self.y
    }
}

pub struct GilrsHub {
    gilrs: Gilrs,
    slots: Vec<PadSlot>,
    listener: Option<Box<dyn ConnectionListener>>,
    /// Pads already present when the hub was opened, reported on first poll.
    pending: Vec<GamepadId>,
}

impl GilrsHub {
    pub fn new(max_gamepads: usize) -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| HwError::Gamepad(e.to_string()))?;
        let pending: Vec<GamepadId> = gilrs.gamepads().map(|(id, _)| id).collect();
        tracing::info!(
            max_gamepads,
            already_connected = pending.len(),
            "gamepad hub open"
        );
        Ok(Self {
            gilrs,
            slots: vec![PadSlot::default(); max_gamepads],
            listener: None,
            pending,
        })
    }

    fn slot_of(&self, id: GamepadId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == Some(id))
    }

    fn attach(&mut self, id: GamepadId) {
        if self.slot_of(id).is_some() {
            return;
        }
        let Some(slot) = self.slots.iter().position(|s| s.id.is_none()) else {
            tracing::warn!(?id, "no free gamepad slot; ignoring");
            return;
        };
        self.slots[slot].id = Some(id);
        tracing::info!(slot, name = self.gilrs.gamepad(id).name(), "gamepad attached");
        self.notify(ConnectionEvent::Connected { slot });
    }

    fn detach(&mut self, id: GamepadId) {
        if let Some(slot) = self.slot_of(id) {
            self.slots[slot].clear();
            self.notify(ConnectionEvent::Disconnected { slot });
        }
    }

    fn notify(&self, event: ConnectionEvent) {
        if let Some(listener) = &self.listener {
            listener.notify(event);
        }
    }

    fn refresh(&mut self) {
        for slot in &mut self.slots {
            let Some(id) = slot.id else { continue };
            let pad = self.gilrs.gamepad(id);
            slot.axis_x = scale(pad.value(Axis::LeftStickX), AXIS_SCALE);
            slot.axis_y = scale(pad.value(Axis::LeftStickY), AXIS_SCALE);
            slot.throttle = pad
                .button_data(Button::RightTrigger2)
                .map_or(0, |d| scale(d.value(), TRIGGER_SCALE));
            slot.a = pad.is_pressed(Button::South);
            slot.b = pad.is_pressed(Button::East);
            slot.x = pad.is_pressed(Button::West);
            slot.y = pad.is_pressed(Button::North);
        }
    }
}

fn scale(v: f32, full: f32) -> i32 {
    (v.clamp(-1.0, 1.0) * full).round() as i32
}

impl InputHub for GilrsHub {
    fn register(&mut self, listener: Box<dyn ConnectionListener>) {
        self.listener = Some(listener);
    }

    fn poll(&mut self) -> std::result::Result<(), DynError> {
        for id in std::mem::take(&mut self.pending) {
            self.attach(id);
        }
        while let Some(ev) = self.gilrs.next_event() {
            match ev.event {
                EventType::Connected => self.attach(ev.id),
                EventType::Disconnected => self.detach(ev.id),
                _ => {}
            }
        }
        self.refresh();
        Ok(())
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn source(&self, slot: usize) -> Option<&dyn InputSource> {
        self.slots.get(slot).map(|s| s as &dyn InputSource)
    }
}

#[cfg(test)]
mod tests {
    use super::scale;

    #[test]
    fn scale_maps_unit_range_to_counts() {
        assert_eq!(scale(1.0, 512.0), 512);
        assert_eq!(scale(-1.0, 512.0), -512);
        assert_eq!(scale(0.5, 1023.0), 512);
        assert_eq!(scale(2.0, 512.0), 512);
    }
}
