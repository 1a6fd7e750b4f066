//! Pointer gesture recognition in front of the drag controller.
//!
//! A card press only becomes a drag once the pointer travels past a deadband,
//! so plain clicks still reach the card. Two clicks on the same card inside
//! the double-activation window ask the host to open the record.

use crate::board::Board;
use crate::config::GestureConfig;
use crate::drag::DragController;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Navigation requested by the board. The host performs the routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NavigationIntent {
    OpenRecord(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEvent {
    /// Nothing for the host to act on.
    Pending,
    /// The deadband was crossed and a drag transaction is now open.
    DragStarted { record_id: String },
    /// Released without crossing the deadband.
    Click { record_id: String },
    Navigate(NavigationIntent),
}

#[derive(Debug)]
struct Press {
    record_id: String,
    kind: PointerKind,
    origin: (f64, f64),
    dragging: bool,
}

#[derive(Debug)]
pub struct GestureTracker {
    config: GestureConfig,
    press: Option<Press>,
    last_click: Option<(String, u64)>,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            press: None,
            last_click: None,
        }
    }

    fn deadband(&self, kind: PointerKind) -> f64 {
        match kind {
            PointerKind::Mouse => self.config.pointer_distance,
            PointerKind::Touch => self.config.touch_distance,
        }
    }

    pub fn press(&mut self, record_id: &str, kind: PointerKind, x: f64, y: f64) {
        self.press = Some(Press {
            record_id: record_id.to_string(),
            kind,
            origin: (x, y),
            dragging: false,
        });
    }

    /// Feed a pointer move. Opens a drag on `controller` once the pointer
    /// leaves the deadband around the press point.
    pub fn motion(
        &mut self,
        x: f64,
        y: f64,
        controller: &mut DragController,
        board: &Board,
    ) -> Result<GestureEvent> {
        let Some(press) = self.press.as_ref() else {
            return Ok(GestureEvent::Pending);
        };
        if press.dragging {
            return Ok(GestureEvent::Pending);
        }

        let travelled = (x - press.origin.0).hypot(y - press.origin.1);
        let deadband = self.deadband(press.kind);
        if travelled <= deadband {
            return Ok(GestureEvent::Pending);
        }

        let record_id = press.record_id.clone();
        tracing::debug!(record = %record_id, travelled, deadband, "deadband crossed");
        controller.begin_drag(board, &record_id)?;
        if let Some(press) = self.press.as_mut() {
            press.dragging = true;
        }
        self.last_click = None;
        Ok(GestureEvent::DragStarted { record_id })
    }

    /// Feed the pointer release. `at_ms` is a monotonic timestamp used only
    /// for the double-activation window.
    pub fn release(&mut self, at_ms: u64) -> GestureEvent {
        let Some(press) = self.press.take() else {
            return GestureEvent::Pending;
        };
        if press.dragging {
            // The drop itself goes through the controller.
            return GestureEvent::Pending;
        }

        let window = self.config.double_activation_ms;
        let is_double = matches!(
            &self.last_click,
            Some((id, at)) if *id == press.record_id && at_ms.saturating_sub(*at) <= window
        );
        if is_double {
            self.last_click = None;
            return GestureEvent::Navigate(NavigationIntent::OpenRecord(press.record_id));
        }

        self.last_click = Some((press.record_id.clone(), at_ms));
        GestureEvent::Click {
            record_id: press.record_id,
        }
    }
}
