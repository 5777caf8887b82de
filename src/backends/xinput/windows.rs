//! XInput FFI port and slot discovery.

use std::sync::Arc;

use windows_sys::Win32::Foundation::ERROR_SUCCESS;
use windows_sys::Win32::UI::Input::XboxController::{
    XInputGetState, XInputSetState, XINPUT_STATE, XINPUT_VIBRATION,
};

use super::{XInputAdapter, XInputGamepad, XInputPort, SLOT_COUNT};
use crate::class::DeviceClass;
use crate::error::{BoxError, SeekError};
use crate::seeker::Discover;

/// The XInput slot `slot` of this machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemPort {
    slot: u32,
}

impl SystemPort {
    pub fn new(slot: u32) -> Self {
        Self { slot }
    }
}

impl XInputPort for SystemPort {
    fn slot(&self) -> u32 {
        self.slot
    }

    fn get_state(&mut self) -> Option<XInputGamepad> {
        // SAFETY: XINPUT_STATE is plain data; all-zero is a valid value.
        let mut state: XINPUT_STATE = unsafe { std::mem::zeroed() };
        // SAFETY: `state` outlives the call.
        let res = unsafe { XInputGetState(self.slot, &mut state) };
        if res != ERROR_SUCCESS {
            return None;
        }
        let gp = state.Gamepad;
        Some(XInputGamepad {
            buttons: gp.wButtons,
            left_trigger: gp.bLeftTrigger,
            right_trigger: gp.bRightTrigger,
            thumb_lx: gp.sThumbLX,
            thumb_ly: gp.sThumbLY,
            thumb_rx: gp.sThumbRX,
            thumb_ry: gp.sThumbRY,
        })
    }

    fn set_vibration(&mut self, left: u16, right: u16) -> Result<(), BoxError> {
        let vibration = XINPUT_VIBRATION {
            wLeftMotorSpeed: left,
            wRightMotorSpeed: right,
        };
        // SAFETY: `vibration` outlives the call.
        let res = unsafe { XInputSetState(self.slot, &vibration) };
        if res != ERROR_SUCCESS {
            return Err(format!("XInputSetState(slot {}) failed with {res}", self.slot).into());
        }
        Ok(())
    }
}

/// Discovery over the four XInput slots. A slot is a handle while a
/// controller answers on it.
#[derive(Debug, Default)]
pub struct XInputDiscovery;

impl XInputDiscovery {
    pub fn new() -> Self {
        Self
    }
}

impl Discover for XInputDiscovery {
    type Adapter = XInputAdapter<SystemPort>;
    type Handle = u32;

    fn class(&self) -> &Arc<DeviceClass> {
        XInputAdapter::<SystemPort>::class()
    }

    fn seek(&mut self) -> Result<Vec<u32>, SeekError> {
        Ok((0..SLOT_COUNT)
            .filter(|&slot| SystemPort::new(slot).get_state().is_some())
            .collect())
    }

    fn open(&mut self, handle: &u32) -> Result<Self::Adapter, SeekError> {
        Ok(XInputAdapter::new(SystemPort::new(*handle)))
    }
}
