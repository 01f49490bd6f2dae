use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_long, c_short, c_void};
use std::ptr::NonNull;

use super::{EngineError, Frame, SynthesisEngine};

#[repr(C)]
struct RawSpc {
    _private: [u8; 0],
}

#[link(name = "snes_spc")]
extern "C" {
    fn spc_new() -> *mut RawSpc;
    fn spc_delete(spc: *mut RawSpc);
    fn spc_load_spc(spc: *mut RawSpc, data: *const c_void, size: c_long) -> *const c_char;
    fn spc_clear_echo(spc: *mut RawSpc);
    fn spc_play(spc: *mut RawSpc, count: c_int, out: *mut c_short) -> *const c_char;
}

/// blargg's snes_spc emulator, through its C interface.
pub struct SnesSpc {
    raw: NonNull<RawSpc>,
}

impl SnesSpc {
    pub fn new() -> Result<SnesSpc, EngineError> {
        let raw = unsafe { spc_new() };
        NonNull::new(raw)
            .map(|raw| SnesSpc { raw })
            .ok_or_else(|| EngineError::Rejected("out of memory".to_owned()))
    }
}

/// snes_spc reports failure as a static C string, success as null.
fn check(err: *const c_char) -> Result<(), String> {
    if err.is_null() {
        return Ok(());
    }

    let msg = unsafe { CStr::from_ptr(err) };
    Err(msg.to_string_lossy().into_owned())
}

impl SynthesisEngine for SnesSpc {
    fn load(&mut self, image: &[u8]) -> Result<(), EngineError> {
        let size = c_long::try_from(image.len())
            .map_err(|_| EngineError::Rejected("image too large".to_owned()))?;
        let err = unsafe { spc_load_spc(self.raw.as_ptr(), image.as_ptr().cast(), size) };
        check(err).map_err(EngineError::Rejected)
    }

    fn clear_echo(&mut self) {
        unsafe { spc_clear_echo(self.raw.as_ptr()) }
    }

    fn play(&mut self, out: &mut [Frame]) -> Result<(), EngineError> {
        // count is in samples, not frames
        let count = c_int::try_from(out.len() * 2)
            .map_err(|_| EngineError::Play("block too large".to_owned()))?;
        let err = unsafe { spc_play(self.raw.as_ptr(), count, out.as_mut_ptr().cast::<c_short>()) };
        check(err).map_err(EngineError::Play)
    }
}

impl Drop for SnesSpc {
    fn drop(&mut self) {
        unsafe { spc_delete(self.raw.as_ptr()) }
    }
}
