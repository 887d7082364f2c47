// ── Reply-buffer validation ───────────────────────────────────────────────────
//
// Any process on the desktop can send the protocol messages, so a reply
// address is only trusted once the address-space map says every byte of it
// is committed, writable and not a guard page.

#![allow(unsafe_code)]

use std::ffi::c_void;

use windows::Win32::System::Memory::{
    VirtualQuery, MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READWRITE,
    PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_PROTECTION_FLAGS, PAGE_READWRITE, PAGE_WRITECOPY,
    VIRTUAL_ALLOCATION_TYPE,
};

fn region_is_writable(state: VIRTUAL_ALLOCATION_TYPE, protect: PAGE_PROTECTION_FLAGS) -> bool {
    let writable =
        PAGE_READWRITE.0 | PAGE_WRITECOPY.0 | PAGE_EXECUTE_READWRITE.0 | PAGE_EXECUTE_WRITECOPY.0;
    state == MEM_COMMIT && protect.0 & PAGE_GUARD.0 == 0 && protect.0 & writable != 0
}

/// `true` when `[addr, addr + len)` is committed, writable memory of this
/// process.  Matches `protocol::BufferCheck`.
pub(crate) fn is_writable(addr: usize, len: usize) -> bool {
    let Some(end) = addr.checked_add(len) else {
        return false;
    };
    if addr == 0 {
        return false;
    }

    // The range may span several regions with different protection.
    let mut cursor = addr;
    while cursor < end {
        let mut info = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: VirtualQuery only reads the address-space map; info is a
        // writable MEMORY_BASIC_INFORMATION of the size passed.
        let written = unsafe {
            VirtualQuery(
                Some(cursor as *const c_void),
                &mut info,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 || !region_is_writable(info.State, info.Protect) {
            return false;
        }
        let region_end = (info.BaseAddress as usize).saturating_add(info.RegionSize);
        if region_end <= cursor {
            return false;
        }
        cursor = region_end;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::REPLY_BUFFER_LEN;

    static READ_ONLY: [u8; REPLY_BUFFER_LEN] = [1; REPLY_BUFFER_LEN];

    #[test]
    fn stack_and_heap_buffers_are_writable() {
        let mut stack = [0u8; REPLY_BUFFER_LEN];
        let mut heap = vec![0u8; 64 * 1024];
        assert!(is_writable(stack.as_mut_ptr() as usize, stack.len()));
        assert!(is_writable(heap.as_mut_ptr() as usize, heap.len()));
    }

    #[test]
    fn low_and_null_addresses_are_rejected() {
        assert!(!is_writable(0, REPLY_BUFFER_LEN));
        assert!(!is_writable(0x10, REPLY_BUFFER_LEN));
    }

    #[test]
    fn read_only_data_is_rejected() {
        assert!(!is_writable(READ_ONLY.as_ptr() as usize, READ_ONLY.len()));
    }

    #[test]
    fn wrapping_range_is_rejected() {
        assert!(!is_writable(usize::MAX - 8, REPLY_BUFFER_LEN));
    }
}
