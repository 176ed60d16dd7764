//! Frame-pointer stack walker.
//!
//! Relies on `r7` being kept as the frame-chain register (the convention
//! this target's toolchain uses for Thumb code built with frame pointers
//! retained): `[r7]` holds the caller's `r7`, `[r7+4]` holds the return
//! address.

use crate::cpu;
use crate::klog_error;

const STACKTRACE_MAX_LOCAL: usize = 16;
const MAX_FRAME_STRIDE: u32 = 1 << 20;

#[derive(Copy, Clone, Default)]
pub struct StackFrame {
    pub frame_pointer: u32,
    pub return_address: u32,
}

fn sane_next_frame(current: u32, next: u32) -> bool {
    next != 0 && next > current && (next - current) < MAX_FRAME_STRIDE && next & 0x3 == 0
}

/// Walk the frame chain starting at `fp`, writing up to `out.len()` frames.
/// Returns the number of frames captured.
pub fn capture_from(mut fp: u32, out: &mut [StackFrame]) -> usize {
    if fp == 0 || fp & 0x3 != 0 {
        return 0;
    }

    let mut count = 0;
    while fp != 0 && count < out.len() {
        // SAFETY: `fp` is checked non-null, word-aligned, and increasing
        // each iteration before being dereferenced again.
        let (next_fp, return_address) = unsafe {
            let frame = fp as *const u32;
            (*frame, *frame.add(1))
        };

        out[count] = StackFrame {
            frame_pointer: fp,
            return_address,
        };
        count += 1;

        if !sane_next_frame(fp, next_fp) {
            break;
        }
        fp = next_fp;
    }

    count
}

pub fn capture(out: &mut [StackFrame]) -> usize {
    capture_from(cpu::read_frame_pointer(), out)
}

pub fn dump_from(fp: u32, max_frames: usize) {
    let max = max_frames.min(STACKTRACE_MAX_LOCAL);
    let mut frames = [StackFrame::default(); STACKTRACE_MAX_LOCAL];
    let captured = capture_from(fp, &mut frames[..max]);

    if captured == 0 {
        klog_error!("STACKTRACE: <empty>");
        return;
    }

    klog_error!("STACKTRACE:");
    for (i, frame) in frames[..captured].iter().enumerate() {
        klog_error!(
            "  #{} fp={:#010x} ra={:#010x}",
            i,
            frame.frame_pointer,
            frame.return_address
        );
    }
}

pub fn dump(max_frames: usize) {
    dump_from(cpu::read_frame_pointer(), max_frames);
}
