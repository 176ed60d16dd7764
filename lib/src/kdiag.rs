//! Fatal-path diagnostics: register and stack dumps for crash reporting.
//!
//! Called from the hard-fault handler and from the scheduler's stack-overflow
//! and task-marker-corruption checks (see `rtos-core`'s task pool).

use crate::cpu;
use crate::klog_error;
use crate::stacktrace::{self, StackFrame};

pub const KDIAG_STACK_TRACE_DEPTH: usize = 12;

/// The register frame hardware automatically stacks on exception entry.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ExceptionFrame {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    pub pc: u32,
    pub xpsr: u32,
}

pub fn kdiag_dump_exception_frame(frame: &ExceptionFrame) {
    klog_error!("=== EXCEPTION FRAME ===");
    klog_error!(
        "r0={:#010x} r1={:#010x} r2={:#010x} r3={:#010x}",
        frame.r0,
        frame.r1,
        frame.r2,
        frame.r3
    );
    klog_error!(
        "r12={:#010x} lr={:#010x} pc={:#010x} xpsr={:#010x}",
        frame.r12,
        frame.lr,
        frame.pc,
        frame.xpsr
    );
    klog_error!("=== END EXCEPTION FRAME ===");
}

pub fn kdiag_dump_cpu_state() {
    klog_error!("=== CPU STATE ===");
    klog_error!(
        "primask={} control={:#06x} msp={:#010x} psp={:#010x}",
        cpu::read_primask(),
        cpu::read_control(),
        cpu::read_msp(),
        cpu::read_psp()
    );
    klog_error!("=== END CPU STATE ===");
}

pub fn kdiag_dump_stack_trace() {
    kdiag_dump_stack_trace_from_fp(cpu::read_frame_pointer());
}

pub fn kdiag_dump_stack_trace_from_fp(fp: u32) {
    let mut frames = [StackFrame::default(); KDIAG_STACK_TRACE_DEPTH];
    let captured = stacktrace::capture_from(fp, &mut frames);

    klog_error!("=== STACK TRACE ===");
    if captured == 0 {
        klog_error!("no stack frames found");
    } else {
        for (i, frame) in frames[..captured].iter().enumerate() {
            klog_error!(
                "frame {}: fp={:#010x} ra={:#010x}",
                i,
                frame.frame_pointer,
                frame.return_address
            );
        }
    }
    klog_error!("=== END STACK TRACE ===");
}

/// The hardware exception frame doesn't include `r7`, so this can only walk
/// from whatever the frame chain looks like at the point the fault handler
/// itself is running, not from the faulting context. Good enough to locate
/// the handler's own call site; the faulting `pc` is reported separately.
pub fn kdiag_dump_stack_trace_from_frame(frame: &ExceptionFrame) {
    klog_error!("=== STACK TRACE FROM EXCEPTION ===");
    klog_error!("exception occurred at pc={:#010x}", frame.pc);
    kdiag_dump_stack_trace_from_fp(cpu::read_frame_pointer());
    klog_error!("=== END STACK TRACE ===");
}

pub fn kdiag_hexdump(data: &[u8], base_address: u32) {
    let mut i = 0usize;
    while i < data.len() {
        let chunk_end = (i + 16).min(data.len());
        let chunk = &data[i..chunk_end];

        let mut line = heapless_line();
        let _ = write_hex_line(&mut line, base_address + i as u32, chunk);
        klog_error!("{}", line.as_str());

        i += 16;
    }
}

/// Fixed-capacity byte buffer used to assemble one hexdump line without an
/// allocator; 16 bytes never needs more than this much text.
struct FixedLine {
    buf: [u8; 96],
    len: usize,
}

fn heapless_line() -> FixedLine {
    FixedLine {
        buf: [0; 96],
        len: 0,
    }
}

impl FixedLine {
    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("<hexdump encoding error>")
    }
}

impl core::fmt::Write for FixedLine {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.len;
        let n = bytes.len().min(remaining);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        Ok(())
    }
}

fn write_hex_line(line: &mut FixedLine, base: u32, chunk: &[u8]) -> core::fmt::Result {
    use core::fmt::Write;
    write!(line, "{:#010x}: ", base)?;
    for (j, b) in chunk.iter().enumerate() {
        if j == 8 {
            write!(line, " ")?;
        }
        write!(line, "{:02x} ", b)?;
    }
    for j in chunk.len()..16 {
        if j == 8 {
            write!(line, " ")?;
        }
        write!(line, "   ")?;
    }
    write!(line, "|")?;
    for b in chunk {
        let c = if (32..=126).contains(b) { *b } else { b'.' };
        write!(line, "{}", c as char)?;
    }
    write!(line, "|")
}
