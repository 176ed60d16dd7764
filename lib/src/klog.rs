//! Leveled kernel logging.
//!
//! The sink is a registered service (see [`crate::service_macro::define_service`]):
//! nothing is written until `rtos-boot` calls `register_klog_services` with a
//! `write_byte` that reaches the board's UART. Before that, log lines are
//! dropped rather than buffered — there is no allocator to buffer them in.

use core::ffi::{c_char, c_void, CStr};
use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::{define_service, numfmt};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KlogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl KlogLevel {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => KlogLevel::Error,
            1 => KlogLevel::Warn,
            2 => KlogLevel::Info,
            3 => KlogLevel::Debug,
            _ => KlogLevel::Trace,
        }
    }
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(KlogLevel::Info as u8);

define_service! {
    klog => KlogServices {
        write_byte(byte: u8);
    }
}

#[inline(always)]
fn is_enabled(level: KlogLevel) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

#[inline(always)]
fn putc(byte: u8) {
    if is_klog_initialized() {
        write_byte(byte);
    }
}

fn write_bytes(bytes: &[u8]) {
    for &b in bytes {
        putc(b);
    }
}

struct Writer;

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        write_bytes(s.as_bytes());
        Ok(())
    }
}

pub fn log_fmt(level: KlogLevel, args: fmt::Arguments<'_>) {
    if !is_enabled(level) {
        return;
    }
    use fmt::Write;
    let _ = Writer.write_fmt(args);
    putc(b'\n');
}

pub(crate) fn log_line(level: KlogLevel, text: &str) {
    if !is_enabled(level) {
        return;
    }
    write_bytes(text.as_bytes());
    putc(b'\n');
}

pub fn set_level(level: KlogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn get_level() -> KlogLevel {
    KlogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

pub fn is_log_enabled(level: KlogLevel) -> bool {
    is_enabled(level)
}

/// Thin non-variadic FFI entry point for callers outside Rust's macro
/// system (the CMSIS adapter's C-facing shims): logs one already-formatted,
/// NUL-terminated C string at `level`.
///
/// # Safety
/// `msg` must point to a valid NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn klog_log_cstr(level: KlogLevel, msg: *const c_char) {
    if msg.is_null() || !is_enabled(level) {
        return;
    }
    let bytes = unsafe { CStr::from_ptr(msg) }.to_bytes();
    write_bytes(bytes);
    putc(b'\n');
}

fn write_padded(bytes: &[u8], width: i32, zero_pad: bool) {
    let len = bytes.len() as i32;
    let padding = if width > len { width - len } else { 0 };
    let pad_char = if zero_pad { b'0' } else { b' ' };
    for _ in 0..padding {
        putc(pad_char);
    }
    write_bytes(bytes);
}

/// One formatted argument for [`klog_printf`]. Stable Rust has no
/// `c_variadic`/`VaList`, so instead of the teacher's `args: ...` the caller
/// packs a fixed array of these and passes its length — the same
/// information a `va_list` walk would have extracted, just gathered up
/// front instead of pulled lazily off the stack.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum KlogArg {
    Str(*const c_char),
    Char(c_char),
    Int(i32),
    UInt(u32),
    Hex(u32),
    Ptr(*const c_void),
}

fn format_signed(value: i64, width: i32, zero_pad: bool) {
    let negative = value < 0;
    let magnitude = value.unsigned_abs();
    let mut buffer = [0u8; 24];
    let digits =
        unsafe { numfmt::u64_to_decimal_internal(magnitude, buffer.as_mut_ptr() as *mut c_char, buffer.len()) };
    let total = digits + if negative { 1 } else { 0 };
    let pad_char = if zero_pad { b'0' } else { b' ' };
    let padding = (width as usize).saturating_sub(total);

    let mut wrote_sign = false;
    if negative && pad_char == b'0' {
        putc(b'-');
        wrote_sign = true;
    }
    for _ in 0..padding {
        putc(pad_char);
    }
    if negative && !wrote_sign {
        putc(b'-');
    }
    write_bytes(&buffer[..digits.max(1)]);
}

fn format_unsigned(value: u64, width: i32, zero_pad: bool, hex: bool, upper: bool) {
    let mut buffer = [0u8; 24];
    let len = if hex {
        unsafe { numfmt::u64_to_hex_internal(value, buffer.as_mut_ptr() as *mut c_char, buffer.len(), false) }
    } else {
        unsafe { numfmt::u64_to_decimal_internal(value, buffer.as_mut_ptr() as *mut c_char, buffer.len()) }
    };
    if hex && !upper {
        for b in buffer.iter_mut().take(len) {
            if b.is_ascii_uppercase() {
                *b = *b - b'A' + b'a';
            }
        }
    }
    write_padded(&buffer[..len.max(1)], width, zero_pad);
}

fn format_pointer(ptr: *const c_void, width: i32, zero_pad: bool) {
    let mut buffer = [0u8; 24];
    let len = unsafe {
        numfmt::u64_to_hex_internal(ptr as u64, buffer.as_mut_ptr() as *mut c_char, buffer.len(), true)
    };
    write_padded(&buffer[..len.max(1)], width, zero_pad);
}

const NULL_STR: &[u8] = b"(null)";

fn format_one(spec: u8, arg: KlogArg, width: i32, zero_pad: bool) {
    match (spec, arg) {
        (b's', KlogArg::Str(ptr)) => {
            if ptr.is_null() {
                write_padded(NULL_STR, width, zero_pad);
            } else {
                let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
                write_padded(bytes, width, zero_pad);
            }
        }
        (b'c', KlogArg::Char(c)) => write_padded(&[c as u8], width, zero_pad),
        (b'd' | b'i', KlogArg::Int(v)) => format_signed(v as i64, width, zero_pad),
        (b'u', KlogArg::UInt(v)) => format_unsigned(v as u64, width, zero_pad, false, false),
        (b'x', KlogArg::Hex(v)) => format_unsigned(v as u64, width, zero_pad, true, false),
        (b'X', KlogArg::Hex(v)) => format_unsigned(v as u64, width, zero_pad, true, true),
        (b'p', KlogArg::Ptr(p)) => format_pointer(p, width, zero_pad),
        // Spec letter doesn't match the packed argument's type: the caller
        // built the args array wrong. Mark it rather than reading garbage.
        _ => write_bytes(b"%!"),
    }
}

/// Format-string entry point for C-facing callers: a stable-Rust
/// equivalent of the teacher's nightly `klog_printf(level, fmt, args: ...)`.
/// Supports `%s %c %d %i %u %x %X %p` with an optional `0` flag and decimal
/// width (`%08x`, `%5d`, ...), same subset the teacher's hand-rolled parser
/// covers. `args`/`num_args` stand in for the variadic list stable Rust
/// can't express; running out of args, or a spec letter that doesn't match
/// the packed argument's variant, prints `%!` and moves on rather than
/// reading past the array.
///
/// # Safety
/// `fmt` must point to a valid NUL-terminated C string. `args` must point
/// to a valid array of at least `num_args` [`KlogArg`]s, or be null with
/// `num_args == 0`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn klog_printf(
    level: KlogLevel,
    fmt: *const c_char,
    args: *const KlogArg,
    num_args: usize,
) {
    if fmt.is_null() || !is_enabled(level) {
        return;
    }
    let fmt_bytes = unsafe { CStr::from_ptr(fmt) }.to_bytes();
    let args: &[KlogArg] = if args.is_null() {
        &[]
    } else {
        unsafe { core::slice::from_raw_parts(args, num_args) }
    };

    let mut arg_idx = 0usize;
    let mut idx = 0usize;
    while idx < fmt_bytes.len() {
        let ch = fmt_bytes[idx];
        if ch != b'%' {
            putc(ch);
            idx += 1;
            continue;
        }

        idx += 1;
        if idx >= fmt_bytes.len() {
            putc(b'%');
            break;
        }
        if fmt_bytes[idx] == b'%' {
            putc(b'%');
            idx += 1;
            continue;
        }

        let mut zero_pad = false;
        let mut width: i32 = 0;
        if fmt_bytes[idx] == b'0' {
            zero_pad = true;
            idx += 1;
        }
        while idx < fmt_bytes.len() && fmt_bytes[idx].is_ascii_digit() {
            width = width.saturating_mul(10) + (fmt_bytes[idx] - b'0') as i32;
            idx += 1;
        }
        if idx >= fmt_bytes.len() {
            break;
        }

        let spec = fmt_bytes[idx];
        idx += 1;

        if arg_idx >= args.len() {
            write_bytes(b"%!");
            continue;
        }
        format_one(spec, args[arg_idx], width, zero_pad);
        arg_idx += 1;
    }
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::klog::log_fmt($crate::klog::KlogLevel::Error, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::klog::log_fmt($crate::klog::KlogLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::klog::log_fmt($crate::klog::KlogLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::klog::log_fmt($crate::klog::KlogLevel::Debug, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::klog::log_fmt($crate::klog::KlogLevel::Trace, format_args!($($arg)*))
    };
}
