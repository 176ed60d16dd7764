use core::arch::naked_asm;
use core::sync::atomic::{AtomicBool, Ordering};

/// Saved callee-saved register set plus `sp`/`lr`, enough to unwind back to
/// the point `test_setjmp` was called from. Used only by the test harness's
/// `catch_panic!` — not part of any normal control-flow path.
#[repr(C, align(8))]
pub struct JumpBuf {
    pub r4: u32,
    pub r5: u32,
    pub r6: u32,
    pub r7: u32,
    pub r8: u32,
    pub r9: u32,
    pub r10: u32,
    pub r11: u32,
    pub sp: u32,
    pub lr: u32,
}

impl JumpBuf {
    pub const fn zeroed() -> Self {
        Self {
            r4: 0,
            r5: 0,
            r6: 0,
            r7: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            sp: 0,
            lr: 0,
        }
    }
}

static RECOVERY_ACTIVE: AtomicBool = AtomicBool::new(false);
static mut RECOVERY_BUF: JumpBuf = JumpBuf::zeroed();

#[unsafe(naked)]
pub unsafe extern "C" fn test_setjmp(buf: *mut JumpBuf) -> i32 {
    naked_asm!(
        "str r4, [r0, #0]",
        "str r5, [r0, #4]",
        "str r6, [r0, #8]",
        "str r7, [r0, #12]",
        "mov r1, r8",
        "str r1, [r0, #16]",
        "mov r1, r9",
        "str r1, [r0, #20]",
        "mov r1, r10",
        "str r1, [r0, #24]",
        "mov r1, r11",
        "str r1, [r0, #28]",
        "mov r1, sp",
        "str r1, [r0, #32]",
        "mov r1, lr",
        "str r1, [r0, #36]",
        "movs r0, #0",
        "bx lr",
    )
}

#[unsafe(naked)]
pub unsafe extern "C" fn test_longjmp(buf: *const JumpBuf, val: i32) -> ! {
    naked_asm!(
        "ldr r4, [r0, #0]",
        "ldr r5, [r0, #4]",
        "ldr r6, [r0, #8]",
        "ldr r7, [r0, #12]",
        "ldr r2, [r0, #16]",
        "mov r8, r2",
        "ldr r2, [r0, #20]",
        "mov r9, r2",
        "ldr r2, [r0, #24]",
        "mov r10, r2",
        "ldr r2, [r0, #28]",
        "mov r11, r2",
        "ldr r2, [r0, #32]",
        "mov sp, r2",
        "ldr r2, [r0, #36]",
        "mov lr, r2",
        "movs r0, r1",
        "cmp r0, #0",
        "bne 1f",
        "movs r0, #1",
        "1:",
        "bx lr",
    )
}

pub fn recovery_is_active() -> bool {
    RECOVERY_ACTIVE.load(Ordering::SeqCst)
}

pub fn recovery_set_active(active: bool) {
    RECOVERY_ACTIVE.store(active, Ordering::SeqCst);
}

pub fn get_recovery_buf() -> *mut JumpBuf {
    &raw mut RECOVERY_BUF
}

#[macro_export]
macro_rules! catch_panic {
    ($code:block) => {{
        use $crate::panic_recovery::{get_recovery_buf, recovery_set_active, test_setjmp};

        let result = unsafe { test_setjmp(get_recovery_buf()) };

        if result == 0 {
            recovery_set_active(true);
            let ret = (|| -> i32 { $code })();
            recovery_set_active(false);
            ret
        } else {
            -1
        }
    }};
}
