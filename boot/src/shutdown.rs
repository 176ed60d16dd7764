//! Shutdown and fault-halt paths. There is no ACPI or power button on a
//! microcontroller, so "shutdown" means quiescing both cores and parking
//! them in a low-power wait loop; "reboot" means asking the SCB to issue a
//! system reset.

use core::sync::atomic::{AtomicBool, Ordering};

use rtos_lib::klog_info;

static HALTED: AtomicBool = AtomicBool::new(false);

const SCB_AIRCR: *mut u32 = 0xE000_ED0C as *mut u32;
const AIRCR_VECTKEY: u32 = 0x05FA << 16;
const AIRCR_SYSRESETREQ: u32 = 1 << 2;

fn halt_loop() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

/// Quiesce interrupts on this core and park it. Used by both an orderly
/// shutdown and a fault handler that has nowhere safer to go.
pub fn kernel_halt() -> ! {
    cortex_m::interrupt::disable();
    if !HALTED.swap(true, Ordering::SeqCst) {
        klog_info!("Kernel halted.");
    }
    halt_loop()
}

/// Entry point for `HardFault` and other unrecoverable traps: same as
/// [`kernel_halt`], named separately so the call site in `vectors.rs`
/// reads as what it is.
pub fn kernel_halt_on_fault() -> ! {
    cortex_m::interrupt::disable();
    klog_info!("Halting after unrecoverable fault.");
    halt_loop()
}

pub fn kernel_reboot() -> ! {
    cortex_m::interrupt::disable();
    klog_info!("Rebooting...");
    unsafe { core::ptr::write_volatile(SCB_AIRCR, AIRCR_VECTKEY | AIRCR_SYSRESETREQ) };
    cortex_m::asm::dsb();
    halt_loop()
}
