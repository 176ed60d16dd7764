//! The kernel's `#[panic_handler]`. There is no screen or keyboard to hand
//! off to here, so the whole panic path is: log it, then halt.

use rtos_lib::klog_error;

use crate::shutdown::kernel_halt;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    if let Some(location) = info.location() {
        klog_error!(
            "panic at {}:{}: {}",
            location.file(),
            location.line(),
            info.message()
        );
    } else {
        klog_error!("panic: {}", info.message());
    }
    kernel_halt()
}
