//! Primary-core entry point: register the platform services `rtos-core`
//! needs, bring up the scheduler and SysTick, launch core 1, and hand off
//! to the idle loop. The application crate that actually owns `memory.x`
//! and the rest of the linker script depends on this crate and on
//! `cortex-m-rt` itself; `#[entry]` here becomes that binary's `Reset`
//! continuation once `cortex-m-rt`'s vector table runs.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::Peripherals;

use rtos_abi::sched_traits::PlatformIrq;
use rtos_abi::TICK_HZ;
use rtos_lib::klog_info;

use crate::fifo::FIFO;
use crate::hwlock::HW_LOCK;
use crate::irq::IRQ;
use crate::secondary_boot::SECONDARY_BOOT;
use crate::vectors::{PENDSV_IRQN, SYSTICK_IRQN};

/// Linker-provided addresses for core 1's boot handshake. The application
/// crate's linker script defines these; `memory.x` conventions mirror the
/// ones `rtos-core::tls`/`cls` already expect from `rtos-boot`.
extern "C" {
    static __core1_vector_table: u32;
    static __core1_stack_top: u32;
    fn core1_entry();
}

fn register_platform_services() {
    rtos_core::platform::register_irq(&IRQ);
    rtos_core::platform::register_fifo(&FIFO);
    rtos_core::platform::register_hw_lock(&HW_LOCK);
    rtos_core::platform::register_secondary_boot(&SECONDARY_BOOT);
}

const CMSIS_SERVICE_STACK_WORDS: usize = 256;
static CMSIS_TIMER_SERVICE_STACK: [u32; CMSIS_SERVICE_STACK_WORDS] = [0; CMSIS_SERVICE_STACK_WORDS];
static CMSIS_REAPER_STACK: [u32; CMSIS_SERVICE_STACK_WORDS] = [0; CMSIS_SERVICE_STACK_WORDS];

fn stack_slice(storage: &'static [u32; CMSIS_SERVICE_STACK_WORDS]) -> &'static mut [u32] {
    // SAFETY: each of these statics backs exactly one long-lived system
    // task, spawned once here and never reaped.
    unsafe { core::slice::from_raw_parts_mut(storage.as_ptr() as *mut u32, storage.len()) }
}

/// Bring up the CMSIS-RTOS v2 adapter's own ambient services: the kernel
/// state machine and the two dedicated system tasks (timer service,
/// detached-thread reaper) it needs regardless of what the application
/// builds on top of it.
fn start_cmsis_services() {
    if let Err(e) = rtos_cmsis::kernel::initialize() {
        klog_info!("rtos-boot: cmsis kernel_initialize failed: {:?}", e);
    }
    // Priority bands run 0 (highest) to NUM_PRIORITY_LEVELS - 1 (lowest);
    // both system tasks sit near the bottom, reaper below the timer
    // service since it only ever does cheap, deferrable cleanup.
    if let Err(e) =
        rtos_cmsis::timer::spawn_timer_service(stack_slice(&CMSIS_TIMER_SERVICE_STACK), 30)
    {
        klog_info!("rtos-boot: cmsis timer service spawn failed: {:?}", e);
    }
    if let Err(e) = rtos_cmsis::thread::spawn_reaper(stack_slice(&CMSIS_REAPER_STACK), 31) {
        klog_info!("rtos-boot: cmsis reaper spawn failed: {:?}", e);
    }
    if let Err(e) = rtos_cmsis::kernel::start() {
        klog_info!("rtos-boot: cmsis kernel_start failed: {:?}", e);
    }
}

fn configure_systick(peripherals: &mut Peripherals, core_clock_hz: u32) {
    let syst = &mut peripherals.SYST;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(core_clock_hz / TICK_HZ - 1);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}

fn set_exception_priorities(peripherals: &mut Peripherals) {
    // PendSV runs at the lowest priority so it never preempts a higher
    // handler mid-save; SysTick one step above it so a tick can still
    // request a switch promptly.
    IRQ.set_irq_priority_local(PENDSV_IRQN, 0xFF);
    IRQ.set_irq_priority_local(SYSTICK_IRQN, 0xC0);
    let _ = peripherals;
}

/// Bring up the primary core: register services, start the scheduler and
/// its idle tasks, launch core 1, start the tick, and fall into the idle
/// loop. Never returns.
///
/// `core_clock_hz` is the CPU clock `SysTick` counts against; the caller
/// (the application's board bring-up code) is responsible for having
/// already configured it.
pub fn kernel_boot_primary(core_clock_hz: u32) -> ! {
    let mut peripherals = Peripherals::take().expect("Peripherals::take called twice");

    register_platform_services();
    rtos_core::scheduler_init();
    start_cmsis_services();

    configure_systick(&mut peripherals, core_clock_hz);
    set_exception_priorities(&mut peripherals);

    klog_info!("rtos-boot: primary core up, launching core 1");
    let vector_table = unsafe { &__core1_vector_table as *const u32 as u32 };
    let stack_top = unsafe { &__core1_stack_top as *const u32 as u32 };
    let entry = core1_entry as usize as u32;
    match rtos_core::smp::boot_secondary_core(vector_table, stack_top, entry) {
        Ok(()) => klog_info!("rtos-boot: core 1 online"),
        Err(e) => klog_info!("rtos-boot: core 1 failed to boot: {:?}", e),
    }

    cortex_m::interrupt::enable();
    loop {
        cortex_m::asm::wfe();
    }
}

/// Entry point core 1 jumps to after completing the boot handshake. Core
/// 1 only needs its own SysTick disabled (core 0 is the sole tick source
/// per the single shared scheduler design) and to wait for PendSV/FIFO
/// interrupts.
#[unsafe(no_mangle)]
pub extern "C" fn rtos_core1_main() -> ! {
    rtos_core::platform::register_irq(&IRQ);
    rtos_core::platform::register_fifo(&FIFO);
    rtos_core::platform::register_hw_lock(&HW_LOCK);
    IRQ.set_irq_priority_local(PENDSV_IRQN, 0xFF);
    cortex_m::interrupt::enable();
    loop {
        cortex_m::asm::wfe();
    }
}
