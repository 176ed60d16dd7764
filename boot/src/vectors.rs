//! The exception handlers `cortex-m-rt`'s vector table dispatches to.
//! These are the only entry points into the kernel from hardware; each
//! does the minimum needed to hand off to `rtos-core` or
//! `context_switch`.

use rtos_core::SwitchDecision;

use crate::context_switch::switch_context;

/// CMSIS `IRQn_Type` numbers for the system exceptions this kernel cares
/// about, shared with `rtos-core::smp`'s context-switch IPI encoding and
/// `PlatformIrq::set_irq_priority_local`'s system-handler dispatch.
pub const SVCALL_IRQN: i32 = -5;
pub const PENDSV_IRQN: i32 = -2;
pub const SYSTICK_IRQN: i32 = -1;

/// `SVCall` handler: unstack the syscall number (`r7`, set by
/// `rtos_lib::svc::svc_call`'s trampoline before the `svc` instruction)
/// and the three argument registers from the process-stacked exception
/// frame, then hand off to [`rtos_core::svc_dispatch`]. Returns the
/// result through `r0` of the stacked frame, which becomes the `svc`
/// instruction's apparent return value once this handler returns.
#[cortex_m_rt::exception]
unsafe fn SVCall() {
    let psp: *mut u32;
    core::arch::asm!("mrs {}, psp", out(reg) psp, options(nomem, nostack, preserves_flags));
    // Hardware-stacked frame: r0, r1, r2, r3, r12, lr, pc, xpsr.
    let frame = unsafe { core::slice::from_raw_parts_mut(psp, 8) };
    let svc_num: u32;
    core::arch::asm!("mov {}, r7", out(reg) svc_num, options(nomem, nostack, preserves_flags));
    let result = rtos_core::svc_dispatch(svc_num, frame[0], frame[1], frame[2]);
    frame[0] = result as u32;
}

/// `SysTick` handler: advance the tick counter and, if the running task's
/// slice has run out or a timer has expired, pend a local context switch.
#[cortex_m_rt::exception]
fn SysTick() {
    rtos_core::on_tick();
    rtos_cmsis::kernel::on_tick();
}

/// `PendSV` handler: ask the scheduler what, if anything, should replace
/// the currently running task on this core, then perform the switch.
/// Priority is set below every other exception so it only runs once
/// nothing more urgent is pending, per the usual Cortex-M convention.
#[cortex_m_rt::exception]
unsafe fn PendSV() {
    let core = rtos_core::platform::irq().current_core();
    match rtos_core::select_next(core) {
        SwitchDecision::NoSwitch => {}
        SwitchDecision::Switch { old_ctx, new_ctx } => unsafe {
            switch_context(old_ctx, new_ctx)
        },
    }
}

/// The IRQ handler for the SIO FIFO, which carries cross-core commands
/// (external interfaces §6). The concrete IRQ number and its wiring into
/// the NVIC are device-specific and set up in [`crate::init`].
#[unsafe(no_mangle)]
extern "C" fn SIO_IRQ_PROC(_core: u8) {
    rtos_core::smp::handle_incoming();
}

#[cortex_m_rt::exception]
unsafe fn HardFault(frame: &cortex_m_rt::ExceptionFrame) -> ! {
    rtos_lib::klog_error!(
        "HardFault: pc=0x{:x} lr=0x{:x} psr=0x{:x}",
        frame.pc(),
        frame.lr(),
        frame.xpsr()
    );
    crate::shutdown::kernel_halt_on_fault();
}
