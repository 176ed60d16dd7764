//! [`PlatformIrq`] against the Cortex-M0+ NVIC/SCB and the SIO `CPUID`
//! register.

use cortex_m::peripheral::{scb::SystemHandler, NVIC};

use rtos_abi::sched_traits::PlatformIrq;

use crate::sio;

pub struct CortexM0Irq;

pub static IRQ: CortexM0Irq = CortexM0Irq;

const SCB_ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
const ICSR_PENDSVSET: u32 = 1 << 28;

impl PlatformIrq for CortexM0Irq {
    fn pend_context_switch_local(&self) {
        unsafe { core::ptr::write_volatile(SCB_ICSR, ICSR_PENDSVSET) };
    }

    fn set_irq_enabled_local(&self, irq: i32, enabled: bool) {
        if irq < 0 {
            // System exceptions (PendSV, SysTick, SVCall) are always enabled;
            // nothing to do.
            return;
        }
        let irq = irq as u16;
        if enabled {
            // SAFETY: enabling an interrupt line does not itself race with
            // anything this crate owns; the handler it enables is always
            // registered before boot reaches this point.
            unsafe { NVIC::unmask(RawIrq(irq)) };
        } else {
            NVIC::mask(RawIrq(irq));
        }
    }

    fn set_irq_pending_local(&self, irq: i32, pending: bool) {
        if irq < 0 {
            return;
        }
        let irq = RawIrq(irq as u16);
        if pending {
            NVIC::pend(irq);
        } else {
            NVIC::unpend(irq);
        }
    }

    fn set_irq_priority_local(&self, irq: i32, priority: u8) {
        // SAFETY: each core only ever adjusts its own NVIC/SCB priority
        // registers, and this is the only place that does so.
        let mut scb = unsafe { cortex_m::Peripherals::steal().SCB };
        if irq < 0 {
            let handler = match irq {
                crate::vectors::SVCALL_IRQN => SystemHandler::SVCall,
                crate::vectors::PENDSV_IRQN => SystemHandler::PendSV,
                crate::vectors::SYSTICK_IRQN => SystemHandler::SysTick,
                _ => return,
            };
            unsafe { scb.set_priority(handler, priority) };
            return;
        }
        let mut nvic = unsafe { cortex_m::Peripherals::steal().NVIC };
        unsafe { nvic.set_priority(RawIrq(irq as u16), priority) };
    }

    fn current_core(&self) -> u8 {
        sio::cpuid() as u8
    }

    fn wait_for_event(&self) {
        cortex_m::asm::wfe();
    }

    fn signal_event(&self) {
        cortex_m::asm::sev();
    }
}

/// Adapts a bare IRQ number to [`cortex_m::interrupt::InterruptNumber`]
/// without depending on a device PAC's generated enum.
#[derive(Clone, Copy)]
struct RawIrq(u16);

// SAFETY: `nr()` returns exactly the IRQ number this was constructed with,
// which is the contract `InterruptNumber` requires.
unsafe impl cortex_m::interrupt::InterruptNumber for RawIrq {
    fn number(&self) -> u16 {
        self.0
    }
}
