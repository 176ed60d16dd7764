//! Cross-core messaging and secondary-core bring-up (external interfaces
//! §6, cross-core command wire format in `rtos_abi::ipc`).
//!
//! The hardware FIFO, the per-core IRQ controller, and the secondary-core
//! boot handshake are all accessed through the `rtos_abi::sched_traits`
//! services `rtos-boot` registers in `crate::platform` — this module only
//! encodes/decodes packets and decides what to do with them, never touches
//! a register directly.

use rtos_abi::ipc::{
    decode_event_payload, decode_execute_target, decode_irq_payload, decode_priority_payload,
    encode_event_command, encode_execute_command, encode_irq_command, encode_set_priority_command,
    CrossCoreCommand,
};
use rtos_abi::{KernelError, KernelResult};

use crate::platform;

/// CMSIS system-exception number for the pendable service call used as the
/// context-switch trigger, shared with `rtos-boot`'s vector table. Negative
/// per the usual `IRQn_Type` convention (system exceptions are negative,
/// device IRQs are >= 0).
const CONTEXT_SWITCH_IRQN: i32 = -2;

fn send_blocking(packet: u32) {
    let fifo = platform::fifo();
    while !fifo.has_send_space() {
        rtos_lib::cpu::nop();
    }
    fifo.send(packet);
}

/// Ask `core` (which must not be the caller's own core) to pend its local
/// context-switch interrupt. Used by `crate::scheduler::request_dispatch`
/// when a reschedule targets the other core.
pub fn request_remote_dispatch(core: u8) {
    debug_assert_ne!(core, platform::irq().current_core());
    send_blocking(encode_irq_command(CrossCoreCommand::PendIrq, CONTEXT_SWITCH_IRQN));
}

/// Route an IRQ enable/disable/priority/pend/clear request: if `core`
/// names the calling core, apply it directly; otherwise forward it over
/// the cross-core FIFO so the owning core applies it to itself. This is
/// the "routing of local IRQ operations" behavior from the external
/// interfaces section — IRQ enable state is always changed on the core
/// that owns the interrupt, never remotely.
pub fn set_irq_enabled(core: u8, irq: i32, enabled: bool) {
    if core == platform::irq().current_core() {
        platform::irq().set_irq_enabled_local(irq, enabled);
    } else {
        let cmd = if enabled {
            CrossCoreCommand::IrqEnable
        } else {
            CrossCoreCommand::IrqDisable
        };
        send_blocking(encode_irq_command(cmd, irq));
    }
}

pub fn set_irq_pending(core: u8, irq: i32, pending: bool) {
    if core == platform::irq().current_core() {
        platform::irq().set_irq_pending_local(irq, pending);
    } else {
        let cmd = if pending {
            CrossCoreCommand::PendIrq
        } else {
            CrossCoreCommand::ClearIrq
        };
        send_blocking(encode_irq_command(cmd, irq));
    }
}

pub fn set_irq_priority(core: u8, irq: i32, priority: u8) {
    if core == platform::irq().current_core() {
        platform::irq().set_irq_priority_local(irq, priority);
    } else {
        send_blocking(encode_set_priority_command(irq, priority));
    }
}

/// Number of slots in the cross-core event callback table.
const MAX_EVENT_HANDLERS: usize = 8;

type EventHandler = fn();

static mut EVENT_HANDLERS: [Option<EventHandler>; MAX_EVENT_HANDLERS] = [None; MAX_EVENT_HANDLERS];

/// Register a handler for cross-core `Event` packets carrying `event_id`.
/// Not itself cross-core safe to call concurrently with `notify_event` —
/// callers register handlers during single-core bring-up, before the
/// secondary core is booted.
pub fn register_event_handler(event_id: u16, handler: EventHandler) {
    if (event_id as usize) < MAX_EVENT_HANDLERS {
        unsafe { EVENT_HANDLERS[event_id as usize] = Some(handler) };
    }
}

/// Send a small cross-core event notification; the receiving core invokes
/// whatever handler it registered for `event_id` from `handle_incoming`.
pub fn notify_event(event_id: u16) {
    send_blocking(encode_event_command(event_id));
}

/// Ask `core` to call `f` (taking no arguments, returning nothing) from its
/// own FIFO IRQ handler. `f` must live in flash or SRAM — its address is
/// the packet, so anywhere else is silently undeliverable (`from_tag` in
/// `rtos_abi::ipc` won't recognize the tag and `handle_incoming` drops it).
pub fn execute_remote(core: u8, f: extern "C" fn()) {
    debug_assert_ne!(core, platform::irq().current_core());
    send_blocking(encode_execute_command(f as usize as u32));
}

/// Drain every packet currently available on this core's receive FIFO.
/// Called from the FIFO's IRQ handler in `rtos-boot`.
pub fn handle_incoming() {
    let fifo = platform::fifo();
    while fifo.has_data_available() {
        let packet = fifo.recv();
        dispatch_packet(packet);
    }
}

fn dispatch_packet(packet: u32) {
    let Some(cmd) = CrossCoreCommand::from_tag(packet) else {
        platform::fifo().clear_errors();
        return;
    };
    match cmd {
        CrossCoreCommand::PendIrq => {
            let irq = decode_irq_payload(packet);
            if irq == CONTEXT_SWITCH_IRQN {
                platform::irq().pend_context_switch_local();
            } else {
                platform::irq().set_irq_pending_local(irq, true);
            }
        }
        CrossCoreCommand::ClearIrq => {
            platform::irq().set_irq_pending_local(decode_irq_payload(packet), false);
        }
        CrossCoreCommand::IrqEnable => {
            platform::irq().set_irq_enabled_local(decode_irq_payload(packet), true);
        }
        CrossCoreCommand::IrqDisable => {
            platform::irq().set_irq_enabled_local(decode_irq_payload(packet), false);
        }
        CrossCoreCommand::SetPriority => {
            let irq = decode_irq_payload(packet);
            let priority = decode_priority_payload(packet);
            platform::irq().set_irq_priority_local(irq, priority);
        }
        CrossCoreCommand::Event => {
            let event_id = decode_event_payload(packet);
            if let Some(handler) = unsafe { EVENT_HANDLERS[event_id as usize % MAX_EVENT_HANDLERS] }
            {
                handler();
            }
        }
        CrossCoreCommand::ExecuteFlash | CrossCoreCommand::ExecuteSram => {
            let addr = decode_execute_target(packet) as usize;
            // SAFETY: the only packets tagged ExecuteFlash/ExecuteSram come
            // from `execute_remote`, which packs a real `extern "C" fn()`'s
            // own address as the packet.
            let f: extern "C" fn() = unsafe { core::mem::transmute::<usize, extern "C" fn()>(addr) };
            f();
        }
    }
}

/// Reset and bring up the secondary core, retrying the handshake a bounded
/// number of times before giving up.
pub fn boot_secondary_core(vector_table: u32, stack_pointer: u32, entry_point: u32) -> KernelResult<()> {
    const MAX_ATTEMPTS: u32 = 4;
    let boot = platform::secondary_boot();
    for _ in 0..MAX_ATTEMPTS {
        boot.reset_secondary_core();
        if boot.bootstrap_secondary_core(vector_table, stack_pointer, entry_point) {
            return Ok(());
        }
    }
    Err(KernelError::TimedOut)
}
