//! Trait seams between `rtos-core` and the platform glue in `rtos-boot`.
//!
//! `rtos-core` must never depend on `rtos-boot` (the core is the reusable
//! part; the boot crate is where board-specific wiring lives). These
//! traits are the "required host runtime services" from the external
//! interfaces section, expressed as trait objects so `rtos-core` can
//! consume them without naming the concrete implementation.

/// The non-scheduler-owned hardware primitives the core needs to request
/// context switches and manage interrupts across both cores.
pub trait PlatformIrq: Send + Sync {
    /// Pend the context-switch (PendSV-equivalent) interrupt on the calling
    /// core.
    fn pend_context_switch_local(&self);

    /// Set or clear the enabled state of `irq` on the calling core.
    fn set_irq_enabled_local(&self, irq: i32, enabled: bool);

    /// Pend or clear `irq` on the calling core.
    fn set_irq_pending_local(&self, irq: i32, pending: bool);

    /// Set the priority of `irq` on the calling core.
    fn set_irq_priority_local(&self, irq: i32, priority: u8);

    /// Which core is executing this call, 0 or 1.
    fn current_core(&self) -> u8;

    /// Wait for an event (`WFE`-equivalent); returns when an event is
    /// pending or any interrupt fires.
    fn wait_for_event(&self);

    /// Signal an event to all cores (`SEV`-equivalent).
    fn signal_event(&self);
}

/// The cross-core hardware FIFO, one direction of which this side can send
/// on and the other receive from.
pub trait PlatformFifo: Send + Sync {
    /// True if there is space to send a packet without blocking.
    fn has_send_space(&self) -> bool;
    /// True if a packet is available to receive without blocking.
    fn has_data_available(&self) -> bool;
    /// Write one packet. Caller must have checked `has_send_space`.
    fn send(&self, packet: u32);
    /// Read one packet. Caller must have checked `has_data_available`.
    fn recv(&self) -> u32;
    /// Clear any overflow/underflow error latched by the FIFO hardware.
    fn clear_errors(&self);
}

/// One of the platform's hardware test-and-clear spinlock cells.
pub trait PlatformHwLock: Send + Sync {
    /// Try to acquire hardware lock `index`. Returns true on success.
    fn try_acquire(&self, index: usize) -> bool;
    /// Release hardware lock `index`.
    fn release(&self, index: usize);
}

/// The secondary-core boot protocol, as a trait so `rtos-core`'s SMP
/// bootstrap sequencing can be written and tested without depending on the
/// concrete boot ROM handshake.
pub trait PlatformSecondaryCoreBoot: Send + Sync {
    /// Reset the secondary core so it re-enters its boot ROM monitor.
    fn reset_secondary_core(&self);
    /// Run the vector-table/stack-pointer/entry-point handshake. Returns
    /// `true` once the secondary core has confirmed receipt.
    fn bootstrap_secondary_core(
        &self,
        vector_table: u32,
        stack_pointer: u32,
        entry_point: u32,
    ) -> bool;
}
