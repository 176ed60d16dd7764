//! [`PlatformFifo`] against the RP2040 SIO inter-core mailbox.

use rtos_abi::sched_traits::PlatformFifo;

use crate::sio;

pub struct SioFifo;

pub static FIFO: SioFifo = SioFifo;

impl PlatformFifo for SioFifo {
    fn has_send_space(&self) -> bool {
        sio::fifo_has_send_space()
    }

    fn has_data_available(&self) -> bool {
        sio::fifo_has_data()
    }

    fn send(&self, packet: u32) {
        sio::fifo_write(packet);
    }

    fn recv(&self) -> u32 {
        sio::fifo_read()
    }

    fn clear_errors(&self) {
        sio::fifo_clear_errors();
    }
}
