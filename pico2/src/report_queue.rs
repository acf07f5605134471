//! Hand-off of discharge reports from the cycle loop to the report task.
//!
//! The cycle loop must never wait on reporting. [`ChannelSink`] pushes into a
//! bounded embassy channel with `try_send`; when the report task falls behind
//! and the queue is full the report is dropped and counted. The counter in
//! FRAM has already been incremented at that point, so nothing is lost but
//! the notification.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use hvpulse_common::report::{DischargeReport, ReportSink};
use log::debug;

/// [`ReportSink`] feeding a bounded channel.
pub struct ChannelSink<'a, M: RawMutex, const N: usize> {
    channel: &'a Channel<M, DischargeReport, N>,
    dropped: u32,
}

impl<'a, M: RawMutex, const N: usize> ChannelSink<'a, M, N> {
    /// Sink into `channel`.
    pub const fn new(channel: &'a Channel<M, DischargeReport, N>) -> Self { Self { channel, dropped: 0 } }

    /// Reports dropped because the queue was full.
    #[inline]
    pub const fn dropped(&self) -> u32 { self.dropped }
}

impl<M: RawMutex, const N: usize> ReportSink for ChannelSink<'_, M, N> {
    fn report(
        &mut self,
        report: DischargeReport,
    ) {
        if let Err(TrySendError::Full(report)) = self.channel.try_send(report) {
            self.dropped = self.dropped.wrapping_add(1);
            debug!("report queue full, dropping bin {} count {}", report.bin, report.count);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;

    fn report(count: u32) -> DischargeReport {
        DischargeReport {
            bin: 3,
            voltage: 504,
            count,
        }
    }

    #[test]
    fn test_reports_arrive_in_order() {
        let channel: Channel<NoopRawMutex, DischargeReport, 4> = Channel::new();
        let mut sink = ChannelSink::new(&channel);
        sink.report(report(1));
        sink.report(report(2));

        assert_eq!(channel.try_receive().map(|r| r.count), Ok(1));
        assert_eq!(channel.try_receive().map(|r| r.count), Ok(2));
        assert!(channel.try_receive().is_err());
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let channel: Channel<NoopRawMutex, DischargeReport, 2> = Channel::new();
        let mut sink = ChannelSink::new(&channel);
        for count in 1..=5 {
            sink.report(report(count));
        }

        assert_eq!(sink.dropped(), 3, "reporting never blocks");
        assert_eq!(channel.try_receive().map(|r| r.count), Ok(1));
        assert_eq!(channel.try_receive().map(|r| r.count), Ok(2));
    }
}
