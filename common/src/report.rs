//! Discharge reports and a bounded report log.
//!
//! The cycle driver hands every counted discharge to a [`ReportSink`] and
//! forgets about it: no acknowledgment, no retry. What the sink does with it
//! (RTT log, UART, a display line) is up to the platform.

use heapless::{Deque, String};

/// "bin X now has count Y", as delivered to the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DischargeReport {
    /// Bin index in the table.
    pub bin: usize,
    /// Display voltage of the bin, in volts.
    pub voltage: u16,
    /// Counter value after the increment.
    pub count: u32,
}

/// Consumer of discharge reports. Must not block for long: it runs inside the tick.
pub trait ReportSink {
    /// Deliver one report.
    fn report(
        &mut self,
        report: DischargeReport,
    );
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    #[inline]
    fn report(
        &mut self,
        report: DischargeReport,
    ) {
        (**self).report(report);
    }
}

/// Sink that drops everything.
impl ReportSink for () {
    #[inline]
    fn report(
        &mut self,
        _report: DischargeReport,
    ) {
    }
}

// =============================================================================
// Report Log Ring Buffer
// =============================================================================

/// Number of reports kept by default (one per line of an 8-row display).
pub const REPORT_LOG_SIZE: usize = 8;

/// Maximum characters of a rendered report line ("3200V:4294967295").
pub const REPORT_LINE_LENGTH: usize = 16;

/// Ring buffer of the most recent reports.
///
/// Old reports are dropped when the buffer is full; [`received`](Self::received)
/// still counts them.
pub struct ReportLog<const N: usize = REPORT_LOG_SIZE> {
    buffer: Deque<DischargeReport, N>,
    received: u32,
}

impl<const N: usize> ReportLog<N> {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            buffer: Deque::new(),
            received: 0,
        }
    }

    /// Iterate over kept reports (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &DischargeReport> { self.buffer.iter() }

    /// Most recent report, if any.
    pub fn last(&self) -> Option<&DischargeReport> { self.buffer.back() }

    /// Number of kept reports.
    #[inline]
    pub fn len(&self) -> usize { self.buffer.len() }

    /// True if nothing has been kept.
    #[inline]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }

    /// Total reports received, including dropped ones.
    #[inline]
    pub const fn received(&self) -> u32 { self.received }

    /// Render kept reports as display lines (oldest first).
    pub fn lines(&self) -> impl Iterator<Item = String<REPORT_LINE_LENGTH>> + '_ { self.buffer.iter().map(format_line) }
}

impl<const N: usize> Default for ReportLog<N> {
    fn default() -> Self { Self::new() }
}

impl<const N: usize> ReportSink for ReportLog<N> {
    fn report(
        &mut self,
        report: DischargeReport,
    ) {
        if self.buffer.is_full() {
            self.buffer.pop_front();
        }
        self.buffer.push_back(report).ok();
        self.received = self.received.wrapping_add(1);
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Render a report as `"<volts>V:<count>"`.
pub fn format_line(report: &DischargeReport) -> String<REPORT_LINE_LENGTH> {
    let mut line = String::new();
    push_u32(&mut line, u32::from(report.voltage));
    line.push_str("V:").ok();
    push_u32(&mut line, report.count);
    line
}

/// Push a u32 value to a heapless string (no format! macro).
pub fn push_u32<const N: usize>(
    s: &mut String<N>,
    mut val: u32,
) {
    if val == 0 {
        s.push('0').ok();
        return;
    }

    // Build digits in reverse
    let mut digits = [0u8; 10];
    let mut i = 0;
    while val > 0 {
        digits[i] = (val % 10) as u8;
        val /= 10;
        i += 1;
    }

    while i > 0 {
        i -= 1;
        s.push((b'0' + digits[i]) as char).ok();
    }
}

// =============================================================================
// Tests
// =============================================================================
