//! Per-tick CPU budget tracking with the Cortex-M33 DWT cycle counter.
//!
//! Each tick has [`TICK_PERIOD_US`](crate::config::TICK_PERIOD_US) of wall
//! time. The cycle loop measures how many CPU cycles one tick of work took
//! and [`TickBudget`] folds that into worst-case and average utilization plus
//! an overrun count (ticks that took longer than the period).
//!
//! # Overflow Handling
//!
//! CYCCNT is 32 bits and wraps every ~28.6 s at 150 MHz. A tick is ~1 ms, so
//! `wrapping_sub` between two reads is always correct.

/// Maximum plausible cycle count for one measurement (~1 s at 150 MHz).
/// Anything larger is a wrap or a debugger halt and is discarded.
const MAX_SANE_CYCLES: u32 = 150_000_000;

/// Enable the DWT cycle counter.
///
/// Must be called after `embassy_rp::init()`. Idempotent.
pub fn init() {
    // DEMCR.TRCENA must be set before DWT.CTRL.CYCCNTENA takes effect
    #[cfg(target_arch = "arm")]
    {
        // SAFETY: embassy-rp never takes the core peripherals; only DCB.DEMCR
        // and DWT.CTRL are modified here, before any task is spawned.
        let mut core = unsafe { cortex_m::Peripherals::steal() };
        core.DCB.enable_trace();
        core.DWT.enable_cycle_counter();
    }
}

/// Read current cycle count (32-bit, wraps).
#[inline]
pub fn read() -> u32 {
    #[cfg(target_arch = "arm")]
    {
        cortex_m::peripheral::DWT::cycle_count()
    }
    #[cfg(not(target_arch = "arm"))]
    {
        0
    }
}

/// Elapsed cycles between two reads, `None` if implausible.
#[inline]
pub fn elapsed(
    start: u32,
    end: u32,
) -> Option<u32> {
    let elapsed = end.wrapping_sub(start);
    (elapsed <= MAX_SANE_CYCLES).then_some(elapsed)
}

/// Tick work statistics over a reporting window.
#[derive(Clone, Copy, Debug)]
pub struct TickBudget {
    /// Cycles available per tick.
    budget_cycles: u32,
    worst_cycles: u32,
    total_cycles: u64,
    ticks: u32,
    overruns: u32,
}

impl TickBudget {
    /// Budget for ticks of `tick_period_us` at `cpu_freq_hz`.
    pub const fn new(
        cpu_freq_hz: u32,
        tick_period_us: u32,
    ) -> Self {
        Self::new_with_budget(((cpu_freq_hz as u64 * tick_period_us as u64) / 1_000_000) as u32)
    }

    /// Record the cycles one tick took.
    pub fn record(
        &mut self,
        cycles: u32,
    ) {
        self.worst_cycles = self.worst_cycles.max(cycles);
        self.total_cycles += u64::from(cycles);
        self.ticks = self.ticks.saturating_add(1);
        if cycles > self.budget_cycles {
            self.overruns = self.overruns.saturating_add(1);
        }
    }

    /// Cycles available per tick.
    #[inline]
    pub const fn budget_cycles(&self) -> u32 { self.budget_cycles }

    /// Slowest tick in the window, in cycles.
    #[inline]
    pub const fn worst_cycles(&self) -> u32 { self.worst_cycles }

    /// Ticks in the window that exceeded the budget.
    #[inline]
    pub const fn overruns(&self) -> u32 { self.overruns }

    /// Ticks recorded in the window.
    #[inline]
    pub const fn ticks(&self) -> u32 { self.ticks }

    /// Slowest tick as a percentage of the budget (may exceed 100).
    pub fn worst_percent(&self) -> u32 { percent_of(u64::from(self.worst_cycles), self.budget_cycles) }

    /// Mean tick as a percentage of the budget.
    pub fn average_percent(&self) -> u32 {
        if self.ticks == 0 {
            return 0;
        }
        percent_of(self.total_cycles / u64::from(self.ticks), self.budget_cycles)
    }

    /// Start a new reporting window.
    pub fn reset(&mut self) { *self = Self::new_with_budget(self.budget_cycles); }

    const fn new_with_budget(budget_cycles: u32) -> Self {
        Self {
            budget_cycles,
            worst_cycles: 0,
            total_cycles: 0,
            ticks: 0,
            overruns: 0,
        }
    }
}

/// `cycles` as a percentage of `budget`, 0 for an empty budget.
fn percent_of(
    cycles: u64,
    budget: u32,
) -> u32 {
    if budget == 0 {
        return 0;
    }
    ((cycles * 100) / u64::from(budget)).min(u64::from(u32::MAX)) as u32
}

// =============================================================================
// Unit Tests (run on host with: cargo test --lib --target <host-triple>)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_inert_off_target() {
        init();
        init();
        assert_eq!(read(), 0);
        assert_eq!(elapsed(read(), read()), Some(0));
    }

    #[test]
    fn test_elapsed_normal() {
        assert_eq!(elapsed(100, 200), Some(100));
        assert_eq!(elapsed(0, 1000), Some(1000));
    }

    #[test]
    fn test_elapsed_wrap() {
        assert_eq!(elapsed(u32::MAX - 100, 100), Some(201));
    }

    #[test]
    fn test_elapsed_sanity_check() {
        assert_eq!(elapsed(0, MAX_SANE_CYCLES + 1), None);
    }

    #[test]
    fn test_budget_at_stock_clock() {
        // 150 MHz, 1 ms tick = 150,000 cycles
        let budget = TickBudget::new(150_000_000, 1000);
        assert_eq!(budget.budget_cycles(), 150_000);
        assert_eq!(budget.average_percent(), 0, "empty window");
    }

    #[test]
    fn test_worst_and_average() {
        let mut budget = TickBudget::new(150_000_000, 1000);
        budget.record(15_000);
        budget.record(45_000);
        assert_eq!(budget.worst_cycles(), 45_000);
        assert_eq!(budget.worst_percent(), 30);
        assert_eq!(budget.average_percent(), 20);
        assert_eq!(budget.overruns(), 0);
    }

    #[test]
    fn test_overruns_and_reset() {
        let mut budget = TickBudget::new(150_000_000, 1000);
        budget.record(150_000);
        budget.record(150_001);
        assert_eq!(budget.overruns(), 1, "exactly the budget is not an overrun");
        assert!(budget.worst_percent() >= 100);

        budget.reset();
        assert_eq!(budget.ticks(), 0);
        assert_eq!(budget.worst_cycles(), 0);
        assert_eq!(budget.budget_cycles(), 150_000);
    }

    #[test]
    fn test_zero_budget() {
        let mut budget = TickBudget::new(0, 1000);
        budget.record(10);
        assert_eq!(budget.worst_percent(), 0);
    }
}
