//! Command line scenario.
//!
//! ```text
//! simulator [SECONDS] [--reset-every TICKS]
//! ```
//!
//! `SECONDS` of simulated time are run (default 10). With `--reset-every`,
//! the driver is restarted every `TICKS` ticks as if the board lost power:
//! window and detector start over while the stored histogram is kept.

use thiserror::Error;

use crate::timing::ticks_for_secs;

/// Simulated seconds when none are given.
pub const DEFAULT_SECONDS: u64 = 10;

/// Usage line printed on argument errors.
pub const USAGE: &str = "usage: simulator [SECONDS] [--reset-every TICKS]";

/// What to simulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub seconds: u64,
    pub reset_every: Option<u64>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_SECONDS,
            reset_every: None,
        }
    }
}

/// Argument errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("--reset-every needs a tick count")]
    MissingResetTicks,
    #[error("--reset-every must be at least 1")]
    ZeroResetTicks,
    #[error("unexpected argument {0:?}")]
    Unexpected(String),
}

impl Scenario {
    /// Parse arguments (without the program name).
    pub fn parse<I>(args: I) -> Result<Self, ScenarioError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut scenario = Self::default();
        let mut seconds_seen = false;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            if arg == "--reset-every" {
                let ticks = args.next().ok_or(ScenarioError::MissingResetTicks)?;
                let ticks = parse_number(&ticks)?;
                if ticks == 0 {
                    return Err(ScenarioError::ZeroResetTicks);
                }
                scenario.reset_every = Some(ticks);
            } else if !seconds_seen && !arg.starts_with('-') {
                let seconds = parse_number(&arg)?;
                if ticks_for_secs(seconds).is_none() {
                    return Err(ScenarioError::InvalidNumber(arg));
                }
                scenario.seconds = seconds;
                seconds_seen = true;
            } else {
                return Err(ScenarioError::Unexpected(arg));
            }
        }

        Ok(scenario)
    }

    /// Ticks to simulate. Overflow is rejected by [`Scenario::parse`].
    pub fn total_ticks(&self) -> u64 { ticks_for_secs(self.seconds).unwrap_or(u64::MAX) }
}

fn parse_number(arg: &str) -> Result<u64, ScenarioError> {
    arg.parse().map_err(|_| ScenarioError::InvalidNumber(arg.to_owned()))
}
