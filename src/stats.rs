//! Session statistics: RTT samples, retransmission counting, and the final
//! transfer report.
//!
//! [`SessionStats`] accumulates during the sending phase — one RTT sample per
//! first-observed acknowledgement, one retransmission tick per timeout round.
//! Once the transfer completes, [`SessionStats::report`] freezes everything
//! into a [`TransferReport`].
//!
//! The reported "loss rate" is `retransmissions / (packets_sent +
//! retransmissions)` — the fraction of transmission attempts that were
//! retransmission rounds.  That is an *estimate*, not a measured channel loss
//! probability (one round can cover several lost packets), and is reported
//! under that name deliberately.

use std::time::Duration;

/// Mutable per-session counters and samples.
#[derive(Debug, Default)]
pub struct SessionStats {
    /// RTT samples in arrival order, one per first-observed ACK.
    rtt_samples: Vec<Duration>,
    /// Number of timeout-driven retransmission rounds.
    retransmissions: u32,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one RTT sample (first ACK observation for some sequence).
    pub fn record_rtt(&mut self, sample: Duration) {
        self.rtt_samples.push(sample);
    }

    /// Record one timeout-driven retransmission round.
    pub fn record_retransmission(&mut self) {
        self.retransmissions += 1;
    }

    /// Retransmission rounds so far.
    pub fn retransmissions(&self) -> u32 {
        self.retransmissions
    }

    /// RTT samples collected so far.
    pub fn sample_count(&self) -> usize {
        self.rtt_samples.len()
    }

    /// Freeze the counters into a [`TransferReport`].
    ///
    /// `packets_sent` is the sender's final `next_to_send` (the number of
    /// distinct sequence numbers put on the wire), `acknowledged` the size of
    /// the acknowledged set at completion.
    pub fn report(&self, packets_sent: u16, acknowledged: usize) -> TransferReport {
        let attempts = u64::from(packets_sent) + u64::from(self.retransmissions);
        let loss_rate_estimate = if attempts == 0 {
            0.0
        } else {
            f64::from(self.retransmissions) / attempts as f64
        };

        TransferReport {
            packets_sent,
            acknowledged,
            retransmissions: self.retransmissions,
            loss_rate_estimate,
            rtt: RttSummary::over(&self.rtt_samples),
        }
    }
}

/// Final session statistics, computed once from the frozen samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    /// Distinct sequence numbers transmitted (final `next_to_send`).
    pub packets_sent: u16,
    /// Size of the acknowledged set at completion.
    pub acknowledged: usize,
    /// Timeout-driven retransmission rounds.
    pub retransmissions: u32,
    /// `retransmissions / (packets_sent + retransmissions)`.  An estimate of
    /// how lossy the transfer was, *not* the channel's drop probability.
    pub loss_rate_estimate: f64,
    /// RTT aggregates, or `None` when no ACK was ever observed.
    pub rtt: Option<RttSummary>,
}

/// Min/max/mean/standard-deviation over the collected RTT samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttSummary {
    pub min: Duration,
    pub max: Duration,
    /// Arithmetic mean in milliseconds.
    pub mean_ms: f64,
    /// Sample standard deviation (n − 1 divisor) in milliseconds; 0 for a
    /// single sample.
    pub stddev_ms: f64,
}

impl RttSummary {
    /// Aggregate `samples`, or `None` when the set is empty.
    fn over(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let ms: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        let mean = ms.iter().sum::<f64>() / ms.len() as f64;
        let stddev = if ms.len() > 1 {
            let var = ms.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (ms.len() - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Some(Self {
            min: *samples.iter().min().unwrap(),
            max: *samples.iter().max().unwrap(),
            mean_ms: mean,
            stddev_ms: stddev,
        })
    }
}

impl std::fmt::Display for TransferReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "===== transfer report =====")?;
        writeln!(
            f,
            "packets sent:     {} ({} acknowledged)",
            self.packets_sent, self.acknowledged
        )?;
        writeln!(f, "retransmissions:  {}", self.retransmissions)?;
        writeln!(
            f,
            "loss rate (est.): {:.2}%",
            self.loss_rate_estimate * 100.0
        )?;
        match &self.rtt {
            Some(rtt) => {
                writeln!(f, "max RTT:          {}ms", rtt.max.as_millis())?;
                writeln!(f, "min RTT:          {}ms", rtt.min.as_millis())?;
                writeln!(f, "mean RTT:         {:.0}ms", rtt.mean_ms)?;
                write!(f, "RTT jitter:       {:.0}ms", rtt.stddev_ms)
            }
            None => write!(f, "RTT:              no samples"),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
