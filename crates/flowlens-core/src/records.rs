//! Typed views over the raw telemetry log lines, with one parsing function
//! per log format.

use crate::units::{Bytes, Nanosecs};

identifier!(SwitchId, usize);
identifier!(PortId, usize);

/// A single flow-completion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowRecord {
    /// Flow size.
    pub size: Bytes,
    /// Flow start time.
    pub start: Nanosecs,
    /// Flow completion time.
    pub fct: Nanosecs,
    /// Baseline completion time at line rate.
    pub ideal: Nanosecs,
}

impl FlowRecord {
    /// The completion timestamp of the flow.
    pub fn end(&self) -> Nanosecs {
        self.start + self.fct
    }

    /// The completion time in microseconds.
    pub fn absolute_us(&self) -> f64 {
        self.fct.into_f64() / 1_000.0
    }

    /// The completion-time slowdown relative to the ideal completion time,
    /// floored at 1.0 to exclude below-ideal noise.
    pub fn slowdown(&self) -> f64 {
        let ratio = self.fct.into_f64() / self.ideal.into_f64();
        ratio.max(1.0)
    }
}

/// An event-triggered queue occupancy sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueueSample {
    /// Sample timestamp.
    pub timestamp: Nanosecs,
    /// The switch (or destination-host entity) that was sampled.
    pub switch: SwitchId,
    /// Number of VOQs present at the sampling instant.
    pub queue_depth: u64,
    /// Number of queued packets at the sampling instant.
    pub packet_count: u64,
}

/// A cumulative per-port byte counter sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PortCounterSample {
    /// Sample timestamp.
    pub timestamp: Nanosecs,
    /// The switch owning the port.
    pub switch: SwitchId,
    /// The sampled port.
    pub port: PortId,
    /// Cumulative bytes sent through the port.
    pub cumulative_bytes: Bytes,
}

/// Parses one line of the flow-completion log.
///
/// Lines are whitespace-delimited, laid out as
/// `sip dip sport dport size start fct ideal`; the size, start time,
/// duration, and ideal duration live at indices 4 through 7. The leading
/// addressing fields are not used by the reduction engine, and trailing
/// extra fields are ignored.
pub fn parse_flow_record(s: &str) -> Result<FlowRecord, ParseLineError> {
    const MIN_FCT_FIELDS: usize = 8;
    let fields = s.split_whitespace().collect::<Vec<_>>();
    let nr_fields = fields.len();
    if nr_fields < MIN_FCT_FIELDS {
        return Err(ParseLineError::TooFewFields {
            min: MIN_FCT_FIELDS,
            got: nr_fields,
        });
    }
    Ok(FlowRecord {
        size: fields[4].parse()?,
        start: fields[5].parse()?,
        fct: fields[6].parse()?,
        ideal: fields[7].parse()?,
    })
}

/// Parses one line of the queue occupancy log
/// (`timestamp,switch_id,queue_depth,packet_count`).
pub fn parse_queue_sample(s: &str) -> Result<QueueSample, ParseLineError> {
    const NR_QUEUE_FIELDS: usize = 4;
    let fields = s.trim_end().split(',').collect::<Vec<_>>();
    let nr_fields = fields.len();
    if nr_fields != NR_QUEUE_FIELDS {
        return Err(ParseLineError::WrongNrFields {
            expected: NR_QUEUE_FIELDS,
            got: nr_fields,
        });
    }
    Ok(QueueSample {
        timestamp: fields[0].parse()?,
        switch: fields[1].parse()?,
        queue_depth: fields[2].parse()?,
        packet_count: fields[3].parse()?,
    })
}

/// Parses one line of the port counter log
/// (`timestamp,switch_id,port_id,cumulative_bytes`).
pub fn parse_port_counter(s: &str) -> Result<PortCounterSample, ParseLineError> {
    const NR_PORT_FIELDS: usize = 4;
    let fields = s.trim_end().split(',').collect::<Vec<_>>();
    let nr_fields = fields.len();
    if nr_fields != NR_PORT_FIELDS {
        return Err(ParseLineError::WrongNrFields {
            expected: NR_PORT_FIELDS,
            got: nr_fields,
        });
    }
    Ok(PortCounterSample {
        timestamp: fields[0].parse()?,
        switch: fields[1].parse()?,
        port: fields[2].parse()?,
        cumulative_bytes: fields[3].parse()?,
    })
}

/// Error parsing a single log line. These are recovered locally by the
/// analyses (the line is skipped and counted).
#[derive(Debug, thiserror::Error)]
pub enum ParseLineError {
    /// Incorrect number of fields.
    #[error("wrong number of fields (expected {expected}, got {got})")]
    WrongNrFields {
        /// Expected number of fields.
        expected: usize,
        /// Actual number of fields.
        got: usize,
    },

    /// Not enough whitespace-delimited fields.
    #[error("too few fields (expected at least {min}, got {got})")]
    TooFewFields {
        /// Minimum number of fields.
        min: usize,
        /// Actual number of fields.
        got: usize,
    },

    /// Error parsing a field value.
    #[error("failed to parse field")]
    ParseInt(#[from] std::num::ParseIntError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flow_record_correct() -> anyhow::Result<()> {
        // Layout as produced by the simulator's completion hook.
        let line = "1 2 10000 100 1048576 2000000100 52416 47739";
        let record = parse_flow_record(line)?;
        assert_eq!(record.size, Bytes::new(1_048_576));
        assert_eq!(record.start, Nanosecs::new(2_000_000_100));
        assert_eq!(record.fct, Nanosecs::new(52_416));
        assert_eq!(record.ideal, Nanosecs::new(47_739));
        assert_eq!(record.end(), Nanosecs::new(2_000_052_516));
        Ok(())
    }

    #[test]
    fn parse_flow_record_tolerates_trailing_fields() -> anyhow::Result<()> {
        let line = "1 2 10000 100 1048576 2000000100 52416 47739 7 extra";
        let record = parse_flow_record(line)?;
        assert_eq!(record.size, Bytes::new(1_048_576));
        assert_eq!(record.ideal, Nanosecs::new(47_739));
        Ok(())
    }

    #[test]
    fn parse_flow_record_rejects_short_lines() {
        let err = parse_flow_record("1 2 3").unwrap_err();
        assert!(matches!(
            err,
            ParseLineError::TooFewFields { min: 8, got: 3 }
        ));
    }

    #[test]
    fn parse_flow_record_rejects_non_numeric() {
        let line = "1 2 10000 100 oops 2000000100 52416 47739";
        assert!(matches!(
            parse_flow_record(line),
            Err(ParseLineError::ParseInt(_))
        ));
    }

    #[test]
    fn parse_queue_sample_correct() -> anyhow::Result<()> {
        let sample = parse_queue_sample("2000010000,12,3,47\n")?;
        assert_eq!(sample.timestamp, Nanosecs::new(2_000_010_000));
        assert_eq!(sample.switch, SwitchId::new(12));
        assert_eq!(sample.queue_depth, 3);
        assert_eq!(sample.packet_count, 47);
        Ok(())
    }

    #[test]
    fn parse_port_counter_correct() -> anyhow::Result<()> {
        let sample = parse_port_counter("2000010000,4,1,123456789")?;
        assert_eq!(sample.switch, SwitchId::new(4));
        assert_eq!(sample.port, PortId::new(1));
        assert_eq!(sample.cumulative_bytes, Bytes::new(123_456_789));
        Ok(())
    }

    #[test]
    fn slowdown_is_floored_at_one() {
        let record = FlowRecord {
            size: Bytes::new(100),
            start: Nanosecs::ZERO,
            fct: Nanosecs::new(500),
            ideal: Nanosecs::new(1_000),
        };
        assert_eq!(record.slowdown(), 1.0);
    }
}
