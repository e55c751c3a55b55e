//! Port state machine: physical, operational and administrative link axes.
//!
//! Each axis maps a raw vendor code to text and classifies the code against
//! the operator's accepted set. Deviations split into soft (expected
//! operational conditions, e.g. a port taken offline on purpose) and hard
//! (genuine failures). New vendor tables only need a new `StateAxis` value;
//! the evaluation logic stays untouched.

use crate::types::Severity;

/// Outcome of matching a raw code against an accepted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateVerdict {
    Accepted,
    SoftDeviation,
    HardDeviation,
}

impl StateVerdict {
    pub fn severity(self) -> Severity {
        match self {
            StateVerdict::Accepted => Severity::Ok,
            StateVerdict::SoftDeviation => Severity::Warn,
            StateVerdict::HardDeviation => Severity::Crit,
        }
    }
}

/// One link-state axis: label, vendor code table and soft deviation set.
#[derive(Debug, Clone, Copy)]
pub struct StateAxis {
    pub label: &'static str,
    names: &'static [(u8, &'static str)],
    soft: &'static [u8],
}

pub const PHYSICAL: StateAxis = StateAxis {
    label: "Physical",
    names: &[
        (1, "no card"),
        (2, "no transceiver"),
        (3, "laser fault"),
        (4, "no light"),
        (5, "no sync"),
        (6, "in sync"),
        (7, "port fault"),
        (8, "diag fault"),
        (9, "lock ref"),
    ],
    soft: &[1, 4],
};

pub const OPERATIONAL: StateAxis = StateAxis {
    label: "Operational",
    names: &[
        (0, "unknown"),
        (1, "online"),
        (2, "offline"),
        (3, "testing"),
        (4, "faulty"),
    ],
    soft: &[3],
};

pub const ADMINISTRATIVE: StateAxis = StateAxis {
    label: "Administrative",
    names: &[(1, "online"), (2, "offline"), (3, "testing"), (4, "faulty")],
    soft: &[1, 2, 3],
};

impl StateAxis {
    /// Human text for a raw code; codes outside the vendor table render as
    /// `unknown (<code>)` rather than failing.
    pub fn render(&self, code: u8) -> String {
        self.names
            .iter()
            .find(|(c, _)| *c == code)
            .map_or_else(|| format!("unknown ({code})"), |(_, name)| (*name).to_string())
    }

    pub fn classify(&self, code: u8, accepted: &[u8]) -> StateVerdict {
        if accepted.contains(&code) {
            StateVerdict::Accepted
        } else if self.soft.contains(&code) {
            StateVerdict::SoftDeviation
        } else {
            StateVerdict::HardDeviation
        }
    }

    /// Evaluate one axis into its severity and annotated message part.
    pub fn evaluate(&self, code: u8, accepted: &[u8]) -> (Severity, String) {
        let severity = self.classify(code, accepted).severity();
        let message = format!(
            "{}: {}{}",
            self.label,
            self.render(code),
            severity.marker()
        );
        (severity, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_code_is_ok() {
        let (severity, message) = PHYSICAL.evaluate(6, &[6]);
        assert_eq!(severity, Severity::Ok);
        assert_eq!(message, "Physical: in sync");
    }

    #[test]
    fn test_soft_deviation_warns() {
        let (severity, message) = PHYSICAL.evaluate(4, &[6]);
        assert_eq!(severity, Severity::Warn);
        assert_eq!(message, "Physical: no light (!)");
    }

    #[test]
    fn test_hard_deviation_is_crit() {
        let (severity, message) = PHYSICAL.evaluate(7, &[6]);
        assert_eq!(severity, Severity::Crit);
        assert_eq!(message, "Physical: port fault (!!)");
    }

    #[test]
    fn test_operational_testing_is_soft() {
        assert_eq!(OPERATIONAL.classify(3, &[1]), StateVerdict::SoftDeviation);
        assert_eq!(OPERATIONAL.classify(4, &[1]), StateVerdict::HardDeviation);
    }

    #[test]
    fn test_admin_offline_is_soft() {
        // An administratively disabled port is an expected condition.
        assert_eq!(
            ADMINISTRATIVE.classify(2, &[1]),
            StateVerdict::SoftDeviation
        );
        assert_eq!(
            ADMINISTRATIVE.classify(4, &[1]),
            StateVerdict::HardDeviation
        );
    }

    #[test]
    fn test_accepted_set_overrides_soft_set() {
        assert_eq!(ADMINISTRATIVE.classify(2, &[1, 2]), StateVerdict::Accepted);
    }

    #[test]
    fn test_unknown_code_renders_and_classifies() {
        let (severity, message) = OPERATIONAL.evaluate(42, &[1]);
        assert_eq!(severity, Severity::Crit);
        assert_eq!(message, "Operational: unknown (42) (!!)");
    }
}
