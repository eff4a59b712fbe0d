//! Static leave type catalog.
//!
//! Each leave category carries its own policy (entitlement, certificate rule,
//! carry-over cap, pay rate) as data, so a new category is added by
//! registering a definition rather than by branching in the lifecycle code.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::config::LeavePolicy;
use crate::error::{LeaveError, LeaveResult};
use crate::leave::types::{Days, LeaveType};

static STANDARD_CATALOG: Lazy<Catalog> = Lazy::new(|| Catalog::from_policy(&LeavePolicy::default()));

/// How days of a leave type are paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayRate {
    Full,
    Unpaid,
    /// The first `full_pay` days of the period at full rate, the next
    /// `half_pay` days at half rate.
    Split { full_pay: Days, half_pay: Days },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PayBreakdown {
    pub full_pay: Days,
    pub half_pay: Days,
    pub unpaid: Days,
}

impl PayRate {
    /// Split `duration` into pay bands given the days of the period already used.
    pub fn breakdown(&self, used_before: Days, duration: Days) -> PayBreakdown {
        match *self {
            PayRate::Full => PayBreakdown {
                full_pay: duration,
                ..PayBreakdown::default()
            },
            PayRate::Unpaid => PayBreakdown {
                unpaid: duration,
                ..PayBreakdown::default()
            },
            PayRate::Split { full_pay, half_pay } => {
                let full_left = full_pay.saturating_sub(used_before);
                let full = duration.min(full_left);
                let rest = duration.saturating_sub(full);

                let half_used = used_before.saturating_sub(full_pay);
                let half = rest.min(half_pay.saturating_sub(half_used));

                PayBreakdown {
                    full_pay: full,
                    half_pay: half,
                    unpaid: rest.saturating_sub(half),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveTypeDefinition {
    pub id: LeaveType,
    pub days_per_year: Days,
    pub requires_certificate: bool,
    /// Certificate only demanded when the duration exceeds this many days
    pub certificate_after: Option<Days>,
    pub certificate_kind: Option<String>,
    /// `None` means unused days never roll over
    pub carry_over_cap: Option<Days>,
    pub pay_rate: PayRate,
}

impl LeaveTypeDefinition {
    pub fn new(id: LeaveType, days_per_year: Days) -> Self {
        Self {
            id,
            days_per_year,
            requires_certificate: false,
            certificate_after: None,
            certificate_kind: None,
            carry_over_cap: None,
            pay_rate: PayRate::Full,
        }
    }

    pub fn with_certificate(mut self, kind: &str, after: Option<Days>) -> Self {
        self.requires_certificate = true;
        self.certificate_kind = Some(kind.to_string());
        self.certificate_after = after;
        self
    }

    pub fn with_carry_over_cap(mut self, cap: Days) -> Self {
        self.carry_over_cap = Some(cap);
        self
    }

    pub fn with_pay_rate(mut self, pay_rate: PayRate) -> Self {
        self.pay_rate = pay_rate;
        self
    }

    pub fn requires_certificate_for(&self, duration: Days) -> bool {
        self.requires_certificate && self.certificate_after.is_none_or(|threshold| duration > threshold)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: HashMap<LeaveType, LeaveTypeDefinition>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog built from the default policy
    pub fn standard() -> Self {
        STANDARD_CATALOG.clone()
    }

    pub fn from_policy(policy: &LeavePolicy) -> Self {
        let sick_full = Days::whole(6);
        let sick_half = Days::whole(6);

        let mut catalog = Self::empty();
        catalog
            .register(
                LeaveTypeDefinition::new(LeaveType::Annual, policy.annual_days)
                    .with_carry_over_cap(policy.annual_carry_over_cap),
            )
            .register(
                LeaveTypeDefinition::new(LeaveType::Sick, sick_full + sick_half)
                    .with_certificate("medical certificate", Some(policy.sick_certificate_after))
                    .with_pay_rate(PayRate::Split {
                        full_pay: sick_full,
                        half_pay: sick_half,
                    }),
            )
            .register(
                LeaveTypeDefinition::new(LeaveType::Maternity, Days::whole(84))
                    .with_certificate("medical certificate", None),
            )
            .register(
                LeaveTypeDefinition::new(LeaveType::Paternity, Days::whole(4))
                    .with_certificate("birth certificate", None),
            )
            .register(LeaveTypeDefinition::new(LeaveType::Bereavement, Days::whole(5)))
            .register(
                LeaveTypeDefinition::new(LeaveType::Unpaid, Days::whole(30)).with_pay_rate(PayRate::Unpaid),
            )
            .register(
                LeaveTypeDefinition::new(LeaveType::Marriage, Days::whole(3))
                    .with_certificate("marriage certificate", None),
            )
            .register(
                LeaveTypeDefinition::new(LeaveType::Study, Days::whole(10))
                    .with_certificate("enrolment letter", None),
            )
            .register(LeaveTypeDefinition::new(LeaveType::Custom, policy.custom_days));
        catalog
    }

    /// Add or replace a definition
    pub fn register(&mut self, definition: LeaveTypeDefinition) -> &mut Self {
        self.definitions.insert(definition.id, definition);
        self
    }

    pub fn lookup(&self, leave_type: LeaveType) -> LeaveResult<&LeaveTypeDefinition> {
        self.definitions
            .get(&leave_type)
            .ok_or_else(|| LeaveError::UnknownLeaveType(leave_type.to_string()))
    }

    pub fn lookup_name(&self, name: &str) -> LeaveResult<&LeaveTypeDefinition> {
        self.lookup(LeaveType::parse(name)?)
    }

    pub fn requires_certificate(&self, leave_type: LeaveType, duration: Days) -> LeaveResult<bool> {
        Ok(self.lookup(leave_type)?.requires_certificate_for(duration))
    }

    /// Days that roll into the next period given what was left unused.
    pub fn carry_over_for(&self, leave_type: LeaveType, prior_remaining: Days) -> LeaveResult<Days> {
        Ok(self
            .lookup(leave_type)?
            .carry_over_cap
            .map_or(Days::ZERO, |cap| prior_remaining.min(cap)))
    }

    /// Definitions in leave type order
    pub fn definitions(&self) -> Vec<&LeaveTypeDefinition> {
        LeaveType::iter().filter_map(|t| self.definitions.get(&t)).collect()
    }

    /// True when every leave type resolves to a definition
    pub fn is_complete(&self) -> bool {
        LeaveType::iter().all(|t| self.definitions.contains_key(&t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_covers_every_leave_type() {
        let catalog = Catalog::standard();
        assert!(catalog.is_complete());
        assert_eq!(catalog.definitions().len(), 9);
        assert_eq!(catalog.lookup(LeaveType::Annual).unwrap().days_per_year, Days::whole(12));
        assert_eq!(catalog.lookup(LeaveType::Sick).unwrap().days_per_year, Days::whole(12));
    }

    #[test]
    fn test_unknown_leave_type() {
        let catalog = Catalog::empty();
        assert_eq!(
            catalog.lookup(LeaveType::Study),
            Err(LeaveError::UnknownLeaveType("study".to_string()))
        );
        assert!(matches!(
            Catalog::standard().lookup_name("sabbatical"),
            Err(LeaveError::UnknownLeaveType(_))
        ));
    }

    #[test]
    fn test_sick_certificate_only_beyond_threshold() {
        let catalog = Catalog::standard();
        assert!(!catalog.requires_certificate(LeaveType::Sick, Days::whole(3)).unwrap());
        assert!(catalog.requires_certificate(LeaveType::Sick, Days::from_halves(7)).unwrap());
        assert!(catalog.requires_certificate(LeaveType::Sick, Days::whole(10)).unwrap());
    }

    #[test]
    fn test_certificate_flag_mirrors_catalog() {
        let catalog = Catalog::standard();
        assert!(catalog.requires_certificate(LeaveType::Maternity, Days::HALF).unwrap());
        assert!(!catalog.requires_certificate(LeaveType::Annual, Days::whole(20)).unwrap());
        assert!(!catalog.requires_certificate(LeaveType::Bereavement, Days::whole(5)).unwrap());
    }

    #[test]
    fn test_carry_over_is_capped_and_type_specific() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.carry_over_for(LeaveType::Annual, Days::whole(8)).unwrap(), Days::whole(5));
        assert_eq!(catalog.carry_over_for(LeaveType::Annual, Days::whole(2)).unwrap(), Days::whole(2));
        assert_eq!(catalog.carry_over_for(LeaveType::Sick, Days::whole(8)).unwrap(), Days::ZERO);
    }

    #[test]
    fn test_register_replaces_definition() {
        let mut catalog = Catalog::standard();
        catalog.register(LeaveTypeDefinition::new(LeaveType::Custom, Days::whole(7)));
        assert_eq!(catalog.lookup(LeaveType::Custom).unwrap().days_per_year, Days::whole(7));
    }

    #[test]
    fn test_sick_pay_split_across_bands() {
        let rate = PayRate::Split {
            full_pay: Days::whole(6),
            half_pay: Days::whole(6),
        };

        let first = rate.breakdown(Days::ZERO, Days::whole(4));
        assert_eq!(first.full_pay, Days::whole(4));
        assert_eq!(first.half_pay, Days::ZERO);

        let straddling = rate.breakdown(Days::whole(4), Days::whole(5));
        assert_eq!(straddling.full_pay, Days::whole(2));
        assert_eq!(straddling.half_pay, Days::whole(3));
        assert_eq!(straddling.unpaid, Days::ZERO);

        let beyond = rate.breakdown(Days::whole(11), Days::whole(3));
        assert_eq!(beyond.full_pay, Days::ZERO);
        assert_eq!(beyond.half_pay, Days::whole(1));
        assert_eq!(beyond.unpaid, Days::whole(2));
    }

    #[test]
    fn test_flat_pay_rates() {
        assert_eq!(PayRate::Full.breakdown(Days::whole(3), Days::HALF).full_pay, Days::HALF);
        assert_eq!(PayRate::Unpaid.breakdown(Days::ZERO, Days::whole(2)).unpaid, Days::whole(2));
    }
}
