//! # Scenario Catalogue
//!
//! Static table mapping each [`ScenarioId`] to the fixture it runs against
//! and a one-line description. The runner resolves the fixture through the
//! configuration's `data` section.
//!
//! ## Fixture sharing
//!
//! Scenarios that share a fixture act on the same server-side license and
//! run in catalogue order: the `l1` loan is renewed before it is returned.
//! `lsd.sequence` walks `l1` from `ready` to `returned` on its own and is
//! therefore only run on request.

use std::fmt;
use std::str::FromStr;

use lcpt_client::Device;

/// Device for the register, renew and return scenarios.
pub const DEVICE_ID: &str = "6f2bd94-3dcf-4034-a663-5f2a7945ee52";
pub const DEVICE_NAME: &str = "My reading device 1";

/// Device for the full status document walk.
pub const WALK_DEVICE_ID: &str = "1e4f1b8c-7a42-4d69-9c1f-0b8f5e3a2d77";
pub const WALK_DEVICE_NAME: &str = "Conformance walk device";

pub fn device() -> Device {
    Device::new(DEVICE_ID, DEVICE_NAME)
}

pub fn walk_device() -> Device {
    Device::new(WALK_DEVICE_ID, WALK_DEVICE_NAME)
}

/// A catalogued scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScenarioId {
    LicenseBasic,
    LicenseLoan,
    LicenseFetched,
    Publication,
    PublicationLicense,
    StatusDocument,
    Register,
    RegisterAgain,
    RegisterAnonymous,
    Cancelled,
    Revoked,
    RenewReady,
    RenewBeforeEnd,
    RenewExtend,
    RenewNoEnd,
    RenewBadDate,
    RenewPotentialRights,
    Return,
    Expired,
    LsdSequence,
    Provision,
}

/// Table entry for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub id: ScenarioId,
    /// Key into the configuration's `data` section.
    pub fixture: &'static str,
    pub description: &'static str,
    /// Part of the default selection.
    pub default: bool,
}

const fn entry(
    id: ScenarioId,
    fixture: &'static str,
    description: &'static str,
) -> Descriptor {
    Descriptor {
        id,
        fixture,
        description,
        default: true,
    }
}

/// Every scenario, in run order.
pub static CATALOGUE: [Descriptor; 21] = [
    entry(ScenarioId::LicenseBasic, "b1", "license structure, links and cryptography"),
    entry(ScenarioId::LicenseFetched, "b1", "license fetched through its status document"),
    entry(ScenarioId::StatusDocument, "b1", "status document structure, events and links"),
    entry(ScenarioId::Register, "b1", "registering a ready license activates it"),
    entry(ScenarioId::RegisterAgain, "b1", "registering the same device again changes nothing"),
    entry(ScenarioId::RegisterAnonymous, "b1", "register without device id and name is rejected"),
    entry(ScenarioId::LicenseLoan, "l1", "loan license structure, cryptography and rights"),
    entry(ScenarioId::RenewReady, "l1", "renewing a ready license is rejected"),
    entry(ScenarioId::RenewBeforeEnd, "l1", "renewing to before the current end is rejected"),
    entry(ScenarioId::RenewExtend, "l1", "renew by two days without device"),
    entry(ScenarioId::RenewNoEnd, "l1", "renew without end date lets the server choose"),
    entry(ScenarioId::RenewBadDate, "l1", "renew with a malformed end date is rejected"),
    entry(ScenarioId::RenewPotentialRights, "l1", "renewal is capped at potential_rights.end"),
    entry(ScenarioId::Return, "l1", "returning an active loan ends it"),
    entry(ScenarioId::Cancelled, "b2", "cancelled license rejects register"),
    entry(ScenarioId::Revoked, "b3", "revoked license rejects register"),
    entry(ScenarioId::Expired, "l2", "expired license rejects register"),
    entry(ScenarioId::Publication, "e1", "protected publication archive and encryption.xml"),
    entry(ScenarioId::PublicationLicense, "e1", "license embedded in the protected publication"),
    Descriptor {
        default: false,
        ..entry(ScenarioId::LsdSequence, "l1", "full status document walk on one license")
    },
    entry(ScenarioId::Provision, "c1", "license server provisioning of an encrypted content"),
];

impl ScenarioId {
    /// Identifier used on the command line and in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LicenseBasic => "license.basic",
            Self::LicenseLoan => "license.loan",
            Self::LicenseFetched => "license.fetched",
            Self::Publication => "publication",
            Self::PublicationLicense => "publication.license",
            Self::StatusDocument => "status.document",
            Self::Register => "register",
            Self::RegisterAgain => "register.again",
            Self::RegisterAnonymous => "register.anonymous",
            Self::Cancelled => "cancelled",
            Self::Revoked => "revoked",
            Self::RenewReady => "renew.ready",
            Self::RenewBeforeEnd => "renew.before_end",
            Self::RenewExtend => "renew.extend",
            Self::RenewNoEnd => "renew.no_end",
            Self::RenewBadDate => "renew.bad_date",
            Self::RenewPotentialRights => "renew.potential_rights",
            Self::Return => "return",
            Self::Expired => "expired",
            Self::LsdSequence => "lsd.sequence",
            Self::Provision => "provision",
        }
    }

    /// The table entry.
    pub fn descriptor(&self) -> &'static Descriptor {
        // Every id has exactly one entry; the table test enforces it.
        CATALOGUE
            .iter()
            .find(|d| d.id == *self)
            .unwrap_or(&CATALOGUE[0])
    }

    pub fn fixture(&self) -> &'static str {
        self.descriptor().fixture
    }

    pub fn description(&self) -> &'static str {
        self.descriptor().description
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An id that names no scenario.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scenario '{0}'")]
pub struct UnknownScenario(pub String);

impl FromStr for ScenarioId {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOGUE
            .iter()
            .map(|d| d.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownScenario(s.to_string()))
    }
}
