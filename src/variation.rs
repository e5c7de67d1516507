use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::event::Tau;

lazy_static! {
    static ref VARIATION_RE: Regex = Regex::new(
        r"^(?:(?P<prefix>[[:alnum:]]+)_)?(?P<category>Genuine[[:alnum:]]+)(?:_(?P<bucket>[[:alnum:]]+))?_(?P<direction>[[:alnum:]]+)$"
    ).unwrap();
}

/// Which kind of generator-level object a tau candidate stems from
#[derive(Copy, Clone, Debug, Display, EnumString, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum EsCategory {
    GenuineTauES,
    GenuineElectronES,
    GenuineMuonES,
}

/// Group of tau decay modes sharing one energy scale uncertainty
#[derive(Copy, Clone, Debug, Display, EnumString, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DecayModeBucket {
    #[strum(serialize = "DM0")]
    Dm0,
    #[strum(serialize = "DM1")]
    Dm1,
    #[strum(serialize = "3prong")]
    ThreeProng,
}

impl DecayModeBucket {
    pub fn contains(self, decay_mode: i32) -> bool {
        match self {
            DecayModeBucket::Dm0 => decay_mode == 0,
            DecayModeBucket::Dm1 => decay_mode == 1,
            DecayModeBucket::ThreeProng => decay_mode == 10 || decay_mode == 11,
        }
    }
}

#[derive(Copy, Clone, Debug, Display, EnumString, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Direction {
    #[strum(serialize = "up")]
    Up,
    #[strum(serialize = "down")]
    Down,
}

/// A systematic variation of the tau energy scale
///
/// The textual form is `[<prefix>_]<category>[_<bucket>]_<direction>`,
/// e.g. `Events_GenuineTauES_DM0_up` or `GenuineMuonES_down`. Genuine
/// muons have no decay mode bucket, all other categories require one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TauEsVariation {
    category: EsCategory,
    bucket: Option<DecayModeBucket>,
    direction: Direction,
}

impl TauEsVariation {
    pub fn new(
        category: EsCategory,
        bucket: Option<DecayModeBucket>,
        direction: Direction,
    ) -> Result<Self, VariationError> {
        match (category, bucket) {
            (EsCategory::GenuineMuonES, Some(bucket)) => {
                Err(VariationError::UnexpectedBucket(category, bucket))
            }
            (EsCategory::GenuineTauES | EsCategory::GenuineElectronES, None) => {
                Err(VariationError::MissingBucket(category))
            }
            _ => Ok(Self {
                category,
                bucket,
                direction,
            }),
        }
    }

    pub fn category(&self) -> EsCategory {
        self.category
    }

    pub fn bucket(&self) -> Option<DecayModeBucket> {
        self.bucket
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the variation affects the given tau candidate
    pub fn applies_to(&self, tau: &Tau) -> bool {
        let flav = tau.gen_part_flav;
        let in_bucket = |b: Option<DecayModeBucket>| {
            b.map(|b| b.contains(tau.decay_mode)).unwrap_or(true)
        };
        match self.category {
            EsCategory::GenuineTauES => flav == 5 && in_bucket(self.bucket),
            EsCategory::GenuineElectronES => {
                (flav == 1 || flav == 3) && in_bucket(self.bucket)
            }
            EsCategory::GenuineMuonES => flav == 2 || flav == 4,
        }
    }
}

impl fmt::Display for TauEsVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bucket {
            Some(bucket) => {
                write!(f, "{}_{}_{}", self.category, bucket, self.direction)
            }
            None => write!(f, "{}_{}", self.category, self.direction),
        }
    }
}

impl FromStr for TauEsVariation {
    type Err = VariationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use VariationError::*;

        let Some(captures) = VARIATION_RE.captures(s) else {
            return Err(Unrecognised(s.to_owned()));
        };
        let category = &captures["category"];
        let category = EsCategory::from_str(category)
            .map_err(|_| UnknownCategory(category.to_owned()))?;
        let bucket = captures
            .name("bucket")
            .map(|b| {
                DecayModeBucket::from_str(b.as_str())
                    .map_err(|_| UnknownBucket(b.as_str().to_owned()))
            })
            .transpose()?;
        let direction = &captures["direction"];
        let direction = Direction::from_str(direction)
            .map_err(|_| UnknownDirection(direction.to_owned()))?;
        Self::new(category, bucket, direction)
    }
}

impl TryFrom<String> for TauEsVariation {
    type Error = VariationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TauEsVariation> for String {
    fn from(v: TauEsVariation) -> Self {
        v.to_string()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariationError {
    #[error("Unrecognised tau energy scale variation: {0}")]
    Unrecognised(String),
    #[error("Unknown tau energy scale category: {0}")]
    UnknownCategory(String),
    #[error("Unknown decay mode bucket: {0}")]
    UnknownBucket(String),
    #[error("Unknown variation direction: {0}, expected 'up' or 'down'")]
    UnknownDirection(String),
    #[error("{0} variation requires a decay mode bucket")]
    MissingBucket(EsCategory),
    #[error("{0} variation does not take a decay mode bucket, got {1}")]
    UnexpectedBucket(EsCategory, DecayModeBucket),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let v: TauEsVariation = "Events_GenuineTauES_3prong_down".parse().unwrap();
        assert_eq!(v.category(), EsCategory::GenuineTauES);
        assert_eq!(v.bucket(), Some(DecayModeBucket::ThreeProng));
        assert_eq!(v.direction(), Direction::Down);
        assert_eq!(v.to_string(), "GenuineTauES_3prong_down");

        let v: TauEsVariation = "GenuineMuonES_up".parse().unwrap();
        assert_eq!(v.bucket(), None);
        assert_eq!(v.to_string(), "GenuineMuonES_up");

        let v: TauEsVariation = "GenuineElectronES_DM1_up".parse().unwrap();
        assert_eq!(v.category(), EsCategory::GenuineElectronES);
        assert_eq!(v.bucket(), Some(DecayModeBucket::Dm1));
    }

    #[test]
    fn reject_unknown() {
        use VariationError::*;
        let err = |s: &str| s.parse::<TauEsVariation>().unwrap_err();
        assert_eq!(err("nonsense"), Unrecognised("nonsense".to_owned()));
        assert_eq!(
            err("Events_GenuineJetES_DM0_up"),
            UnknownCategory("GenuineJetES".to_owned())
        );
        assert_eq!(
            err("Events_GenuineTauES_DM2_up"),
            UnknownBucket("DM2".to_owned())
        );
        assert_eq!(
            err("Events_GenuineTauES_DM0_sideways"),
            UnknownDirection("sideways".to_owned())
        );
        assert_eq!(
            err("Events_GenuineTauES_up"),
            MissingBucket(EsCategory::GenuineTauES)
        );
        assert_eq!(
            err("Events_GenuineMuonES_DM0_up"),
            UnexpectedBucket(EsCategory::GenuineMuonES, DecayModeBucket::Dm0)
        );
    }

    #[test]
    fn mask() {
        let tau = |flav, dm| Tau {
            gen_part_flav: flav,
            decay_mode: dm,
            ..Default::default()
        };
        let v: TauEsVariation = "GenuineTauES_3prong_up".parse().unwrap();
        assert!(v.applies_to(&tau(5, 10)));
        assert!(v.applies_to(&tau(5, 11)));
        assert!(!v.applies_to(&tau(5, 1)));
        assert!(!v.applies_to(&tau(1, 10)));

        let v: TauEsVariation = "GenuineElectronES_DM0_down".parse().unwrap();
        assert!(v.applies_to(&tau(1, 0)));
        assert!(v.applies_to(&tau(3, 0)));
        assert!(!v.applies_to(&tau(3, 1)));

        let v: TauEsVariation = "GenuineMuonES_down".parse().unwrap();
        assert!(v.applies_to(&tau(2, 0)));
        assert!(v.applies_to(&tau(4, 11)));
        assert!(!v.applies_to(&tau(5, 0)));
    }
}
