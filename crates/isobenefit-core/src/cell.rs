use serde::{Deserialize, Serialize};

/// Land-use class of a single grid cell.
///
/// The discriminants are the raster codes used by callers that hand the
/// engine a raw extents array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(i8)]
pub enum CellClass {
    OutOfBounds = -1,
    #[default]
    Nature = 0,
    Built = 1,
    Centre = 2,
}

impl CellClass {
    pub fn code(self) -> i8 {
        self as i8
    }

    /// Built or Centre.
    pub fn is_developed(self) -> bool {
        matches!(self, CellClass::Built | CellClass::Centre)
    }
}

impl TryFrom<i16> for CellClass {
    type Error = i16;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(CellClass::OutOfBounds),
            0 => Ok(CellClass::Nature),
            1 => Ok(CellClass::Built),
            2 => Ok(CellClass::Centre),
            other => Err(other),
        }
    }
}

/// Green-interface status of a cell.
///
/// A frontier cell is Nature rook-adjacent to development. `Tombstoned` marks
/// a frontier cell whose development was rejected because it would strand
/// green access elsewhere. It keeps radiating green access but is never
/// re-activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Frontier {
    #[default]
    Inactive,
    Active,
    Tombstoned,
}

impl Frontier {
    pub fn is_active(self) -> bool {
        self == Frontier::Active
    }

    /// Whether this cell's influence is currently part of the green access surface.
    pub fn contributes(self) -> bool {
        matches!(self, Frontier::Active | Frontier::Tombstoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_round_trip_through_raster_values() {
        for class in [
            CellClass::OutOfBounds,
            CellClass::Nature,
            CellClass::Built,
            CellClass::Centre,
        ] {
            assert_eq!(CellClass::try_from(class.code() as i16), Ok(class));
        }
        assert_eq!(CellClass::try_from(3), Err(3));
        assert_eq!(CellClass::try_from(-2), Err(-2));
    }

    #[test]
    fn only_built_and_centre_are_developed() {
        assert!(CellClass::Built.is_developed());
        assert!(CellClass::Centre.is_developed());
        assert!(!CellClass::Nature.is_developed());
        assert!(!CellClass::OutOfBounds.is_developed());
    }

    #[test]
    fn tombstones_still_contribute_but_are_not_active() {
        assert!(Frontier::Active.contributes());
        assert!(!Frontier::Inactive.contributes());
        assert!(Frontier::Tombstoned.contributes());
        assert!(!Frontier::Tombstoned.is_active());
    }
}
