//! Logical actuator to physical channel mapping.

use crate::{Error, Result, MAX_ACTUATORS};
use smallvec::SmallVec;

/// Fixed lookup from logical actuator index to physical output channel.
///
/// Built once at initialization and never mutated. The table is injective:
/// no two actuators share a physical channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapper {
    table: SmallVec<[usize; MAX_ACTUATORS]>,
    device_channels: usize,
}

impl ChannelMapper {
    pub fn build(table: &[usize], actuator_count: usize, device_channels: usize) -> Result<Self> {
        if actuator_count == 0 || actuator_count > MAX_ACTUATORS {
            return Err(Error::InvalidActuatorCount(actuator_count));
        }
        if table.len() != actuator_count {
            return Err(Error::MappingCardinality {
                mapped: table.len(),
                actuators: actuator_count,
            });
        }

        for (actuator, &channel) in table.iter().enumerate() {
            if channel >= device_channels {
                return Err(Error::ChannelOutOfRange {
                    actuator,
                    channel,
                    device_channels,
                });
            }
            if let Some(first) = table[..actuator].iter().position(|&c| c == channel) {
                return Err(Error::DuplicateChannel {
                    first,
                    second: actuator,
                    channel,
                });
            }
        }

        Ok(Self {
            table: SmallVec::from_slice(table),
            device_channels,
        })
    }

    /// Actuator `i` drives channel `i`.
    pub fn identity(actuator_count: usize, device_channels: usize) -> Result<Self> {
        let table: SmallVec<[usize; MAX_ACTUATORS]> = (0..actuator_count).collect();
        Self::build(&table, actuator_count, device_channels)
    }

    #[inline]
    pub fn channel(&self, actuator: usize) -> Option<usize> {
        self.table.get(actuator).copied()
    }

    #[inline]
    pub fn actuator_count(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn device_channels(&self) -> usize {
        self.device_channels
    }

    /// `(actuator, channel)` pairs in actuator order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.table.iter().copied().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let mapper = ChannelMapper::identity(6, 8).unwrap();
        assert_eq!(mapper.actuator_count(), 6);
        assert_eq!(mapper.device_channels(), 8);
        assert_eq!(mapper.channel(5), Some(5));
        assert_eq!(mapper.channel(6), None);
    }

    #[test]
    fn test_permuted_table() {
        let mapper = ChannelMapper::build(&[3, 1, 0, 2], 4, 4).unwrap();
        let pairs: Vec<_> = mapper.iter().collect();
        assert_eq!(pairs, vec![(0, 3), (1, 1), (2, 0), (3, 2)]);
    }

    #[test]
    fn test_cardinality_mismatch() {
        let err = ChannelMapper::build(&[0, 1, 2], 6, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::MappingCardinality {
                mapped: 3,
                actuators: 6
            }
        ));
    }

    #[test]
    fn test_channel_out_of_range() {
        let err = ChannelMapper::build(&[0, 1, 8], 3, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelOutOfRange {
                actuator: 2,
                channel: 8,
                device_channels: 8
            }
        ));
    }

    #[test]
    fn test_duplicate_channel() {
        let err = ChannelMapper::build(&[4, 1, 4], 3, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateChannel {
                first: 0,
                second: 2,
                channel: 4
            }
        ));
    }

    #[test]
    fn test_identity_needs_enough_channels() {
        assert!(ChannelMapper::identity(6, 4).is_err());
        assert!(ChannelMapper::identity(0, 4).is_err());
    }
}
