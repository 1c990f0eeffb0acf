// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

use crate::TimeStamp;

/// Maximum number of bytes in a single packet.
pub const MAX_PACKET_LEN: usize = 256;

pub type PacketData = heapless::Vec<u8, MAX_PACKET_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("{len} bytes exceed the maximum packet size of {MAX_PACKET_LEN} bytes")]
    SizeExceeded { len: usize },
}

/// Bounded, length-tagged MIDI bytes with a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub ts: TimeStamp,
    data: PacketData,
}

impl RawPacket {
    pub fn try_from_slice(ts: TimeStamp, bytes: &[u8]) -> Result<Self, PacketError> {
        let data = PacketData::from_slice(bytes)
            .map_err(|()| PacketError::SizeExceeded { len: bytes.len() })?;
        Ok(Self { ts, data })
    }

    /// Status byte followed by 1 or 2 data bytes.
    #[must_use]
    pub(crate) fn from_message(status: u8, data1: u8, data2: Option<u8>) -> Self {
        let data = [status, data1].into_iter().chain(data2).collect();
        Self {
            ts: TimeStamp::NOW,
            data,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for RawPacket {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&[u8]> for RawPacket {
    type Error = PacketError;

    fn try_from(from: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(TimeStamp::NOW, from)
    }
}

/// A batch of packets delivered together by the transport.
///
/// Traversal is bounded by the declared number of packets, even if
/// more packets are linked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketList {
    num_packets: usize,
    packets: Vec<RawPacket>,
}

impl PacketList {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            num_packets: 0,
            packets: Vec::new(),
        }
    }

    /// Packet list as announced by a transport that reports the count separately.
    #[must_use]
    pub fn with_declared_count(num_packets: usize, packets: Vec<RawPacket>) -> Self {
        if num_packets > packets.len() {
            log::debug!(
                "Packet list declares {num_packets} packet(s) but links only {linked}",
                linked = packets.len()
            );
        }
        Self {
            num_packets,
            packets,
        }
    }

    pub fn push(&mut self, packet: RawPacket) {
        self.packets.push(packet);
        self.num_packets = self.packets.len();
    }

    #[must_use]
    pub const fn num_packets(&self) -> usize {
        self.num_packets
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawPacket> + '_ {
        self.packets.iter().take(self.num_packets)
    }
}

impl FromIterator<RawPacket> for PacketList {
    fn from_iter<T: IntoIterator<Item = RawPacket>>(iter: T) -> Self {
        let packets: Vec<_> = iter.into_iter().collect();
        Self {
            num_packets: packets.len(),
            packets,
        }
    }
}

impl From<RawPacket> for PacketList {
    fn from(from: RawPacket) -> Self {
        Self {
            num_packets: 1,
            packets: vec![from],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_size_limit() {
        let bytes = [0x55; MAX_PACKET_LEN + 1];
        assert!(RawPacket::try_from_slice(TimeStamp::NOW, &bytes[..MAX_PACKET_LEN]).is_ok());
        assert_eq!(
            Err(PacketError::SizeExceeded {
                len: MAX_PACKET_LEN + 1
            }),
            RawPacket::try_from_slice(TimeStamp::NOW, &bytes)
        );
    }

    #[test]
    fn packet_length_is_explicit() {
        let bytes: &[u8] = &[0xf0, 0x00, 0x00, 0xf7];
        let packet = RawPacket::try_from(bytes).unwrap();
        assert_eq!(4, packet.len());
        assert_eq!(bytes, packet.as_bytes());
        assert_eq!(TimeStamp::NOW, packet.ts);
        let packet = RawPacket::try_from_slice(TimeStamp::from_micros(1), &[]).unwrap();
        assert!(packet.is_empty());
    }

    #[test]
    fn message_packet() {
        assert_eq!(&[0xc0, 5], RawPacket::from_message(0xc0, 5, None).as_bytes());
        assert_eq!(
            &[0x90, 60, 100],
            RawPacket::from_message(0x90, 60, Some(100)).as_bytes()
        );
    }

    #[test]
    fn traversal_is_bounded_by_declared_count() {
        let packets = vec![
            RawPacket::from_message(0x90, 60, Some(100)),
            RawPacket::from_message(0x80, 60, Some(0)),
            RawPacket::from_message(0xc0, 1, None),
        ];
        let list = PacketList::with_declared_count(2, packets.clone());
        assert_eq!(2, list.iter().count());
        assert_eq!(
            packets[..2].iter().collect::<Vec<_>>(),
            list.iter().collect::<Vec<_>>()
        );

        let list = PacketList::with_declared_count(5, packets);
        assert_eq!(3, list.iter().count());

        let list = PacketList::with_declared_count(0, vec![RawPacket::from_message(0xc0, 1, None)]);
        assert!(list.is_empty());
    }

    #[test]
    fn push_updates_count() {
        let mut list = PacketList::new();
        assert!(list.is_empty());
        list.push(RawPacket::from_message(0xd0, 1, None));
        list.push(RawPacket::from_message(0xd0, 2, None));
        assert_eq!(2, list.num_packets());
    }
}
