//! Zones: labels on the offsets of a node's meets, used to measure how
//! regularly child nodes are spread over their parent.

use super::{Soln, UndoOp, ZoneData};
use crate::ids::{MeetId, NodeId, ZoneId};

impl Soln {
    pub(crate) fn zone_data(&self, zone: ZoneId) -> &ZoneData {
        match &self.zones[zone.index()] {
            Some(z) => z,
            None => panic!("{} has been deleted", zone),
        }
    }

    pub(crate) fn zone_data_mut(&mut self, zone: ZoneId) -> &mut ZoneData {
        match &mut self.zones[zone.index()] {
            Some(z) => z,
            None => panic!("{} has been deleted", zone),
        }
    }

    pub fn zone_make(&mut self, node: NodeId) -> ZoneId {
        self.zones.push(Some(ZoneData {
            node,
            meet_offsets: Vec::new(),
        }));
        let zone = ZoneId::new(self.zones.len() - 1);
        self.node_data_mut(node).zones.push(zone);
        self.log(UndoOp::ZoneMake(zone));
        zone
    }

    /// Deletes `zone`, clearing it from every meet offset.
    pub fn zone_delete(&mut self, zone: ZoneId) {
        while let Some(&(meet, offset)) = self.zone_data(zone).meet_offsets.last() {
            self.zone_delete_meet_offset(zone, meet, offset);
        }
        let node = self.zone_data(zone).node;
        let zones = &mut self.node_data_mut(node).zones;
        let pos = zones
            .iter()
            .position(|z| *z == zone)
            .unwrap_or_else(|| panic!("zone_delete: {} missing from node", zone));
        zones.remove(pos);
        if let Some(data) = self.zones[zone.index()].take() {
            self.log(UndoOp::ZoneDelete(zone, Box::new(data), pos));
        }
    }

    pub fn zone_node(&self, zone: ZoneId) -> NodeId {
        self.zone_data(zone).node
    }

    pub fn node_zones(&self, node: NodeId) -> &[ZoneId] {
        &self.node_data(node).zones
    }

    /// Puts offset `offset` of `meet` into `zone`. Fails when the meet is
    /// not in the zone's node, the offset is out of range, or the offset
    /// already has a zone.
    pub fn zone_add_meet_offset(&mut self, zone: ZoneId, meet: MeetId, offset: usize) -> bool {
        let m = self.meet_data(meet);
        if m.node != Some(self.zone_data(zone).node)
            || offset >= m.duration
            || m.zones[offset].is_some()
        {
            return false;
        }
        self.meet_data_mut(meet).zones[offset] = Some(zone);
        self.zone_data_mut(zone).meet_offsets.push((meet, offset));
        self.log(UndoOp::ZoneAddMeetOffset(zone, meet, offset));
        true
    }

    pub fn zone_delete_meet_offset(&mut self, zone: ZoneId, meet: MeetId, offset: usize) {
        let offsets = &mut self.zone_data_mut(zone).meet_offsets;
        let Some(pos) = offsets.iter().position(|mo| *mo == (meet, offset)) else {
            return;
        };
        offsets.remove(pos);
        self.meet_data_mut(meet).zones[offset] = None;
        self.log(UndoOp::ZoneDeleteMeetOffset(zone, meet, offset, pos));
    }

    pub fn meet_offset_zone(&self, meet: MeetId, offset: usize) -> Option<ZoneId> {
        self.meet_data(meet).zones[offset]
    }
}
