//! Label placement for a track: a bounded pool of reusable label nodes
//! and a per-frame pass hiding labels that overlap more important ones.
//!
//! A label moves through these states:
//!
//! - absent: no slot holds the uid
//! - pooled: a slot is assigned (`update_texts`) but the label hasn't
//!   been positioned in a frame yet
//! - visible: positioned by `draw_frame` and not covered
//! - hidden: positioned, but overlapped by a more important label

use std::collections::{HashMap, HashSet};

use bimap::BiHashMap;
use rstar::primitives::Rectangle;
use rstar::{RTree, AABB};
use ultraviolet::Vec2;

use pairtrack_core::{Priority, Uid};

use crate::surface::{TextMeasurer, TextStyle};

pub const MAX_TEXTS: usize = 50;

/// Horizontal padding around a label's box.
pub const TEXT_MARGIN: f32 = 3.0;

/// Subtracted from measured text heights to compensate for the outline.
pub const TEXT_SIZE_ADJUSTMENT: f32 = 5.0;

/// Fraction of the visible height added above and below the viewport when
/// choosing which records get labels.
pub const LABEL_WINDOW_EXPANSION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

/// A label the renderer would like to show.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub uid: Uid,
    pub priority: Priority,
    pub text: String,
    /// Genome coordinate of the label center.
    pub x: f64,
    /// Vertical center in layout space, if the record has been laid out.
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelNode {
    pub uid: Option<Uid>,
    pub text: String,
    pub priority: Option<Priority>,
    /// Genome x and layout y the label is anchored at.
    pub nominal: [f64; 2],
    /// Screen position of the label center.
    pub position: Vec2,
    pub size: Vec2,
    pub visible: bool,
}

impl LabelNode {
    fn empty() -> Self {
        Self {
            uid: None,
            text: String::new(),
            priority: None,
            nominal: [0.0, 0.0],
            position: Vec2::zero(),
            size: Vec2::zero(),
            visible: false,
        }
    }

    /// Box used for overlap tests, centered on the label.
    /// Whether the position and size are usable for placement.
    pub fn is_finite(&self) -> bool {
        [self.position.x, self.position.y, self.size.x, self.size.y]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn bounds(&self) -> (Vec2, Vec2) {
        let half = Vec2::new(self.size.x / 2.0 + TEXT_MARGIN, self.size.y / 2.0);
        (self.position - half, self.position + half)
    }
}

/// Fixed capacity pool of label nodes.
///
/// Slots are created lazily up to the capacity and recycled through a free
/// list; acquiring a uid that already holds a slot returns that slot, and
/// releasing a uid without one does nothing.
#[derive(Debug, Clone)]
pub struct LabelPool {
    capacity: usize,
    slots: Vec<LabelNode>,
    free: Vec<SlotId>,
    assigned: BiHashMap<Uid, SlotId>,
}

impl LabelPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
            free: Vec::new(),
            assigned: BiHashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changing the capacity releases every label.
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity != self.capacity {
            self.clear();
            self.slots.truncate(capacity);
            self.free.retain(|s| s.0 < capacity);
            self.capacity = capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    pub fn slot_of(&self, uid: &Uid) -> Option<SlotId> {
        self.assigned.get_by_left(uid).copied()
    }

    pub fn get(&self, uid: &Uid) -> Option<&LabelNode> {
        let slot = self.slot_of(uid)?;
        self.slots.get(slot.0)
    }

    pub fn node(&self, slot: SlotId) -> Option<&LabelNode> {
        self.slots.get(slot.0)
    }

    pub fn node_mut(&mut self, slot: SlotId) -> Option<&mut LabelNode> {
        self.slots.get_mut(slot.0)
    }

    pub fn acquire(&mut self, uid: &Uid) -> Option<SlotId> {
        if let Some(slot) = self.slot_of(uid) {
            return Some(slot);
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None if self.slots.len() < self.capacity => {
                self.slots.push(LabelNode::empty());
                SlotId(self.slots.len() - 1)
            }
            None => return None,
        };

        self.slots[slot.0].uid = Some(uid.clone());
        self.assigned.insert(uid.clone(), slot);
        Some(slot)
    }

    pub fn release(&mut self, uid: &Uid) {
        if let Some((_, slot)) = self.assigned.remove_by_left(uid) {
            self.slots[slot.0] = LabelNode::empty();
            self.free.push(slot);
        }
    }

    pub fn clear(&mut self) {
        let uids = self.assigned.left_values().cloned().collect::<Vec<_>>();
        for uid in uids {
            self.release(&uid);
        }
    }

    /// Assigned labels, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &LabelNode)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, node)| node.uid.is_some())
            .map(|(ix, node)| (SlotId(ix), node))
    }

    fn assigned_slots(&self) -> Vec<SlotId> {
        self.iter().map(|(slot, _)| slot).collect()
    }
}

type LabelBox = rstar::primitives::GeomWithData<Rectangle<[f32; 2]>, SlotId>;

pub struct TextManager {
    pool: LabelPool,
    style: TextStyle,
    measurer: Box<dyn TextMeasurer>,
    /// Measured size per uid, along with the text that was measured.
    sizes: HashMap<Uid, (String, Vec2)>,
    /// Labels positioned in the current frame.
    candidates: Vec<SlotId>,
}

impl TextManager {
    pub fn new(capacity: usize, measurer: Box<dyn TextMeasurer>) -> Self {
        Self {
            pool: LabelPool::with_capacity(capacity),
            style: TextStyle::default(),
            measurer,
            sizes: HashMap::new(),
            candidates: Vec::new(),
        }
    }

    pub fn pool(&self) -> &LabelPool {
        &self.pool
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: TextStyle) {
        if style != self.style {
            self.sizes.clear();
            self.style = style;
        }
    }

    pub fn label(&self, uid: &Uid) -> Option<&LabelNode> {
        self.pool.get(uid)
    }

    pub fn visible_labels(&self) -> impl Iterator<Item = &LabelNode> {
        self.pool.iter().map(|(_, n)| n).filter(|n| n.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_labels().count()
    }

    /// Reassigns the pool to the requests whose anchor falls within
    /// `window` (layout space, expanded by [`LABEL_WINDOW_EXPANSION`]),
    /// up to `max_texts` of them in request order. Requests without a
    /// known vertical position are always eligible; requests with a
    /// non-finite anchor never are.
    pub fn update_texts(
        &mut self,
        show: bool,
        max_texts: usize,
        requests: &[LabelRequest],
        window: [f64; 2],
    ) {
        if !show {
            self.pool.clear();
            self.candidates.clear();
            return;
        }

        self.pool.set_capacity(max_texts);

        let [y0, y1] = window;
        let pad = (y1 - y0) * LABEL_WINDOW_EXPANSION;
        let (lo, hi) = (y0 - pad, y1 + pad);

        let selected = requests
            .iter()
            .filter(|r| r.x.is_finite())
            .filter(|r| match r.y {
                Some(y) => y.is_finite() && y > lo && y < hi,
                None => true,
            })
            .take(max_texts)
            .collect::<Vec<_>>();

        let keep = selected.iter().map(|r| &r.uid).collect::<HashSet<_>>();
        let stale = self
            .pool
            .iter()
            .filter_map(|(_, n)| n.uid.clone())
            .filter(|uid| !keep.contains(uid))
            .collect::<Vec<_>>();
        for uid in &stale {
            self.pool.release(uid);
        }
        self.sizes.retain(|uid, _| keep.contains(uid));

        for request in selected {
            let Some(slot) = self.pool.acquire(&request.uid) else {
                break;
            };
            let size = self.measure(&request.uid, &request.text);

            if let Some(node) = self.pool.node_mut(slot) {
                node.text = request.text.clone();
                node.priority = Some(request.priority.clone());
                node.nominal = [request.x, request.y.unwrap_or(0.0)];
                node.size = Vec2::new(size.x, size.y - TEXT_SIZE_ADJUSTMENT);
                node.visible = false;
            }
        }

        log::debug!(
            "update_texts: {} of {} requests labeled",
            self.pool.len(),
            requests.len()
        );
    }

    fn measure(&mut self, uid: &Uid, text: &str) -> Vec2 {
        if let Some((measured, size)) = self.sizes.get(uid) {
            if measured == text {
                return *size;
            }
        }
        let size = self.measurer.measure(text, &self.style);
        self.sizes.insert(uid.clone(), (text.to_string(), size));
        size
    }

    /// Positions every pooled label for this frame using `project`, which
    /// maps a label's nominal anchor onto the screen, then hides overlaps.
    pub fn draw_frame(
        &mut self,
        show: bool,
        project: impl Fn([f64; 2]) -> Vec2,
    ) {
        self.candidates.clear();

        if !show {
            return;
        }

        for slot in self.pool.assigned_slots() {
            if let Some(node) = self.pool.node_mut(slot) {
                node.position = project(node.nominal);
                node.visible = node.is_finite();
                if node.visible {
                    self.candidates.push(slot);
                }
            }
        }

        self.hide_overlaps();
    }

    /// Hides every candidate whose box intersects the box of a visible,
    /// more important candidate. Running it again on the same candidates
    /// changes nothing.
    ///
    /// Candidates are visited once, most important first, and only boxes
    /// still visible block later ones: if A covers B and B covers C but A
    /// and C are apart, A and C stay visible.
    pub fn hide_overlaps(&mut self) {
        let mut order = self
            .candidates
            .iter()
            .filter_map(|&slot| {
                let node = self.pool.node(slot)?;
                Some((slot, node.priority.clone()))
            })
            .collect::<Vec<_>>();

        // most important first; labels without a priority go last
        order.sort_by(|(_, a), (_, b)| b.cmp(a));

        let mut placed: RTree<LabelBox> = RTree::new();

        for (slot, _) in order {
            let Some(node) = self.pool.node_mut(slot) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if !node.is_finite() {
                node.visible = false;
                continue;
            }

            let (p0, p1) = node.bounds();
            let aabb = AABB::from_corners([p0.x, p0.y], [p1.x, p1.y]);

            let covered = placed
                .locate_in_envelope_intersecting(&aabb)
                .next()
                .is_some();

            if covered {
                node.visible = false;
            } else {
                let rect = Rectangle::from_corners([p0.x, p0.y], [p1.x, p1.y]);
                placed.insert(rstar::primitives::GeomWithData::new(rect, slot));
            }
        }
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        self.candidates.clear();
    }
}
