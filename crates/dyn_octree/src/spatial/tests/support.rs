//! Test scene: members in a slot map, handed to the manager as borrowed views

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;

use crate::foundation::math::Vec3;
use crate::spatial::{BoundingBox, GeometryMember, MemberId, SceneElement};

/// A member with a settable bound
#[derive(Debug, Clone)]
pub struct Probe {
    pub id: MemberId,
    pub bound: BoundingBox,
    pub attached: bool,
}

impl GeometryMember for Probe {
    fn id(&self) -> MemberId {
        self.id
    }

    fn bounds(&self) -> BoundingBox {
        self.bound
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}

impl SceneElement for Probe {
    fn as_geometry(&self) -> Option<&dyn GeometryMember> {
        Some(self)
    }
}

/// Element list as a host would hand it over: geometry mixed with other kinds
#[derive(Debug, Clone)]
pub enum TestElement {
    Geometry(Probe),
    Light,
}

impl SceneElement for TestElement {
    fn as_geometry(&self) -> Option<&dyn GeometryMember> {
        match self {
            TestElement::Geometry(probe) => Some(probe),
            TestElement::Light => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    members: SlotMap<MemberId, Probe>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene of `count` boxes with edges in `[0.5, max_edge)` inside `[0, extent]^3`
    pub fn random(seed: u64, count: usize, extent: f32, max_edge: f32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scene = Self::new();
        for _ in 0..count {
            scene.add(random_box(&mut rng, extent, max_edge));
        }
        scene
    }

    pub fn add(&mut self, bound: BoundingBox) -> MemberId {
        self.members.insert_with_key(|id| Probe { id, bound, attached: true })
    }

    /// Unit cube with its min corner at `(x, y, z)`
    pub fn add_unit(&mut self, x: f32, y: f32, z: f32) -> MemberId {
        self.add(unit_at(x, y, z))
    }

    pub fn bound(&self, id: MemberId) -> BoundingBox {
        self.members[id].bound
    }

    pub fn set_bound(&mut self, id: MemberId, bound: BoundingBox) {
        self.members[id].bound = bound;
    }

    pub fn detach(&mut self, id: MemberId) {
        self.members[id].attached = false;
    }

    pub fn remove(&mut self, id: MemberId) -> Option<Probe> {
        self.members.remove(id)
    }

    pub fn member(&self, id: MemberId) -> &dyn GeometryMember {
        &self.members[id]
    }

    pub fn element(&self, id: MemberId) -> &Probe {
        &self.members[id]
    }

    pub fn get(&self, id: MemberId) -> Option<&dyn GeometryMember> {
        self.members.get(id).map(|probe| probe as &dyn GeometryMember)
    }

    pub fn ids(&self) -> Vec<MemberId> {
        self.members.keys().collect()
    }

    pub fn probes(&self) -> impl Iterator<Item = &Probe> {
        self.members.values()
    }

    pub fn elements(&self) -> Vec<TestElement> {
        self.members.values().cloned().map(TestElement::Geometry).collect()
    }
}

pub fn unit_at(x: f32, y: f32, z: f32) -> BoundingBox {
    BoundingBox::new(Vec3::new(x, y, z), Vec3::new(x + 1.0, y + 1.0, z + 1.0))
}

pub fn random_box(rng: &mut StdRng, extent: f32, max_edge: f32) -> BoundingBox {
    let size = Vec3::new(
        rng.gen_range(0.5..max_edge),
        rng.gen_range(0.5..max_edge),
        rng.gen_range(0.5..max_edge),
    );
    let min = Vec3::new(
        rng.gen_range(0.0..extent - size.x),
        rng.gen_range(0.0..extent - size.y),
        rng.gen_range(0.0..extent - size.z),
    );
    BoundingBox::new(min, min + size)
}

/// Sorted copy, for comparing query results that come back in tree order
pub fn sorted(mut ids: Vec<MemberId>) -> Vec<MemberId> {
    ids.sort();
    ids
}
