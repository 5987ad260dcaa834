//! Member identity and the capability interface the manager indexes
//!
//! The tree never holds member objects, only their [`MemberId`] and the bound
//! that was current when they were inserted. Hosts usually keep members in a
//! `SlotMap<MemberId, _>` and hand the manager borrowed views.

use super::bounds::BoundingBox;

slotmap::new_key_type! {
    /// Stable identity of an indexed member
    pub struct MemberId;
}

/// Something with a queryable axis-aligned bound that reports bound changes
pub trait GeometryMember {
    /// Identity used as the key in the tree and the subscription table
    fn id(&self) -> MemberId;

    /// Current bound. [`BoundingBox::empty`] means "not measured yet".
    fn bounds(&self) -> BoundingBox;

    /// False once the member has been detached from its scene. Notifications
    /// from detached members are ignored.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Anything a host may hand the manager
///
/// Only elements that expose a [`GeometryMember`] are indexed; everything else
/// is rejected at the manager boundary.
pub trait SceneElement {
    /// The indexable view of this element, if it has one
    fn as_geometry(&self) -> Option<&dyn GeometryMember>;
}

impl<T: SceneElement + ?Sized> SceneElement for &T {
    fn as_geometry(&self) -> Option<&dyn GeometryMember> {
        (**self).as_geometry()
    }
}

impl<T: SceneElement + ?Sized> SceneElement for Box<T> {
    fn as_geometry(&self) -> Option<&dyn GeometryMember> {
        (**self).as_geometry()
    }
}
