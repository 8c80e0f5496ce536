//! Validity Tags
//!
//! A tag answers one question for a cached value: "has anything I was
//! derived from changed since revision N?". Every tag exposes its current
//! revision through [`Tag::value`] and checks a recorded snapshot with
//! [`Tag::validate`].
//!
//! # Kinds
//!
//! - **Constant**: never changes, every snapshot is valid.
//! - **Volatile**: never valid, the value must always be recomputed.
//! - **Current**: follows the global [`Clock`], invalidated by any mutation
//!   anywhere.
//! - **Dirtyable**: owned by one mutable source. [`Tag::dirty`] advances it
//!   together with the clock.
//! - **Updatable**: a dirtyable tag that also wraps an inner tag which can be
//!   repointed after construction with [`Tag::update`].
//! - **Combined**: valid only while all of its inputs are valid.
//!
//! # Pull-based combination
//!
//! Nothing is ever notified. A combined tag simply asks each input again on
//! every query, so dirtying a source costs O(1) and checking a combined tag
//! costs O(inputs).

mod clock;

pub use clock::{Clock, Revision, CONSTANT_REVISION};

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

/// A validity token with a monotonic revision.
///
/// Tags are cheap handles: cloning shares the underlying state, so the same
/// tag can feed any number of dependents.
#[derive(Clone)]
pub struct Tag {
    kind: TagKind,
}

#[derive(Clone)]
enum TagKind {
    Constant,
    Volatile,
    Current(Clock),
    Dirtyable(Arc<DirtyableState>),
    Updatable(Arc<UpdatableState>),
    Combined(Arc<SmallVec<[Tag; 4]>>),
}

struct DirtyableState {
    clock: Clock,
    revision: AtomicU64,
}

impl DirtyableState {
    fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            revision: AtomicU64::new(clock.now()),
        }
    }

    fn revision(&self) -> Revision {
        self.revision.load(Ordering::SeqCst)
    }

    fn dirty(&self) -> Revision {
        let revision = self.clock.bump();
        self.revision.store(revision, Ordering::SeqCst);
        revision
    }
}

struct UpdatableState {
    /// Own revision, stamped on `dirty` and whenever the inner tag is swapped.
    own: DirtyableState,
    inner: RwLock<Tag>,
}

impl Tag {
    /// A tag that never changes.
    pub fn constant() -> Self {
        Self {
            kind: TagKind::Constant,
        }
    }

    /// A tag that is never valid.
    pub fn volatile() -> Self {
        Self {
            kind: TagKind::Volatile,
        }
    }

    /// A tag that tracks the global clock.
    pub fn current(clock: &Clock) -> Self {
        Self {
            kind: TagKind::Current(clock.clone()),
        }
    }

    /// A new dirtyable tag at the clock's current revision.
    pub fn dirtyable(clock: &Clock) -> Self {
        Self {
            kind: TagKind::Dirtyable(Arc::new(DirtyableState::new(clock))),
        }
    }

    /// A new updatable tag wrapping `inner`.
    pub fn updatable(clock: &Clock, inner: Tag) -> Self {
        Self {
            kind: TagKind::Updatable(Arc::new(UpdatableState {
                own: DirtyableState::new(clock),
                inner: RwLock::new(inner),
            })),
        }
    }

    /// The current revision of this tag.
    pub fn value(&self) -> Revision {
        match &self.kind {
            TagKind::Constant => CONSTANT_REVISION,
            TagKind::Volatile => Revision::MAX,
            TagKind::Current(clock) => clock.now(),
            TagKind::Dirtyable(state) => state.revision(),
            TagKind::Updatable(state) => state.own.revision().max(state.inner.read().value()),
            TagKind::Combined(tags) => tags
                .iter()
                .map(Tag::value)
                .max()
                .unwrap_or(CONSTANT_REVISION),
        }
    }

    /// Whether nothing contributing to this tag advanced past `snapshot`.
    pub fn validate(&self, snapshot: Revision) -> bool {
        match &self.kind {
            TagKind::Constant => true,
            TagKind::Volatile => false,
            TagKind::Current(clock) => snapshot >= clock.now(),
            TagKind::Dirtyable(state) => snapshot >= state.revision(),
            TagKind::Updatable(state) => {
                snapshot >= state.own.revision() && state.inner.read().validate(snapshot)
            }
            TagKind::Combined(tags) => tags.iter().all(|tag| tag.validate(snapshot)),
        }
    }

    /// Advance this tag and the global clock.
    ///
    /// Only dirtyable and updatable tags own a revision; for every other kind
    /// this does nothing and returns `None`.
    pub fn dirty(&self) -> Option<Revision> {
        let revision = match &self.kind {
            TagKind::Dirtyable(state) => state.dirty(),
            TagKind::Updatable(state) => state.own.dirty(),
            _ => return None,
        };
        tracing::trace!(revision, "tag dirtied");
        Some(revision)
    }

    /// Repoint an updatable tag at a different inner tag.
    ///
    /// Returns `true` if the inner tag was actually swapped. Updating to the
    /// tag already being tracked is a no-op, as is updating any tag that is
    /// not updatable.
    pub fn update(&self, tag: Tag) -> bool {
        let TagKind::Updatable(state) = &self.kind else {
            return false;
        };

        let mut inner = state.inner.write();
        if inner.same(&tag) {
            return false;
        }
        *inner = tag;
        let stamp = state.own.clock.now();
        state.own.revision.fetch_max(stamp, Ordering::SeqCst);
        tracing::trace!(revision = stamp, "updatable tag repointed");
        true
    }

    /// Identity comparison: whether both handles denote the same tag.
    pub fn same(&self, other: &Tag) -> bool {
        match (&self.kind, &other.kind) {
            (TagKind::Constant, TagKind::Constant) => true,
            (TagKind::Volatile, TagKind::Volatile) => true,
            (TagKind::Current(a), TagKind::Current(b)) => a.same(b),
            (TagKind::Dirtyable(a), TagKind::Dirtyable(b)) => Arc::ptr_eq(a, b),
            (TagKind::Updatable(a), TagKind::Updatable(b)) => Arc::ptr_eq(a, b),
            (TagKind::Combined(a), TagKind::Combined(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether this is the constant tag.
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, TagKind::Constant)
    }

    /// Whether this is the volatile tag.
    pub fn is_volatile(&self) -> bool {
        matches!(self.kind, TagKind::Volatile)
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            TagKind::Constant => "Constant",
            TagKind::Volatile => "Volatile",
            TagKind::Current(_) => "Current",
            TagKind::Dirtyable(_) => "Dirtyable",
            TagKind::Updatable(_) => "Updatable",
            TagKind::Combined(_) => "Combined",
        };
        f.debug_struct("Tag")
            .field("kind", &kind)
            .field("value", &self.value())
            .finish()
    }
}

/// Anything that carries a tag.
pub trait Tagged {
    /// The tag describing when this item may be stale.
    fn tag(&self) -> Tag;
}

impl Tagged for Tag {
    fn tag(&self) -> Tag {
        self.clone()
    }
}

impl<T: Tagged + ?Sized> Tagged for Arc<T> {
    fn tag(&self) -> Tag {
        (**self).tag()
    }
}

/// Combine several tags into one that is valid only while all are valid.
///
/// Constant inputs are dropped and any volatile input makes the result
/// volatile. A single remaining input is returned unchanged.
pub fn combine<I>(tags: I) -> Tag
where
    I: IntoIterator<Item = Tag>,
{
    let mut inputs: SmallVec<[Tag; 4]> = SmallVec::new();

    for tag in tags {
        match &tag.kind {
            TagKind::Constant => {}
            TagKind::Volatile => return Tag::volatile(),
            _ => inputs.push(tag),
        }
    }

    match inputs.len() {
        0 => Tag::constant(),
        1 => inputs.swap_remove(0),
        _ => Tag {
            kind: TagKind::Combined(Arc::new(inputs)),
        },
    }
}

/// Combine the tags of several tagged items.
pub fn combine_tagged<'a, T, I>(items: I) -> Tag
where
    T: Tagged + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    combine(items.into_iter().map(Tagged::tag))
}
