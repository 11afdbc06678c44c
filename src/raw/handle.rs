use core::num::NonZero;

/// A stable index into an [`Arena`](super::arena::Arena).
///
/// Stored as `NonZero<u32>` (index plus one) so that `Option<Handle>` costs
/// no extra space; leaf chain links and the root slot are all `Option`s.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<u32>);

impl Handle {
    /// Largest representable index.
    pub(crate) const MAX: usize = (u32::MAX - 1) as usize;

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((index as u32) + 1) {
            Some(raw) => Self(raw),
            // index + 1 >= 1, so this arm is unreachable.
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}
