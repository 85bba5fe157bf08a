// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Hand-rolled replacement for `rustc_index::newtype_index!`.
//!
//! The teacher leans on `rustc_index` for its dense, `Idx`-bounded id types;
//! that crate is only reachable under `rustc_private` and cannot be a
//! dependency here. `define_index!` gives the same shape — a `Copy` newtype
//! over `u32` implementing `pts_set::bit_vec::Idx` — without it.

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub fn from_usize(v: usize) -> Self {
                $name(v as u32)
            }

            #[inline]
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl crate::pts_set::bit_vec::Idx for $name {
            #[inline]
            fn new(idx: usize) -> Self {
                $name::from_usize(idx)
            }

            #[inline]
            fn index(self) -> usize {
                self.as_usize()
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "{}"), self.0)
            }
        }
    };
}

pub(crate) use define_index;
