// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use super::points_to::PointsToSet;
use super::bit_vec::Idx;

/// Diff points-to data.
/// This is an optimisation on top of the base points-to data structure.
/// The points-to information is propagated incrementally only for the different parts.
pub struct DiffPTData<K, D, DS> {
    /// Diff points-to to be propagated.
    pub(crate) diff_pts_map: HashMap<K, DS>,
    /// Points-to already propagated.
    pub(crate) propa_pts_map: HashMap<K, DS>,

    marker: PhantomData<D>,
}

impl<K, D, DS> fmt::Debug for DiffPTData<K, D, DS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "DiffPTData".fmt(f)
    }
}

impl<K, D, DS> DiffPTData<K, D, DS>
where
    K: Hash + Eq + Copy,
    D: Idx,
    DS: PointsToSet<D> + Clone + fmt::Debug,
    for<'a> &'a DS: IntoIterator<Item = D>,
{
    pub fn new() -> DiffPTData<K, D, DS> {
        DiffPTData {
            diff_pts_map: HashMap::new(),
            propa_pts_map: HashMap::new(),
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.diff_pts_map.clear();
        self.propa_pts_map.clear();
    }

    /// Adds element to the points-to set associated with var.
    /// Returns false if elem is already in this set
    #[inline]
    pub fn add_pts(&mut self, var: K, elem: D) -> bool {
        if let Some(propa) = self.propa_pts_map.get(&var) {
            if propa.contains(elem) {
                return false;
            }
        }
        let diff = self.diff_pts_map.entry(var).or_insert(DS::new());
        diff.insert(elem)
    }

    /// diff_pts(dst_var) = diff_pts(dst_var) U (diff_pts(src_var) - propa_pts(dst_var)).
    pub fn union_diff_pts(&mut self, dst_var: K, src_var: K) -> bool {
        if dst_var == src_var {
            return false;
        }
        let mut changed = false;
        if let Some(diff) = self.diff_pts_map.get(&src_var) {
            let src_ds = diff.clone();
            changed |= self.union_pts_to(dst_var, &src_ds);
        }
        changed
    }

    /// diff_pts(dst_var) = diff_pts(dst_var) U (pts(src_var) - propa_pts(dst_var)).
    #[inline]
    pub fn union_pts(&mut self, dst_var: K, src_var: K) -> bool {
        if dst_var == src_var {
            return false;
        }
        let mut changed = false;
        if let Some(diff) = self.diff_pts_map.get(&src_var) {
            let src_ds = diff.clone();
            changed |= self.union_pts_to(dst_var, &src_ds);
        }
        if let Some(propa) = self.propa_pts_map.get(&src_var) {
            let src_ds = propa.clone();
            changed |= self.union_pts_to(dst_var, &src_ds);
        }
        changed
    }

    /// Performs diff_pts(dst_var) = diff_pts(dst_var) U (src_ds - propa_pts(dst_var)).
    #[inline]
    pub fn union_pts_to(&mut self, dst_var: K, src_ds: &DS) -> bool {
        let diff = self.diff_pts_map.entry(dst_var).or_insert(DS::new());
        let propa = self.propa_pts_map.entry(dst_var).or_insert(DS::new());
        let mut new = src_ds.clone();
        new.subtract(propa);
        diff.union(&new)
    }

    /// Removes element from the points-to set of var.
    #[inline]
    pub fn remove_pts_elem(&mut self, var: K, elem: D) -> bool {
        let diff = self.diff_pts_map.entry(var).or_insert(DS::new());
        let propa = self.propa_pts_map.entry(var).or_insert(DS::new());
        diff.remove(elem) | propa.remove(elem)
    }

    /// Get diff points to.
    #[inline]
    pub fn get_diff_pts(&self, var: K) -> Option<&DS> {
        self.diff_pts_map.get(&var)
    }

    /// Returns a mutable reference to the diff points to set.
    #[inline]
    pub fn get_mut_diff_pts(&mut self, var: K) -> Option<&mut DS> {
        self.diff_pts_map.get_mut(&var)
    }

    /// Get propagated points to.
    #[inline]
    pub fn get_propa_pts(&self, var: K) -> Option<&DS> {
        self.propa_pts_map.get(&var)
    }

    /// Returns a mutable reference to the propa points to set.
    #[inline]
    pub fn get_mut_propa_pts(&mut self, var: K) -> Option<&mut DS> {
        self.propa_pts_map.get_mut(&var)
    }

    /// Sets all diff elems to propa elems.
    pub fn flush(&mut self, var: K) {
        if !self.diff_pts_map.contains_key(&var) {
            return;
        }

        let diff = self.diff_pts_map.get_mut(&var).unwrap();
        let propa = self.propa_pts_map.entry(var).or_insert(DS::new());
        propa.union(diff);
        diff.clear();
    }

    /// Fully clears the points-to set of var.
    #[inline]
    pub fn clear_pts(&mut self, var: K) {
        if let Some(diff) = self.diff_pts_map.get_mut(&var) {
            diff.clear();
        }
        if let Some(propa) = self.propa_pts_map.get_mut(&var) {
            propa.clear();
        }
    }

    /// Clear propagated points-to set of var.
    pub fn clear_diff_pts(&mut self, var: K) {
        if let Some(diff) = self.diff_pts_map.get_mut(&var) {
            diff.clear()
        }
    }

    /// Clear propagated points-to set of var.
    pub fn clear_propa_pts(&mut self, var: K) {
        if let Some(propa) = self.propa_pts_map.get_mut(&var) {
            propa.clear()
        }
    }

    /// Dump stored keys and points-to sets.
    #[inline]
    pub fn dump_pt_data(&self) {
        unimplemented!("implement if/when necessary");
    }
}
