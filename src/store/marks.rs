// マーク・投票・最終選択のインメモリストア

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::MarkupError;
use crate::model::coords::PercentPoint;
use crate::model::mark::{
    CollectionId, Mark, MarkDraft, MarkId, MarkShape, MarkWithVotes, Selection, SelectionId, Vote,
};
use crate::model::stroke::OwnerId;

/// 消しゴムによるマーク当たり判定の既定許容値（パーセント単位）
pub const DEFAULT_HIT_TOLERANCE: f64 = 5.0;

/// マーク、投票、最終選択を保持するストア。
///
/// 投票と選択はマークIDを参照する別レコードとして保持する。
/// マーク削除時は参照している投票・選択もカスケード削除する。
#[derive(Debug, Clone, Default)]
pub struct MarkStore {
    marks: BTreeMap<MarkId, Mark>,
    votes: Vec<Vote>,
    selections: Vec<Selection>,
    next_mark_id: u64,
    next_selection_id: u64,
}

impl MarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のレコード群からストアを構築する（外部ストアからの読込用）。
    ///
    /// 存在しないマークを参照する投票・選択はエラーとする。
    pub fn from_records(
        marks: Vec<Mark>,
        votes: Vec<Vote>,
        selections: Vec<Selection>,
    ) -> crate::error::Result<Self> {
        let mut store = Self::new();
        for mark in marks {
            if store.marks.contains_key(&mark.id) {
                return Err(MarkupError::store(format!("duplicate mark id {}", mark.id)));
            }
            store.next_mark_id = store.next_mark_id.max(mark.id.0 + 1);
            store.marks.insert(mark.id, mark);
        }
        for vote in votes {
            store.add_vote(vote.mark, &vote.voter)?;
        }
        for sel in selections {
            let mark = store.get_mark(sel.mark)?;
            if mark.collection != sel.collection {
                return Err(MarkupError::store(format!(
                    "selection {} references mark {} from another collection",
                    sel.id.0, sel.mark
                )));
            }
            store.next_selection_id = store.next_selection_id.max(sel.id.0 + 1);
            store.selections.push(sel);
        }
        Ok(store)
    }

    /// マークを追加し、採番したIDを返す。
    pub fn add_mark(&mut self, collection: &CollectionId, draft: MarkDraft) -> MarkId {
        let id = MarkId(self.next_mark_id);
        self.next_mark_id += 1;
        self.marks.insert(
            id,
            Mark {
                id,
                collection: collection.clone(),
                owner: draft.owner,
                shape: draft.shape,
                color: draft.color,
                notes: draft.notes,
            },
        );
        id
    }

    pub fn get_mark(&self, id: MarkId) -> crate::error::Result<&Mark> {
        self.marks
            .get(&id)
            .ok_or_else(|| MarkupError::store(format!("mark {id} not found")))
    }

    /// マークを削除し、参照する投票・選択もカスケード削除する。
    pub fn delete_mark(&mut self, id: MarkId) -> crate::error::Result<Mark> {
        let mark = self
            .marks
            .remove(&id)
            .ok_or_else(|| MarkupError::store(format!("mark {id} not found")))?;
        let votes_before = self.votes.len();
        let selections_before = self.selections.len();
        self.votes.retain(|v| v.mark != id);
        self.selections.retain(|s| s.mark != id);
        debug!(
            mark = %id,
            votes_removed = votes_before - self.votes.len(),
            selections_removed = selections_before - self.selections.len(),
            "deleted mark"
        );
        Ok(mark)
    }

    /// 投票を追加する。同一投票者の重複投票は無視して `false` を返す。
    pub fn add_vote(&mut self, mark: MarkId, voter: &OwnerId) -> crate::error::Result<bool> {
        self.get_mark(mark)?;
        if self.votes.iter().any(|v| v.mark == mark && &v.voter == voter) {
            return Ok(false);
        }
        self.votes.push(Vote {
            mark,
            voter: voter.clone(),
        });
        Ok(true)
    }

    /// 投票を取り消す。該当する投票があれば `true`。
    pub fn remove_vote(&mut self, mark: MarkId, voter: &OwnerId) -> bool {
        let before = self.votes.len();
        self.votes.retain(|v| !(v.mark == mark && &v.voter == voter));
        self.votes.len() != before
    }

    /// マークを最終選択に追加する。既に選択済みなら既存のIDを返す。
    pub fn add_selection(
        &mut self,
        mark: MarkId,
        selected_by: &OwnerId,
    ) -> crate::error::Result<SelectionId> {
        let collection = self.get_mark(mark)?.collection.clone();
        if let Some(existing) = self.selections.iter().find(|s| s.mark == mark) {
            return Ok(existing.id);
        }
        let id = SelectionId(self.next_selection_id);
        self.next_selection_id += 1;
        self.selections.push(Selection {
            id,
            mark,
            collection,
            selected_by: selected_by.clone(),
        });
        Ok(id)
    }

    pub fn remove_selection(&mut self, id: SelectionId) -> bool {
        let before = self.selections.len();
        self.selections.retain(|s| s.id != id);
        self.selections.len() != before
    }

    /// コレクションのマークを、投票数・投票者・閲覧者の投票有無付きで返す（ID順）。
    pub fn markings_with_votes(
        &self,
        collection: &CollectionId,
        viewer: &OwnerId,
    ) -> Vec<MarkWithVotes> {
        self.marks_in(collection)
            .map(|mark| {
                let voters: Vec<OwnerId> = self
                    .votes
                    .iter()
                    .filter(|v| v.mark == mark.id)
                    .map(|v| v.voter.clone())
                    .collect();
                MarkWithVotes {
                    mark: mark.clone(),
                    vote_count: voters.len(),
                    has_viewer_voted: voters.contains(viewer),
                    voters,
                }
            })
            .collect()
    }

    pub fn marks_in<'a>(&'a self, collection: &'a CollectionId) -> impl Iterator<Item = &'a Mark> {
        self.marks.values().filter(move |m| &m.collection == collection)
    }

    pub fn selections_in<'a>(
        &'a self,
        collection: &'a CollectionId,
    ) -> impl Iterator<Item = &'a Selection> {
        self.selections
            .iter()
            .filter(move |s| &s.collection == collection)
    }

    /// 最終選択されたマークを選択順に返す。
    pub fn selected_marks(&self, collection: &CollectionId) -> Vec<&Mark> {
        self.selections_in(collection)
            .filter_map(|s| self.marks.get(&s.mark))
            .collect()
    }

    /// `owner` 自身のマークのうち、`at` から許容範囲内にある最初のマークを返す。
    ///
    /// パスは全ての点、その他はアンカー点で判定する。
    pub fn hit_test(
        &self,
        collection: &CollectionId,
        owner: &OwnerId,
        at: PercentPoint,
        tolerance: f64,
    ) -> Option<MarkId> {
        let near = |p: &PercentPoint| (p.x - at.x).abs() < tolerance && (p.y - at.y).abs() < tolerance;
        self.marks_in(collection)
            .filter(|m| &m.owner == owner)
            .find(|m| match &m.shape {
                MarkShape::Path { points } => points.iter().any(near),
                other => other.anchor().as_ref().is_some_and(near),
            })
            .map(|m| m.id)
    }

    /// 消しゴム操作: 当たったマークを削除する。
    pub fn erase_at(
        &mut self,
        collection: &CollectionId,
        owner: &OwnerId,
        at: PercentPoint,
    ) -> crate::error::Result<Option<Mark>> {
        match self.hit_test(collection, owner, at, DEFAULT_HIT_TOLERANCE) {
            Some(id) => self.delete_mark(id).map(Some),
            None => Ok(None),
        }
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    pub fn selection_count(&self) -> usize {
        self.selections.len()
    }
}
