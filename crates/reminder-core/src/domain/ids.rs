//! Entry identifiers.
//!
//! # ULID ベースの ID
//! 登録順（時刻順）でソートでき、ログ上で登録と配送を突き合わせるために使う。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a registered reminder.
///
/// Assigned by the [`ScheduleHandle`](crate::queue::ScheduleHandle) at
/// registration time; it never takes part in queue ordering.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(Ulid);

impl EntryId {
    /// ULID から EntryId を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for EntryId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}
