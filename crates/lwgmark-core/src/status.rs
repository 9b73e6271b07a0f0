use crate::collab::StatusClassifier;

const ACTIVE_LIST: &str = "lwg-active.html";
const DEFECTS_LIST: &str = "lwg-defects.html";
const CLOSED_LIST: &str = "lwg-closed.html";

const OTHER_GROUPS: &[&str] = &["Core", "EWG", "LEWG"];

const OPEN_STATUSES: &[&str] = &[
    "New",
    "Open",
    "Review",
    "Ready",
    "Deferred",
    "Voting",
    "Immediate",
];

const DEFECT_STATUSES: &[&str] = &["DR", "TC1", "CD1", "TRDec", "WP", "Resolved"];

/// The status vocabulary of the LWG issue lists.
#[derive(Clone, Copy, Debug, Default)]
pub struct LwgStatuses;

impl LwgStatuses {
    fn is_defect(stat: &str) -> bool {
        let stat = stat.strip_prefix("Pending ").unwrap_or(stat);
        DEFECT_STATUSES.contains(&stat) || is_published_standard(stat)
    }
}

/// `C++11`, `C++23` and so on.
fn is_published_standard(stat: &str) -> bool {
    stat.strip_prefix("C++")
        .is_some_and(|year| year.len() == 2 && year.bytes().all(|b| b.is_ascii_digit()))
}

impl StatusClassifier for LwgStatuses {
    fn is_active(&self, stat: &str) -> bool {
        self.is_assigned_elsewhere(stat)
            || stat.starts_with("Tentatively ")
            || OPEN_STATUSES.contains(&stat)
    }

    fn is_votable(&self, stat: &str) -> bool {
        matches!(stat, "Voting" | "Immediate")
    }

    fn is_ready(&self, stat: &str) -> bool {
        matches!(stat, "Ready" | "Tentatively Ready")
    }

    fn is_assigned_elsewhere(&self, stat: &str) -> bool {
        OTHER_GROUPS.contains(&stat)
            || stat
                .strip_prefix("SG")
                .is_some_and(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()))
    }

    fn list_file(&self, stat: &str) -> &str {
        if self.is_active(stat) {
            ACTIVE_LIST
        } else if Self::is_defect(stat) {
            DEFECTS_LIST
        } else {
            CLOSED_LIST
        }
    }
}
