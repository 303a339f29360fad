use crate::cookies::{ChangeSet, CookieItem, CookieMapping, DeletedCookie};

/// Computes what changed between two snapshots of a cookie mapping.
///
/// Deletions and value changes follow the order of `previous`, additions follow the
/// order of `next`. A name whose value did not change is not reported.
pub fn diff(previous: &CookieMapping, next: &CookieMapping) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (name, value) in previous.iter() {
        match next.get(name) {
            None => changes.deleted.push(DeletedCookie::new(name)),
            Some(new_value) if new_value != value => {
                changes.changed.push(CookieItem::new(name, new_value))
            }
            Some(_) => {}
        }
    }

    for (name, value) in next.iter() {
        if !previous.contains(name) {
            changes.changed.push(CookieItem::new(name, value));
        }
    }

    changes
}
